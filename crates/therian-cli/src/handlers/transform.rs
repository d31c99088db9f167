//! Commands that evaluate operations against a JSON value

use super::utils::{parse_type, parse_value, value_position};
use crate::cli::{ConvertArgs, ImmutableArgs, SizeArgs};
use crate::error::Result;
use crate::output::{HumanReadable, OutputWriter};
use colored::Colorize;
use serde::Serialize;
use therian_core::operation::{Convert, ImmutableCheck, Size};
use therian_core::{Engine, Operation, Positions};
use tracing::info;

fn via(operator: &Option<String>) -> String {
    operator
        .as_ref()
        .map(|name| format!(" (via {})", name))
        .unwrap_or_default()
}

#[derive(Debug, Serialize)]
pub struct ConvertReport {
    pub source_type: String,
    pub target_type: String,
    pub result: serde_json::Value,
    pub operator: Option<String>,
}

impl HumanReadable for ConvertReport {
    fn render_human(&self, use_color: bool) -> String {
        let result = self.result.to_string();
        let result = if use_color {
            result.green().to_string()
        } else {
            result
        };
        format!(
            "{} -> {}: {}{}",
            self.source_type,
            self.target_type,
            result,
            via(&self.operator)
        )
    }
}

/// Handle the convert command
pub fn handle_convert(args: ConvertArgs, engine: &Engine, output: &mut OutputWriter) -> Result<()> {
    let source = value_position(parse_value(&args.value)?, args.from.as_deref())?;
    let target_type = parse_type(&args.to)?;

    let mut convert = Convert::new(source.clone(), Positions::read_write(target_type.clone()));
    let result = engine.context().eval(&mut convert)?;
    info!(operator = ?convert.operator(), "Converted {} to {}", source.value_type(), target_type);

    output.report(&ConvertReport {
        source_type: source.value_type().to_string(),
        target_type: target_type.to_string(),
        result: result.to_json(),
        operator: convert.operator().map(str::to_string),
    })
}

#[derive(Debug, Serialize)]
pub struct SizeReport {
    #[serde(rename = "type")]
    pub ty: String,
    pub size: usize,
    pub operator: Option<String>,
}

impl HumanReadable for SizeReport {
    fn render_human(&self, _use_color: bool) -> String {
        format!("{} has size {}{}", self.ty, self.size, via(&self.operator))
    }
}

/// Handle the size command
pub fn handle_size(args: SizeArgs, engine: &Engine, output: &mut OutputWriter) -> Result<()> {
    let position = value_position(parse_value(&args.value)?, args.ty.as_deref())?;
    let mut size = Size::new(position.clone());
    let result = engine.context().eval(&mut size)?;

    output.report(&SizeReport {
        ty: position.value_type().to_string(),
        size: result,
        operator: size.operator().map(str::to_string),
    })
}

#[derive(Debug, Serialize)]
pub struct ImmutableReport {
    #[serde(rename = "type")]
    pub ty: String,
    pub immutable: bool,
    pub operator: Option<String>,
}

impl HumanReadable for ImmutableReport {
    fn render_human(&self, _use_color: bool) -> String {
        let verdict = if self.immutable { "immutable" } else { "mutable" };
        format!("{} value is {}{}", self.ty, verdict, via(&self.operator))
    }
}

/// Handle the immutable command
pub fn handle_immutable(args: ImmutableArgs, engine: &Engine, output: &mut OutputWriter) -> Result<()> {
    let position = value_position(parse_value(&args.value)?, args.ty.as_deref())?;
    let mut check = ImmutableCheck::new(position.clone());
    let immutable = engine.context().eval(&mut check)?;

    output.report(&ImmutableReport {
        ty: position.value_type().to_string(),
        immutable,
        operator: check.operator().map(str::to_string),
    })
}
