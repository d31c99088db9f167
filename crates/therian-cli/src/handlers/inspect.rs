//! Registry and type inspection commands

use super::utils::parse_type;
use crate::cli::{ElementTypeArgs, OperatorsArgs};
use crate::error::Result;
use crate::output::{HumanReadable, OutputWriter};
use colored::Colorize;
use serde::Serialize;
use therian_core::operation::GetElementType;
use therian_core::{Engine, OperationKind, Phase};

/// One registered operator, in dispatch order
#[derive(Debug, Serialize)]
pub struct OperatorEntry {
    pub order: usize,
    pub name: String,
    pub kind: String,
    pub signature: String,
    pub reusable_support_check: bool,
    pub reusable_evaluation: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct OperatorsReport {
    pub operators: Vec<OperatorEntry>,
}

impl HumanReadable for OperatorsReport {
    fn render_human(&self, use_color: bool) -> String {
        if self.operators.is_empty() {
            return "No operators registered".to_string();
        }
        let name_width = self.operators.iter().map(|o| o.name.len()).max().unwrap_or(0);
        let kind_width = self.operators.iter().map(|o| o.kind.len()).max().unwrap_or(0);

        let mut lines = Vec::with_capacity(self.operators.len());
        for operator in &self.operators {
            let name = format!("{:<width$}", operator.name, width = name_width);
            let name = if use_color {
                name.bold().to_string()
            } else {
                name
            };
            let mut line = format!(
                "{:>3}. {}  {:<kind_width$}  {}",
                operator.order,
                name,
                operator.kind,
                operator.signature,
                kind_width = kind_width
            );
            match (operator.reusable_support_check, operator.reusable_evaluation) {
                (true, true) => {}
                (true, false) => line.push_str("  [evaluation not reusable]"),
                (false, _) => line.push_str("  [not reusable]"),
            }
            if !operator.depends_on.is_empty() {
                line.push_str(&format!("  depends on {}", operator.depends_on.join(", ")));
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}

/// Handle the operators command
pub fn handle_operators(args: OperatorsArgs, engine: &Engine, output: &mut OutputWriter) -> Result<()> {
    let kind = args.kind.map(OperationKind::from);
    let operators = engine
        .registry()
        .operators()
        .iter()
        .enumerate()
        .filter(|(_, operator)| kind.map_or(true, |kind| operator.kind() == kind))
        .map(|(index, operator)| OperatorEntry {
            order: index + 1,
            name: operator.name().to_string(),
            kind: operator.kind().to_string(),
            signature: operator.signature().to_string(),
            reusable_support_check: operator.reusability().is_reusable(Phase::SupportCheck),
            reusable_evaluation: operator.reusability().is_reusable(Phase::Evaluation),
            depends_on: operator.depends_on().to_vec(),
        })
        .collect();

    output.report(&OperatorsReport { operators })
}

#[derive(Debug, Serialize)]
pub struct ElementTypeReport {
    #[serde(rename = "type")]
    pub ty: String,
    pub element_type: Option<String>,
    pub operator: Option<String>,
}

impl HumanReadable for ElementTypeReport {
    fn render_human(&self, use_color: bool) -> String {
        match &self.element_type {
            Some(element) => {
                let element = if use_color {
                    element.green().to_string()
                } else {
                    element.clone()
                };
                format!("{} -> {}", self.ty, element)
            }
            None => format!("{} has no element type", self.ty),
        }
    }
}

/// Handle the element-type command
pub fn handle_element_type(args: ElementTypeArgs, engine: &Engine, output: &mut OutputWriter) -> Result<()> {
    use therian_core::Operation;

    let ty = parse_type(&args.ty)?;
    let mut operation = GetElementType::new(ty.clone());
    let element = engine.context().eval_if_supported(&mut operation)?;

    output.report(&ElementTypeReport {
        ty: ty.to_string(),
        element_type: element.map(|t| t.to_string()),
        operator: operation.operator().map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{KindArg, OutputFormat};
    use crate::output::tests::writer;

    fn engine() -> Engine {
        Engine::standard().unwrap()
    }

    #[test]
    fn test_operators_json_lists_registry_order() {
        let (mut output, buffer) = writer(OutputFormat::Json);
        handle_operators(OperatorsArgs { kind: None }, &engine(), &mut output).unwrap();

        let report: serde_json::Value = serde_json::from_str(&buffer.contents()).unwrap();
        let operators = report["operators"].as_array().unwrap();
        assert_eq!(operators.len(), engine().registry().len());
        assert_eq!(operators[0]["order"], 1);
        let names: Vec<&str> = operators.iter().map(|o| o["name"].as_str().unwrap()).collect();
        let specific = names.iter().position(|n| *n == "BeanCopier").unwrap();
        let fallback = names.iter().position(|n| *n == "ConvertingCopier").unwrap();
        assert!(specific < fallback);
    }

    #[test]
    fn test_operators_kind_filter_keeps_global_order() {
        let (mut output, buffer) = writer(OutputFormat::Json);
        handle_operators(
            OperatorsArgs {
                kind: Some(KindArg::AddAll),
            },
            &engine(),
            &mut output,
        )
        .unwrap();

        let report: serde_json::Value = serde_json::from_str(&buffer.contents()).unwrap();
        let operators = report["operators"].as_array().unwrap();
        assert!(!operators.is_empty());
        assert!(operators.iter().all(|o| o["kind"] == "AddAll"));
        assert!(operators[0]["order"].as_u64().unwrap() > 1);
    }

    #[test]
    fn test_operators_human_output() {
        let (mut output, buffer) = writer(OutputFormat::Human);
        handle_operators(OperatorsArgs { kind: Some(KindArg::Size) }, &engine(), &mut output).unwrap();
        let text = buffer.contents();
        assert!(text.contains("DefaultSize"));
        assert!(text.contains("Size"));
    }

    #[test]
    fn test_element_type() {
        let (mut output, buffer) = writer(OutputFormat::Human);
        handle_element_type(
            ElementTypeArgs {
                ty: "List<String>".to_string(),
            },
            &engine(),
            &mut output,
        )
        .unwrap();
        assert_eq!(buffer.contents(), "List<String> -> String\n");

        let (mut output, buffer) = writer(OutputFormat::Json);
        handle_element_type(
            ElementTypeArgs {
                ty: "String".to_string(),
            },
            &engine(),
            &mut output,
        )
        .unwrap();
        let report: serde_json::Value = serde_json::from_str(&buffer.contents()).unwrap();
        assert!(report["element_type"].is_null());
    }
}
