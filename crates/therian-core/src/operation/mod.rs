//! Operations: typed units of work over positions
//!
//! Every operation carries its positions, a lifecycle [`Status`], a success
//! flag and, once successful, a result. Its [`Profile`] (kind plus type
//! arguments) drives operator matching; its [`OperationKey`] (profile plus
//! position keys) identifies it for caching and re-entrancy detection.
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

mod collection;
mod convert;
mod immutable;

pub use collection::{Add, AddAll, GetElementType, Size};
pub use convert::{Convert, Copy};
pub use immutable::ImmutableCheck;

use crate::context::EvaluationContext;
use crate::position::PositionKey;
use crate::types::Type;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation kinds known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Convert,
    Copy,
    Add,
    AddAll,
    Size,
    GetElementType,
    ImmutableCheck,
}

impl OperationKind {
    pub const ALL: [OperationKind; 7] = [
        OperationKind::Convert,
        OperationKind::Copy,
        OperationKind::Add,
        OperationKind::AddAll,
        OperationKind::Size,
        OperationKind::GetElementType,
        OperationKind::ImmutableCheck,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OperationKind::Convert => "Convert",
            OperationKind::Copy => "Copy",
            OperationKind::Add => "Add",
            OperationKind::AddAll => "AddAll",
            OperationKind::Size => "Size",
            OperationKind::GetElementType => "GetElementType",
            OperationKind::ImmutableCheck => "ImmutableCheck",
        }
    }

    /// Number of type arguments in this kind's profile
    pub fn arity(self) -> usize {
        match self {
            OperationKind::Convert
            | OperationKind::Copy
            | OperationKind::Add
            | OperationKind::AddAll => 2,
            OperationKind::Size | OperationKind::GetElementType | OperationKind::ImmutableCheck => 1,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operation kind plus its actual type arguments, e.g. `Convert<String, int>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Profile {
    pub kind: OperationKind,
    pub args: Vec<Type>,
}

impl Profile {
    pub fn new(kind: OperationKind, args: Vec<Type>) -> Self {
        Self { kind, args }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = self
            .args
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}<{}>", self.kind, args)
    }
}

/// Identity of an operation within an evaluation context
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey {
    profile: Profile,
    positions: Vec<PositionKey>,
}

impl OperationKey {
    pub fn profile(&self) -> &Profile {
        &self.profile
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.profile)
    }
}

/// Evaluation lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Unstarted,
    SupportChecking,
    Unsupported,
    Supported,
    Performing,
    Succeeded,
    Failed,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Unsupported | Status::Succeeded | Status::Failed)
    }
}

/// State shared by every operation type
#[derive(Debug, Clone)]
pub struct OperationCore<R> {
    status: Status,
    successful: Option<bool>,
    result: Option<R>,
    operator: Option<String>,
}

impl<R> Default for OperationCore<R> {
    fn default() -> Self {
        Self {
            status: Status::Unstarted,
            successful: None,
            result: None,
            operator: None,
        }
    }
}

/// A typed unit of work
pub trait Operation: Send + 'static {
    type Output: Clone + Send + 'static;

    const KIND: OperationKind;

    /// Declared types of the operation's slots, in profile order
    fn type_arguments(&self) -> Vec<Type>;

    fn position_keys(&self) -> Vec<PositionKey>;

    fn core(&self) -> &OperationCore<Self::Output>;

    fn core_mut(&mut self) -> &mut OperationCore<Self::Output>;

    fn profile(&self) -> Profile {
        Profile::new(Self::KIND, self.type_arguments())
    }

    fn key(&self) -> OperationKey {
        OperationKey {
            profile: self.profile(),
            positions: self.position_keys(),
        }
    }

    fn describe(&self) -> String {
        self.profile().to_string()
    }

    fn status(&self) -> Status {
        self.core().status
    }

    fn set_status(&mut self, status: Status) {
        self.core_mut().status = status;
    }

    fn is_successful(&self) -> bool {
        self.core().successful.unwrap_or(false)
    }

    /// Success flag; `None` until the operation has been performed
    fn successful(&self) -> Option<bool> {
        self.core().successful
    }

    fn set_successful(&mut self, successful: bool) {
        self.core_mut().successful = Some(successful);
    }

    /// Name of the operator that performed (or was chosen to perform) this operation
    fn operator(&self) -> Option<&str> {
        self.core().operator.as_deref()
    }

    fn set_operator(&mut self, operator: &str) {
        self.core_mut().operator = Some(operator.to_string());
    }

    /// The result; only available after success
    fn result(&self) -> Result<Self::Output> {
        match (&self.core().successful, &self.core().result) {
            (Some(true), Some(result)) => Ok(result.clone()),
            _ => Err(Error::ResultUnavailable {
                operation: self.describe(),
            }),
        }
    }

    fn set_result(&mut self, result: Self::Output) {
        self.core_mut().result = Some(result);
    }

    /// Whether the operation can complete without consulting any operator
    fn shortcut_applies(&self, context: &mut EvaluationContext) -> Result<bool> {
        let _ = context;
        Ok(false)
    }

    /// Complete the operation without an operator; only called when `shortcut_applies`
    fn apply_shortcut(&mut self, context: &mut EvaluationContext) -> Result<()> {
        let _ = context;
        Ok(())
    }
}
