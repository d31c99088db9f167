//! Error types for the Therian core library
//!
//! This module defines the error taxonomy of the evaluation engine, using
//! thiserror for ergonomic error definitions and anyhow for opaque sources.
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use std::fmt;
use thiserror::Error;
use serde::{Deserialize, Serialize};

/// Main error type for Therian operations
#[derive(Error, Debug)]
pub enum Error {
    /// No registered operator supports the operation
    #[error("Unsupported operation: {operation}")]
    OperationUnsupported {
        operation: String,
    },

    /// The operator chosen during the support check did not complete its work
    #[error("Operation failed: {operation} (operator: {operator})")]
    OperationFailed {
        operation: String,
        operator: String,
    },

    /// An operator signature is unusable for dispatch
    #[error("Invalid operator definition: {operator} - {message}")]
    OperatorDefinition {
        operator: String,
        message: String,
    },

    /// Module or engine assembly errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
    },

    /// An identical operation is already being performed further up the stack
    #[error("Reentrant evaluation of {operation}")]
    Reentrancy {
        operation: String,
    },

    /// The result of an operation was read before it succeeded
    #[error("Result not available for {operation}: operation has not succeeded")]
    ResultUnavailable {
        operation: String,
    },

    /// Position access errors (capability or type violations)
    #[error("Position error: {message} ({position})")]
    Position {
        position: String,
        message: String,
    },

    /// A required relative path could not be resolved
    #[error("Unable to resolve '{path}' against {base}")]
    Unresolvable {
        path: String,
        base: String,
    },

    /// Malformed path expressions
    #[error("Invalid expression '{expression}': {message}")]
    Expression {
        expression: String,
        message: String,
    },

    /// Expression-language style coercion failure
    #[error("Cannot coerce {value} to {target}")]
    Coercion {
        value: String,
        target: String,
    },

    /// A mapper contract is malformed
    #[error("Invalid mapper contract {contract}.{method}: {message}")]
    MapperDefinition {
        contract: String,
        method: String,
        message: String,
    },

    /// A mapper could not copy one of its declared property pairs
    #[error("Mapper {contract}.{method} failed to map '{from}' to '{to}': {source}")]
    Mapping {
        contract: String,
        method: String,
        from: String,
        to: String,
        #[source]
        source: Box<Error>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a position error
    pub fn position(position: impl fmt::Display, message: impl Into<String>) -> Self {
        Error::Position {
            position: position.to_string(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create an operator definition error
    pub fn operator_definition(operator: impl Into<String>, message: impl Into<String>) -> Self {
        Error::OperatorDefinition {
            operator: operator.into(),
            message: message.into(),
        }
    }

    /// Whether this error means "no operator applies" rather than a real failure
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::OperationUnsupported { .. })
    }
}

/// Evaluation phases an operator result may be reused for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// The `supports` verdict
    SupportCheck,
    /// The outcome of `perform`
    Evaluation,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::SupportCheck => write!(f, "support-check"),
            Phase::Evaluation => write!(f, "evaluation"),
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}
