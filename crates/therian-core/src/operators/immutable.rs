//! Immutability checking
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use crate::context::EvaluationContext;
use crate::operation::{ImmutableCheck, Operation};
use crate::operator::{Operator, Signature};
use crate::types::Type;
use crate::value::Value;
use crate::Result;

/// Affirms scalars, strings, enum constants and unmodifiable containers
///
/// Arrays, mutable containers, iterators and beans are never affirmed.
pub struct DefaultImmutableChecker;

impl DefaultImmutableChecker {
    pub fn is_immutable(value: &Value) -> bool {
        match value {
            Value::Array(_) | Value::Iterator(_) | Value::Object(_) => false,
            Value::Collection(collection) => !collection.is_mutable(),
            Value::Map(map) => !map.is_mutable(),
            _ => true,
        }
    }
}

impl Operator for DefaultImmutableChecker {
    type Operation = ImmutableCheck;

    fn signature(&self) -> Signature {
        Signature::new([Type::Object])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &ImmutableCheck) -> Result<bool> {
        Ok(operation.position().is_readable())
    }

    fn perform(&self, _context: &mut EvaluationContext, operation: &mut ImmutableCheck) -> Result<bool> {
        let immutable = Self::is_immutable(&operation.position().value()?);
        operation.set_result(immutable);
        Ok(immutable)
    }
}
