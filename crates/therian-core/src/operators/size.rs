//! Size operators
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use super::element_type_of;
use crate::context::EvaluationContext;
use crate::operation::{Convert, Operation, Size};
use crate::operator::{Operator, Signature};
use crate::position::Positions;
use crate::types::Type;
use crate::value::Value;
use crate::Result;

/// Arrays of any component type, primitive included
pub struct SizeOfArray;

impl Operator for SizeOfArray {
    type Operation = Size;

    fn signature(&self) -> Signature {
        Signature::new([Type::array(Type::any())])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &Size) -> Result<bool> {
        Ok(operation.position().is_readable())
    }

    fn perform(&self, _context: &mut EvaluationContext, operation: &mut Size) -> Result<bool> {
        let size = match operation.position().value()? {
            Value::Null => 0,
            Value::Array(array) => array.len(),
            _ => return Ok(false),
        };
        operation.set_result(size);
        Ok(true)
    }
}

pub struct SizeOfCollection;

impl Operator for SizeOfCollection {
    type Operation = Size;

    fn signature(&self) -> Signature {
        Signature::new([Type::collection(Type::any())])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &Size) -> Result<bool> {
        if !operation.position().is_readable() {
            return Ok(false);
        }
        Ok(matches!(
            operation.position().value()?,
            Value::Null | Value::Collection(_)
        ))
    }

    fn perform(&self, _context: &mut EvaluationContext, operation: &mut Size) -> Result<bool> {
        let size = match operation.position().value()? {
            Value::Null => 0,
            Value::Collection(collection) => collection.len(),
            _ => return Ok(false),
        };
        operation.set_result(size);
        Ok(true)
    }
}

pub struct SizeOfMap;

impl Operator for SizeOfMap {
    type Operation = Size;

    fn signature(&self) -> Signature {
        Signature::new([Type::map(Type::any(), Type::any())])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &Size) -> Result<bool> {
        Ok(operation.position().is_readable())
    }

    fn perform(&self, _context: &mut EvaluationContext, operation: &mut Size) -> Result<bool> {
        let size = match operation.position().value()? {
            Value::Null => 0,
            Value::Map(map) => map.len(),
            _ => return Ok(false),
        };
        operation.set_result(size);
        Ok(true)
    }
}

/// Counts by draining; the iterator is exhausted afterwards
pub struct SizeOfIterator;

impl Operator for SizeOfIterator {
    type Operation = Size;

    fn signature(&self) -> Signature {
        Signature::new([Type::iterator(Type::any())])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &Size) -> Result<bool> {
        Ok(operation.position().is_readable())
    }

    fn perform(&self, _context: &mut EvaluationContext, operation: &mut Size) -> Result<bool> {
        let size = match operation.position().value()? {
            Value::Null => 0,
            Value::Iterator(iterator) => iterator.drain().len(),
            _ => return Ok(false),
        };
        operation.set_result(size);
        Ok(true)
    }
}

pub struct SizeOfCharSequence;

impl Operator for SizeOfCharSequence {
    type Operation = Size;

    fn signature(&self) -> Signature {
        Signature::new([Type::CharSequence])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &Size) -> Result<bool> {
        Ok(operation.position().is_readable())
    }

    fn perform(&self, _context: &mut EvaluationContext, operation: &mut Size) -> Result<bool> {
        let size = match operation.position().value()? {
            Value::Null => 0,
            Value::String(s) => s.chars().count(),
            _ => return Ok(false),
        };
        operation.set_result(size);
        Ok(true)
    }
}

/// Iterables without a direct size: convert to an iterator and count it
pub struct SizeOfIterable;

impl SizeOfIterable {
    fn conversion(context: &mut EvaluationContext, operation: &Size) -> Convert {
        let element = element_type_of(context, &operation.position().value_type());
        Convert::new(
            operation.position().clone(),
            Positions::read_write(Type::iterator(element)),
        )
    }
}

impl Operator for SizeOfIterable {
    type Operation = Size;

    fn signature(&self) -> Signature {
        Signature::new([Type::iterable(Type::any())])
    }

    fn supports(&self, context: &mut EvaluationContext, operation: &Size) -> Result<bool> {
        if !operation.position().is_readable() {
            return Ok(false);
        }
        if operation.position().value()?.is_null() {
            return Ok(true);
        }
        let conversion = Self::conversion(context, operation);
        context.supports(&conversion)
    }

    fn perform(&self, context: &mut EvaluationContext, operation: &mut Size) -> Result<bool> {
        if operation.position().value()?.is_null() {
            operation.set_result(0);
            return Ok(true);
        }
        let mut conversion = Self::conversion(context, operation);
        let size = match context.eval(&mut conversion)? {
            Value::Iterator(iterator) => iterator.drain().len(),
            _ => return Ok(false),
        };
        operation.set_result(size);
        Ok(true)
    }

    fn depends_on(&self) -> Vec<&'static str> {
        vec!["ToIterator"]
    }
}

/// Null is empty, a loosely typed container is sized by its runtime type, anything else is one
pub struct DefaultSize;

impl Operator for DefaultSize {
    type Operation = Size;

    fn signature(&self) -> Signature {
        Signature::new([Type::Object])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &Size) -> Result<bool> {
        Ok(operation.position().is_readable())
    }

    fn perform(&self, context: &mut EvaluationContext, operation: &mut Size) -> Result<bool> {
        let value = operation.position().value()?;
        let size = if value.is_null() {
            0
        } else if value.runtime_type() != operation.position().value_type() {
            let mut by_runtime_type = Size::new(Positions::read_only_value(value));
            context.eval_if_supported(&mut by_runtime_type)?.unwrap_or(1)
        } else {
            1
        };
        operation.set_result(size);
        Ok(true)
    }
}
