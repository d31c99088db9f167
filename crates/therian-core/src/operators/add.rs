//! Add operators
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use crate::context::EvaluationContext;
use crate::operation::{Add, Operation};
use crate::operator::{Operator, Signature};
use crate::types::{Family, Type};
use crate::value::Value;
use crate::Result;

/// Append to a mutable collection whose element type accepts the element
pub struct AddToCollection;

impl Operator for AddToCollection {
    type Operation = Add;

    fn signature(&self) -> Signature {
        Signature::new([Type::collection(Type::var("T")), Type::var("T")])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &Add) -> Result<bool> {
        if !operation.target().is_readable() || !operation.element().is_readable() {
            return Ok(false);
        }
        Ok(matches!(operation.target().value()?, Value::Collection(c) if c.is_mutable()))
    }

    fn perform(&self, _context: &mut EvaluationContext, operation: &mut Add) -> Result<bool> {
        let Value::Collection(collection) = operation.target().value()? else {
            return Ok(false);
        };
        let changed = collection.add(operation.element().value()?)?;
        operation.set_result(changed);
        Ok(true)
    }
}

/// Grow an array by one: allocate, copy, append, replace the target's value
pub struct AddToArray;

impl AddToArray {
    fn component(operation: &Add) -> Result<Type> {
        Ok(match operation.target().value()? {
            Value::Array(array) => array.component().clone(),
            _ => match operation.target().value_type() {
                Type::Array(component) => component.upper_bound(),
                _ => Type::Object,
            },
        })
    }
}

impl Operator for AddToArray {
    type Operation = Add;

    fn signature(&self) -> Signature {
        Signature::new([Type::array(Type::var("T")), Type::var("T")])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &Add) -> Result<bool> {
        let target = operation.target();
        if !target.is_readable() || !target.is_writable() || !operation.element().is_readable() {
            return Ok(false);
        }
        let component = Self::component(operation)?;
        Ok(component.accepts_value(&operation.element().value()?))
    }

    fn perform(&self, _context: &mut EvaluationContext, operation: &mut Add) -> Result<bool> {
        let component = Self::component(operation)?;
        let mut items = match operation.target().value()? {
            Value::Array(array) => array.to_vec(),
            _ => Vec::new(),
        };
        items.push(operation.element().value()?);
        operation.target().set_value(Value::array(component, items))?;
        operation.set_result(true);
        Ok(true)
    }
}

/// Put a two-element `[key, value]` entry into a mutable map
pub struct AddEntryToMap;

impl AddEntryToMap {
    fn entry(operation: &Add) -> Result<Option<(Value, Value)>> {
        let elements = operation.element().value()?.elements().unwrap_or_default();
        Ok(match <[Value; 2]>::try_from(elements) {
            Ok([key, value]) => Some((key, value)),
            Err(_) => None,
        })
    }
}

impl Operator for AddEntryToMap {
    type Operation = Add;

    fn signature(&self) -> Signature {
        Signature::new([Type::map(Type::any(), Type::any()), Type::Object])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &Add) -> Result<bool> {
        if !operation.target().is_readable() || !operation.element().is_readable() {
            return Ok(false);
        }
        let Value::Map(map) = operation.target().value()? else {
            return Ok(false);
        };
        if !map.is_mutable() {
            return Ok(false);
        }
        let Some((key, value)) = Self::entry(operation)? else {
            return Ok(false);
        };
        let args = operation
            .target()
            .value_type()
            .as_supertype(Family::Map)
            .unwrap_or_else(|| vec![Type::Object, Type::Object]);
        Ok(args[0].upper_bound().accepts_value(&key) && args[1].upper_bound().accepts_value(&value))
    }

    fn perform(&self, _context: &mut EvaluationContext, operation: &mut Add) -> Result<bool> {
        let (Value::Map(map), Some((key, value))) = (operation.target().value()?, Self::entry(operation)?) else {
            return Ok(false);
        };
        let previous = map.insert(key, value.clone())?;
        operation.set_result(previous.as_ref() != Some(&value));
        Ok(true)
    }
}
