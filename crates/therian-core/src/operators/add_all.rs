//! AddAll operators
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use super::element_type_of;
use crate::context::EvaluationContext;
use crate::operation::{Add, AddAll, Convert, Operation};
use crate::operator::{Operator, Signature};
use crate::position::Positions;
use crate::types::Type;
use crate::value::Value;
use crate::Result;
use log::debug;

/// Whether arrays of `from` elements can feed an array of `component`
///
/// Primitive components never mix with anything but themselves.
pub(crate) fn array_compatible(component: &Type, from: &Type) -> bool {
    if component.is_primitive() || from.is_primitive() {
        component == from
    } else {
        component.is_assignable_from(from)
    }
}

/// Convert the source into an array of the target's component type, then append
pub struct AddAllToArray;

impl AddAllToArray {
    fn component(operation: &AddAll) -> Option<Type> {
        match operation.target().value_type() {
            Type::Array(component) => Some(component.upper_bound()),
            _ => None,
        }
    }

    fn conversion(operation: &AddAll, component: Type) -> Convert {
        Convert::new(
            operation.source().clone(),
            Positions::read_write(Type::array(component)),
        )
    }
}

impl Operator for AddAllToArray {
    type Operation = AddAll;

    fn signature(&self) -> Signature {
        Signature::new([Type::array(Type::any()), Type::Object])
    }

    fn supports(&self, context: &mut EvaluationContext, operation: &AddAll) -> Result<bool> {
        let target = operation.target();
        if !target.is_readable() || !target.is_writable() || !operation.source().is_readable() {
            return Ok(false);
        }
        let Some(component) = Self::component(operation) else {
            return Ok(false);
        };
        let source_element = element_type_of(context, &operation.source().value_type());
        if source_element != Type::Object && !array_compatible(&component, &source_element) {
            debug!(
                "Cannot add {} elements to a {} array",
                source_element, component
            );
            return Ok(false);
        }
        let conversion = Self::conversion(operation, component);
        context.supports(&conversion)
    }

    fn perform(&self, context: &mut EvaluationContext, operation: &mut AddAll) -> Result<bool> {
        let Some(component) = Self::component(operation) else {
            return Ok(false);
        };
        let mut conversion = Self::conversion(operation, component.clone());
        let Value::Array(converted) = context.eval(&mut conversion)? else {
            return Ok(false);
        };
        let changed = !converted.is_empty();

        match operation.target().value()? {
            Value::Array(existing) if !existing.is_empty() => {
                let mut items = existing.to_vec();
                items.extend(converted.to_vec());
                operation.target().set_value(Value::array(component, items))?;
            }
            _ => operation.target().set_value(Value::Array(converted))?,
        }
        operation.set_result(changed);
        Ok(true)
    }

    fn depends_on(&self) -> Vec<&'static str> {
        vec!["ToArray"]
    }
}

/// Iterate the source and add each element to the target
///
/// Array targets are left to [`AddAllToArray`].
pub struct GenericAddAll;

impl GenericAddAll {
    fn element_position(element_type: &Type, value: Value) -> crate::position::PositionRef {
        if value.is_null() {
            Positions::read_only(element_type.clone(), Value::Null)
        } else {
            Positions::read_only_value(value)
        }
    }

    fn iteration(operation: &AddAll, element_type: &Type) -> Convert {
        Convert::new(
            operation.source().clone(),
            Positions::read_write(Type::iterator(element_type.clone())),
        )
    }
}

impl Operator for GenericAddAll {
    type Operation = AddAll;

    fn signature(&self) -> Signature {
        Signature::new([Type::Object, Type::Object])
    }

    fn supports(&self, context: &mut EvaluationContext, operation: &AddAll) -> Result<bool> {
        if !operation.source().is_readable() || operation.source().value()?.is_null() {
            return Ok(false);
        }
        if matches!(operation.target().value_type(), Type::Array(_)) {
            return Ok(false);
        }
        let element_type = element_type_of(context, &operation.source().value_type());
        if !context.supports(&Self::iteration(operation, &element_type))? {
            return Ok(false);
        }
        // loosely typed sources are checked element by element when performed
        let sample_type = if element_type == Type::Object {
            element_type_of(context, &operation.target().value_type())
        } else {
            element_type
        };
        let sample_value = match &sample_type {
            Type::Primitive(kind) => kind.default_value(),
            _ => Value::Null,
        };
        let sample = Add::new(
            operation.target().clone(),
            Positions::read_only(sample_type, sample_value),
        );
        context.supports(&sample)
    }

    fn perform(&self, context: &mut EvaluationContext, operation: &mut AddAll) -> Result<bool> {
        let element_type = element_type_of(context, &operation.source().value_type());
        let mut iteration = Self::iteration(operation, &element_type);
        let Value::Iterator(iterator) = context.eval(&mut iteration)? else {
            return Ok(false);
        };

        let mut changed = false;
        while let Some(element) = iterator.next_value() {
            let mut add = Add::new(
                operation.target().clone(),
                Self::element_position(&element_type, element),
            );
            changed |= context.eval(&mut add)?;
        }
        operation.set_result(changed);
        Ok(true)
    }

    fn depends_on(&self) -> Vec<&'static str> {
        vec!["ToIterator"]
    }
}
