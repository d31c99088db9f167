//! Converters
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use super::add_all::array_compatible;
use super::element_type_of;
use crate::context::EvaluationContext;
use crate::el::coercion::{coerce, narrow_integral};
use crate::operation::{AddAll, Convert, Copy};
use crate::operator::{Operator, Signature};
use crate::position::Positions;
use crate::types::{BeanClass, Type};
use crate::value::{CollectionKind, Value};
use crate::Result;
use log::debug;

/// Enum constant to its ordinal, in the target's numeric type
pub struct EnumToNumber;

impl Operator for EnumToNumber {
    type Operation = Convert;

    fn signature(&self) -> Signature {
        Signature::new([Type::Enum(None), Type::Number])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &Convert) -> Result<bool> {
        if !operation.source().is_readable() || !operation.target().is_writable() {
            return Ok(false);
        }
        Ok(matches!(operation.source_value()?, Value::Enum(_)))
    }

    fn perform(&self, _context: &mut EvaluationContext, operation: &mut Convert) -> Result<bool> {
        let Value::Enum(constant) = operation.source_value()? else {
            return Ok(false);
        };
        let ordinal = constant.ordinal as i64;
        let converted = match operation.target_type().primitive_kind() {
            Some(kind) => narrow_integral(ordinal, kind),
            None => Value::Int(ordinal as i32),
        };
        operation.write(converted)?;
        Ok(true)
    }
}

/// Arrays, collections, map values and iterators as a single-pass iterator
pub struct ToIterator;

impl Operator for ToIterator {
    type Operation = Convert;

    fn signature(&self) -> Signature {
        Signature::new([Type::Object, Type::iterator(Type::any())])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &Convert) -> Result<bool> {
        if !operation.source().is_readable() || !operation.target().is_writable() {
            return Ok(false);
        }
        Ok(matches!(
            operation.source_value()?,
            Value::Array(_) | Value::Collection(_) | Value::Map(_) | Value::Iterator(_)
        ))
    }

    fn perform(&self, _context: &mut EvaluationContext, operation: &mut Convert) -> Result<bool> {
        let converted = match operation.source_value()? {
            iterator @ Value::Iterator(_) => iterator,
            other => match other.elements() {
                Some(elements) => Value::iterator(elements),
                None => return Ok(false),
            },
        };
        operation.write(converted)?;
        Ok(true)
    }
}

/// A fresh array of the target's component type
pub struct ToArray;

impl ToArray {
    fn component(operation: &Convert) -> Option<Type> {
        match operation.target_type() {
            Type::Array(component) => Some(component.upper_bound()),
            _ => None,
        }
    }
}

impl Operator for ToArray {
    type Operation = Convert;

    fn signature(&self) -> Signature {
        Signature::new([Type::Object, Type::array(Type::any())])
    }

    fn supports(&self, context: &mut EvaluationContext, operation: &Convert) -> Result<bool> {
        if !operation.source().is_readable() || !operation.target().is_writable() {
            return Ok(false);
        }
        let Some(component) = Self::component(operation) else {
            return Ok(false);
        };
        let source = operation.source_value()?;
        if !matches!(source, Value::Array(_) | Value::Collection(_) | Value::Iterator(_)) {
            return Ok(false);
        }
        let declared = element_type_of(context, &operation.source_type());
        if array_compatible(&component, &declared) {
            return Ok(true);
        }
        // iterators cannot be inspected without consuming them
        Ok(match source.elements() {
            Some(elements) => elements.iter().all(|e| component.accepts_value(e)),
            None => false,
        })
    }

    fn perform(&self, _context: &mut EvaluationContext, operation: &mut Convert) -> Result<bool> {
        let Some(component) = Self::component(operation) else {
            return Ok(false);
        };
        let elements = match operation.source_value()? {
            Value::Iterator(iterator) => iterator.drain(),
            other => match other.elements() {
                Some(elements) => elements,
                None => return Ok(false),
            },
        };
        if let Some(rejected) = elements.iter().find(|e| !component.accepts_value(e)) {
            debug!("{} does not fit a {} array", rejected, component);
            return Ok(false);
        }
        operation.write(Value::array(component, elements))?;
        Ok(true)
    }
}

/// A fresh mutable list or set filled through AddAll
pub struct ToCollection;

impl ToCollection {
    fn fresh(target_type: &Type) -> Value {
        match target_type {
            Type::Set(_) => Value::empty_collection(CollectionKind::Set),
            _ => Value::empty_collection(CollectionKind::List),
        }
    }

    fn filling(operation: &Convert) -> Result<(Value, AddAll)> {
        let target_type = operation.target_type();
        let fresh = Self::fresh(&target_type);
        let holder = Positions::read_only(target_type, fresh.clone());
        Ok((fresh, AddAll::new(holder, operation.source().clone())))
    }
}

impl Operator for ToCollection {
    type Operation = Convert;

    fn signature(&self) -> Signature {
        Signature::new([Type::Object, Type::collection(Type::any())])
    }

    fn supports(&self, context: &mut EvaluationContext, operation: &Convert) -> Result<bool> {
        if !operation.source().is_readable() || !operation.target().is_writable() {
            return Ok(false);
        }
        if !matches!(
            operation.source_value()?,
            Value::Array(_) | Value::Collection(_) | Value::Iterator(_)
        ) {
            return Ok(false);
        }
        let (_, fill) = Self::filling(operation)?;
        context.supports(&fill)
    }

    fn perform(&self, context: &mut EvaluationContext, operation: &mut Convert) -> Result<bool> {
        let (fresh, mut fill) = Self::filling(operation)?;
        context.eval(&mut fill)?;
        operation.write(fresh)?;
        Ok(true)
    }

    fn depends_on(&self) -> Vec<&'static str> {
        vec!["GenericAddAll"]
    }
}

/// New bean instance: a matching one-argument constructor, else no-arg constructor plus Copy
pub struct DefaultCopyingConverter;

impl DefaultCopyingConverter {
    fn target_class(operation: &Convert) -> Option<BeanClass> {
        match operation.target_type() {
            Type::Bean(class) if !class.is_abstract() => Some(class),
            _ => None,
        }
    }

    fn copy_into(operation: &Convert, class: &BeanClass) -> Result<(Value, Copy)> {
        let instance = class.new_instance()?;
        let target = Positions::read_only(Type::Bean(class.clone()), instance.clone());
        Ok((instance, Copy::new(operation.source().clone(), target)))
    }
}

impl Operator for DefaultCopyingConverter {
    type Operation = Convert;

    fn signature(&self) -> Signature {
        Signature::new([Type::Object, Type::Bean(BeanClass::object())])
    }

    fn supports(&self, context: &mut EvaluationContext, operation: &Convert) -> Result<bool> {
        if !operation.source().is_readable() || !operation.target().is_writable() {
            return Ok(false);
        }
        let Some(class) = Self::target_class(operation) else {
            return Ok(false);
        };
        let source = operation.source_value()?;
        if source.is_null() {
            return Ok(false);
        }
        if class
            .constructors()
            .iter()
            .any(|c| c.parameter.accepts_value(&source))
        {
            return Ok(true);
        }
        if !class.has_default_constructor() {
            return Ok(false);
        }
        let (_, copy) = Self::copy_into(operation, &class)?;
        context.supports(&copy)
    }

    fn perform(&self, context: &mut EvaluationContext, operation: &mut Convert) -> Result<bool> {
        let Some(class) = Self::target_class(operation) else {
            return Ok(false);
        };
        let source = operation.source_value()?;
        if let Some(constructor) = class
            .constructors()
            .iter()
            .find(|c| c.parameter.accepts_value(&source))
        {
            let created = (constructor.factory)(&class, &source)?;
            operation.write(created)?;
            return Ok(true);
        }
        let (instance, mut copy) = Self::copy_into(operation, &class)?;
        context.eval(&mut copy)?;
        operation.write(instance)?;
        Ok(true)
    }
}

/// Fallback conversion by expression-language coercion rules
///
/// A coercion failure means the converter does not apply.
pub struct ElCoercionConverter;

impl Operator for ElCoercionConverter {
    type Operation = Convert;

    fn signature(&self) -> Signature {
        Signature::new([Type::Object, Type::Object])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &Convert) -> Result<bool> {
        if !operation.source().is_readable() || !operation.target().is_writable() {
            return Ok(false);
        }
        let target_type = operation.target_type();
        match coerce(&operation.source_value()?, &target_type) {
            Ok(coerced) => Ok(target_type.accepts_value(&coerced)),
            Err(err) => {
                debug!("{}", err);
                Ok(false)
            }
        }
    }

    fn perform(&self, _context: &mut EvaluationContext, operation: &mut Convert) -> Result<bool> {
        let coerced = match coerce(&operation.source_value()?, &operation.target_type()) {
            Ok(coerced) => coerced,
            Err(err) => {
                debug!("{}", err);
                return Ok(false);
            }
        };
        operation.write(coerced)?;
        Ok(true)
    }
}
