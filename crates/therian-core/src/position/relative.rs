//! Positions derived from a parent position through a path segment
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use super::{check_storable, Position, PositionKey, PositionRef};
use crate::el::{ExpressionEvaluator, PathSegment, StandardResolver};
use crate::types::Type;
use crate::value::Value;
use crate::{Error, Result};
use log::warn;
use std::sync::Arc;

/// A property, index, key or expression of the parent's current value
///
/// Holds no storage of its own: every access goes through the evaluator.
pub struct RelativePosition {
    parent: PositionRef,
    segment: PathSegment,
    required: bool,
    evaluator: Arc<dyn ExpressionEvaluator>,
}

impl RelativePosition {
    pub fn new(parent: PositionRef, segment: PathSegment) -> Self {
        Self {
            parent,
            segment,
            required: false,
            evaluator: Arc::new(StandardResolver),
        }
    }

    /// Fail instead of reading `null` when the path does not resolve
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn parent(&self) -> &PositionRef {
        &self.parent
    }

    pub fn segment(&self) -> &PathSegment {
        &self.segment
    }

    fn base(&self) -> Result<Value> {
        if self.parent.is_readable() {
            self.parent.value()
        } else {
            Ok(Value::Null)
        }
    }

    fn unresolvable(&self) -> Error {
        Error::Unresolvable {
            path: self.segment.to_string(),
            base: self.parent.describe(),
        }
    }
}

impl Position for RelativePosition {
    fn value_type(&self) -> Type {
        let base = self.base().unwrap_or(Value::Null);
        self.evaluator
            .value_type(&self.parent.value_type(), &base, &self.segment)
            .ok()
            .flatten()
            .unwrap_or(Type::Object)
    }

    fn is_readable(&self) -> bool {
        self.parent.is_readable()
    }

    fn is_writable(&self) -> bool {
        if !self.parent.is_readable() {
            return false;
        }
        let base = self.base().unwrap_or(Value::Null);
        !matches!(
            self.evaluator
                .is_read_only(&self.parent.value_type(), &base, &self.segment),
            Ok(Some(true))
        )
    }

    fn value(&self) -> Result<Value> {
        let base = self.base()?;
        match self.evaluator.value(&self.parent.value_type(), &base, &self.segment)? {
            Some(value) => Ok(value),
            None if self.required => Err(self.unresolvable()),
            None => Ok(Value::Null),
        }
    }

    fn set_value(&self, value: Value) -> Result<()> {
        check_storable(&self.describe(), &self.value_type(), &value)?;
        let base = self.base()?;
        let resolved = self
            .evaluator
            .set_value(&self.parent.value_type(), &base, &self.segment, value)?;
        if !resolved {
            if self.required {
                return Err(self.unresolvable());
            }
            warn!("Ignoring write to unresolvable {}", self.describe());
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Relative({} -> {})", self.parent.describe(), self.segment)
    }

    fn key(&self) -> PositionKey {
        PositionKey::relative(self, self.parent.key(), &self.segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Positions;
    use crate::types::{BeanClass, PrimitiveKind};

    fn address() -> BeanClass {
        BeanClass::builder("Address")
            .property("city", Type::String)
            .property("zip", Type::Primitive(PrimitiveKind::Int))
            .build()
    }

    #[test]
    fn test_reads_and_writes_through_parent() {
        let class = address();
        let parent = Positions::read_only(Type::bean(&class), class.new_instance().unwrap());
        let city = Positions::relative(parent.clone(), PathSegment::property("city"));
        assert_eq!(city.value_type(), Type::String);
        assert!(city.is_writable());
        city.set_value(Value::string("Oslo")).unwrap();
        assert_eq!(city.value().unwrap(), Value::string("Oslo"));
        assert!(city.set_value(Value::Int(3)).is_err());
    }

    #[test]
    fn test_optional_unresolved_reads_null() {
        let class = address();
        let parent = Positions::read_only(Type::bean(&class), Value::Null);
        let city = Positions::relative(parent, PathSegment::property("city"));
        assert_eq!(city.value().unwrap(), Value::Null);
        city.set_value(Value::string("ignored")).unwrap();
    }

    #[test]
    fn test_required_unresolved_fails() {
        let class = address();
        let parent = Positions::read_only(Type::bean(&class), Value::Null);
        let city = Positions::required(parent, PathSegment::property("city"));
        assert!(matches!(city.value(), Err(Error::Unresolvable { .. })));
        assert!(matches!(
            city.set_value(Value::string("x")),
            Err(Error::Unresolvable { .. })
        ));
    }

    #[test]
    fn test_keys_follow_current_value() {
        let class = address();
        let bean = class.new_instance().unwrap();
        let parent = Positions::read_only(Type::bean(&class), bean);
        let city = Positions::relative(parent.clone(), PathSegment::property("city"));
        let again = Positions::relative(parent.clone(), PathSegment::property("city"));
        let zip = Positions::relative(parent.clone(), PathSegment::property("zip"));
        let direct = Positions::read_write(Type::String);
        assert_eq!(city.key(), again.key());
        assert_ne!(city.key(), zip.key());
        assert_eq!(city.key(), direct.key());

        city.set_value(Value::string("Oslo")).unwrap();
        assert_ne!(city.key(), direct.key());
        assert_eq!(city.key(), again.key());
    }

    #[test]
    fn test_write_only_keys_keep_location() {
        let class = address();
        let sink = Positions::write_only(Type::bean(&class), |_| Ok(()));
        let city = Positions::relative(sink.clone(), PathSegment::property("city"));
        let street = Positions::relative(sink.clone(), PathSegment::property("street"));
        let again = Positions::relative(sink, PathSegment::property("city"));
        assert!(!city.is_readable());
        assert_ne!(city.key(), street.key());
        assert_eq!(city.key(), again.key());
    }
}
