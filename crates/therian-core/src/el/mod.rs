//! Expression evaluation against a base object
//!
//! Relative positions never touch their parent's storage directly; they ask an
//! [`ExpressionEvaluator`] to read, write or type a path segment against the
//! parent's current value. Every method reports whether the segment resolved
//! through an `Option` (or `bool` for writes) so callers can tell "resolved to
//! null" apart from "could not resolve".
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

pub mod coercion;
pub mod parser;

pub use coercion::coerce;
pub use parser::parse_path;

use crate::types::{Family, Type};
use crate::value::{CollectionKind, Value};
use crate::Result;
use std::fmt;

/// One step of a property path
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Bean property (or string map key)
    Property(String),
    /// Array or list index
    Index(usize),
    /// Map key
    Key(Value),
    /// A dotted/bracketed expression such as `a.b[0]['k']`
    Expression(String),
}

impl PathSegment {
    pub fn property(name: impl Into<String>) -> Self {
        PathSegment::Property(name.into())
    }

    pub fn expression(expression: impl Into<String>) -> Self {
        PathSegment::Expression(expression.into())
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Property(name) => write!(f, "{}", name),
            PathSegment::Index(index) => write!(f, "[{}]", index),
            PathSegment::Key(key) => write!(f, "[{}]", key),
            PathSegment::Expression(expression) => write!(f, "{}", expression),
        }
    }
}

/// Read/write/type access to a path segment of a base object
pub trait ExpressionEvaluator: Send + Sync {
    /// Declared type of the segment, `None` when unresolvable
    fn value_type(&self, base_type: &Type, base: &Value, segment: &PathSegment) -> Result<Option<Type>>;

    /// Current value of the segment, `None` when unresolvable
    fn value(&self, base_type: &Type, base: &Value, segment: &PathSegment) -> Result<Option<Value>>;

    /// Write the segment; `false` when unresolvable
    fn set_value(&self, base_type: &Type, base: &Value, segment: &PathSegment, value: Value) -> Result<bool>;

    /// Whether the segment rejects writes, `None` when unresolvable
    fn is_read_only(&self, base_type: &Type, base: &Value, segment: &PathSegment) -> Result<Option<bool>>;
}

/// Resolver for bean properties, map keys, array/list indexes and path expressions
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardResolver;

impl StandardResolver {
    /// Prefer the runtime type when the declared one carries no structure
    fn effective_type(base_type: &Type, base: &Value) -> Type {
        match base_type {
            Type::Object | Type::Wildcard(_) | Type::Variable(_) if !base.is_null() => base.runtime_type(),
            Type::Bean(_) => match base {
                Value::Object(object) => Type::Bean(object.class()),
                _ => base_type.clone(),
            },
            other => other.clone(),
        }
    }

    fn argument(ty: &Type, family: Family, index: usize) -> Option<Type> {
        ty.as_supertype(family)
            .and_then(|args| args.get(index).cloned())
            .map(|arg| arg.upper_bound())
    }

    fn step_type(base_type: &Type, base: &Value, segment: &PathSegment) -> Option<Type> {
        let ty = Self::effective_type(base_type, base);
        match segment {
            PathSegment::Property(name) => match &ty {
                Type::Bean(class) => class.property(name).map(|p| p.ty),
                Type::Map(_, _) => Self::argument(&ty, Family::Map, 1),
                _ => None,
            },
            PathSegment::Index(_) => match &ty {
                Type::Array(component) => Some((**component).clone()),
                _ => Self::argument(&ty, Family::List, 0),
            },
            PathSegment::Key(_) => Self::argument(&ty, Family::Map, 1),
            PathSegment::Expression(_) => None,
        }
    }

    fn step_value(base: &Value, segment: &PathSegment) -> Option<Value> {
        match (base, segment) {
            (Value::Object(object), PathSegment::Property(name)) => object.get(name),
            (Value::Map(map), PathSegment::Property(name)) => {
                Some(map.get(&Value::string(name)).unwrap_or(Value::Null))
            }
            (Value::Map(map), PathSegment::Key(key)) => Some(map.get(key).unwrap_or(Value::Null)),
            (Value::Array(array), PathSegment::Index(index)) => array.get(*index),
            (Value::Collection(list), PathSegment::Index(index)) if list.kind() == CollectionKind::List => {
                list.get(*index)
            }
            _ => None,
        }
    }

    fn step_set(base: &Value, segment: &PathSegment, value: Value) -> Result<bool> {
        match (base, segment) {
            (Value::Object(object), PathSegment::Property(name)) => {
                let class = object.class();
                match class.property(name) {
                    Some(property) if property.read_only => Err(crate::Error::position(
                        format!("{}.{}", class.name(), name),
                        "property is read-only",
                    )),
                    Some(_) => object.set(name, value).map(|_| true),
                    None => Ok(false),
                }
            }
            (Value::Map(map), PathSegment::Property(name)) => {
                map.insert(Value::string(name), value).map(|_| true)
            }
            (Value::Map(map), PathSegment::Key(key)) => map.insert(key.clone(), value).map(|_| true),
            (Value::Array(array), PathSegment::Index(index)) if *index < array.len() => {
                array.set(*index, value).map(|_| true)
            }
            (Value::Collection(list), PathSegment::Index(index))
                if list.kind() == CollectionKind::List && *index < list.len() =>
            {
                list.set(*index, value).map(|_| true)
            }
            _ => Ok(false),
        }
    }

    fn step_read_only(base: &Value, segment: &PathSegment) -> Option<bool> {
        match (base, segment) {
            (Value::Object(object), PathSegment::Property(name)) => {
                object.class().property(name).map(|p| p.read_only)
            }
            (Value::Map(map), PathSegment::Property(_) | PathSegment::Key(_)) => Some(!map.is_mutable()),
            (Value::Array(array), PathSegment::Index(index)) => (*index < array.len()).then_some(false),
            (Value::Collection(list), PathSegment::Index(index)) if list.kind() == CollectionKind::List => {
                (*index < list.len()).then_some(!list.is_mutable())
            }
            _ => None,
        }
    }

    /// Walk all but the last segment of an expression
    fn walk(
        base_type: &Type,
        base: &Value,
        expression: &str,
    ) -> Result<(Type, Option<Value>, PathSegment)> {
        let mut segments = parse_path(expression)?;
        let last = segments
            .pop()
            .ok_or_else(|| crate::Error::Expression {
                expression: expression.to_string(),
                message: "empty path".to_string(),
            })?;
        let mut ty = base_type.clone();
        let mut value = Some(base.clone());
        for segment in &segments {
            let current = value.clone().unwrap_or(Value::Null);
            let next_type = Self::step_type(&ty, &current, segment).unwrap_or(Type::Object);
            value = value.and_then(|v| Self::step_value(&v, segment));
            ty = next_type;
        }
        Ok((ty, value, last))
    }
}

impl ExpressionEvaluator for StandardResolver {
    fn value_type(&self, base_type: &Type, base: &Value, segment: &PathSegment) -> Result<Option<Type>> {
        match segment {
            PathSegment::Expression(expression) => {
                let (ty, value, last) = Self::walk(base_type, base, expression)?;
                Ok(Self::step_type(&ty, &value.unwrap_or(Value::Null), &last))
            }
            other => Ok(Self::step_type(base_type, base, other)),
        }
    }

    fn value(&self, base_type: &Type, base: &Value, segment: &PathSegment) -> Result<Option<Value>> {
        match segment {
            PathSegment::Expression(expression) => {
                let (_, value, last) = Self::walk(base_type, base, expression)?;
                Ok(value.and_then(|v| Self::step_value(&v, &last)))
            }
            other => Ok(Self::step_value(base, other)),
        }
    }

    fn set_value(&self, base_type: &Type, base: &Value, segment: &PathSegment, value: Value) -> Result<bool> {
        match segment {
            PathSegment::Expression(expression) => {
                let (_, parent, last) = Self::walk(base_type, base, expression)?;
                match parent {
                    Some(parent) => Self::step_set(&parent, &last, value),
                    None => Ok(false),
                }
            }
            other => Self::step_set(base, other, value),
        }
    }

    fn is_read_only(&self, base_type: &Type, base: &Value, segment: &PathSegment) -> Result<Option<bool>> {
        match segment {
            PathSegment::Expression(expression) => {
                let (_, parent, last) = Self::walk(base_type, base, expression)?;
                Ok(parent.and_then(|p| Self::step_read_only(&p, &last)))
            }
            other => Ok(Self::step_read_only(base, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BeanClass, PrimitiveKind};

    fn person() -> (BeanClass, Value) {
        let class = BeanClass::builder("Person")
            .property("name", Type::String)
            .property("age", Type::Primitive(PrimitiveKind::Int))
            .property("tags", Type::list(Type::String))
            .read_only_property("id", Type::Boxed(PrimitiveKind::Long))
            .build();
        let instance = class.new_instance().unwrap();
        (class, instance)
    }

    #[test]
    fn test_bean_property_access() {
        let (class, bean) = person();
        let ty = Type::bean(&class);
        let name = PathSegment::property("name");
        assert_eq!(StandardResolver.value_type(&ty, &bean, &name).unwrap(), Some(Type::String));
        assert_eq!(StandardResolver.value(&ty, &bean, &name).unwrap(), Some(Value::Null));
        assert!(StandardResolver.set_value(&ty, &bean, &name, Value::string("Ada")).unwrap());
        assert_eq!(StandardResolver.value(&ty, &bean, &name).unwrap(), Some(Value::string("Ada")));
        assert_eq!(
            StandardResolver.value(&ty, &bean, &PathSegment::property("age")).unwrap(),
            Some(Value::Int(0))
        );
    }

    #[test]
    fn test_unknown_property_is_unresolved() {
        let (class, bean) = person();
        let ty = Type::bean(&class);
        let missing = PathSegment::property("missing");
        assert_eq!(StandardResolver.value(&ty, &bean, &missing).unwrap(), None);
        assert!(!StandardResolver.set_value(&ty, &bean, &missing, Value::Int(1)).unwrap());
        assert_eq!(StandardResolver.is_read_only(&ty, &bean, &missing).unwrap(), None);
    }

    #[test]
    fn test_read_only_property() {
        let (class, bean) = person();
        let ty = Type::bean(&class);
        let id = PathSegment::property("id");
        assert_eq!(StandardResolver.is_read_only(&ty, &bean, &id).unwrap(), Some(true));
        assert!(StandardResolver.set_value(&ty, &bean, &id, Value::Long(1)).is_err());
    }

    #[test]
    fn test_expression_through_list() {
        let (class, bean) = person();
        let ty = Type::bean(&class);
        StandardResolver
            .set_value(
                &ty,
                &bean,
                &PathSegment::property("tags"),
                Value::list(vec![Value::string("a"), Value::string("b")]),
            )
            .unwrap();
        let second = PathSegment::expression("tags[1]");
        assert_eq!(StandardResolver.value_type(&ty, &bean, &second).unwrap(), Some(Type::String));
        assert_eq!(StandardResolver.value(&ty, &bean, &second).unwrap(), Some(Value::string("b")));
        assert_eq!(
            StandardResolver.value(&ty, &bean, &PathSegment::expression("tags[5]")).unwrap(),
            None
        );
    }

    #[test]
    fn test_map_keys() {
        let ty = Type::map(Type::String, Type::Boxed(PrimitiveKind::Int));
        let map = Value::map(vec![(Value::string("a"), Value::Int(1))]);
        let key = PathSegment::Key(Value::string("b"));
        assert_eq!(
            StandardResolver.value_type(&ty, &map, &key).unwrap(),
            Some(Type::Boxed(PrimitiveKind::Int))
        );
        assert_eq!(StandardResolver.value(&ty, &map, &key).unwrap(), Some(Value::Null));
        assert!(StandardResolver.set_value(&ty, &map, &key, Value::Int(2)).unwrap());
        assert_eq!(
            StandardResolver.value(&ty, &map, &PathSegment::expression("['b']")).unwrap(),
            Some(Value::Int(2))
        );
    }

    #[test]
    fn test_null_base_is_unresolved() {
        let (class, _) = person();
        let ty = Type::bean(&class);
        let name = PathSegment::property("name");
        assert_eq!(StandardResolver.value(&ty, &Value::Null, &name).unwrap(), None);
        assert_eq!(StandardResolver.value_type(&ty, &Value::Null, &name).unwrap(), Some(Type::String));
    }
}
