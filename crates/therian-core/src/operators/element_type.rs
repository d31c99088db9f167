//! Element type resolution for container types
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use crate::context::EvaluationContext;
use crate::operation::{GetElementType, Operation};
use crate::operator::{Operator, Signature};
use crate::types::{Family, Type};
use crate::Result;

/// Argument `index` of `ty` viewed as `family`, resolved to its upper bound
fn resolve(ty: &Type, family: Family, index: usize) -> Option<Type> {
    ty.as_supertype(family)
        .and_then(|args| args.into_iter().nth(index))
        .map(|arg| arg.upper_bound())
}

pub struct GetArrayComponentType;

impl Operator for GetArrayComponentType {
    type Operation = GetElementType;

    fn signature(&self) -> Signature {
        Signature::new([Type::array(Type::any())])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &GetElementType) -> Result<bool> {
        Ok(matches!(operation.container_type().upper_bound(), Type::Array(_)))
    }

    fn perform(&self, _context: &mut EvaluationContext, operation: &mut GetElementType) -> Result<bool> {
        match operation.container_type().upper_bound() {
            Type::Array(component) => {
                operation.set_result(component.upper_bound());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Iterable, Collection, List, Set and beans declaring one of them
pub struct GetIterableElementType;

impl Operator for GetIterableElementType {
    type Operation = GetElementType;

    fn signature(&self) -> Signature {
        Signature::new([Type::iterable(Type::any())])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &GetElementType) -> Result<bool> {
        Ok(resolve(operation.container_type(), Family::Iterable, 0).is_some())
    }

    fn perform(&self, _context: &mut EvaluationContext, operation: &mut GetElementType) -> Result<bool> {
        match resolve(operation.container_type(), Family::Iterable, 0) {
            Some(element) => {
                operation.set_result(element);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

pub struct GetIteratorElementType;

impl Operator for GetIteratorElementType {
    type Operation = GetElementType;

    fn signature(&self) -> Signature {
        Signature::new([Type::iterator(Type::any())])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &GetElementType) -> Result<bool> {
        Ok(resolve(operation.container_type(), Family::Iterator, 0).is_some())
    }

    fn perform(&self, _context: &mut EvaluationContext, operation: &mut GetElementType) -> Result<bool> {
        match resolve(operation.container_type(), Family::Iterator, 0) {
            Some(element) => {
                operation.set_result(element);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// The value type argument of a map
pub struct GetMapValueType;

impl Operator for GetMapValueType {
    type Operation = GetElementType;

    fn signature(&self) -> Signature {
        Signature::new([Type::map(Type::any(), Type::any())])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &GetElementType) -> Result<bool> {
        Ok(resolve(operation.container_type(), Family::Map, 1).is_some())
    }

    fn perform(&self, _context: &mut EvaluationContext, operation: &mut GetElementType) -> Result<bool> {
        match resolve(operation.container_type(), Family::Map, 1) {
            Some(value) => {
                operation.set_result(value);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
