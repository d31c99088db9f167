//! Copiers
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use crate::context::EvaluationContext;
use crate::el::PathSegment;
use crate::operation::{Convert, Copy, ImmutableCheck, Operation};
use crate::operator::{Operator, Signature};
use crate::position::{PositionRef, Positions};
use crate::types::{BeanClass, Type};
use crate::value::{ObjectRef, Value};
use crate::{Error, Result};
use log::debug;

fn bean(position: &PositionRef) -> Result<Option<ObjectRef>> {
    if !position.is_readable() {
        return Ok(None);
    }
    Ok(match position.value()? {
        Value::Object(object) => Some(object),
        _ => None,
    })
}

/// Copy every same-named property the target can write
pub struct BeanCopier;

impl BeanCopier {
    fn property_copies(operation: &Copy) -> Result<Vec<Copy>> {
        let (Some(source), Some(target)) = (bean(operation.source())?, bean(operation.target())?) else {
            return Ok(Vec::new());
        };
        let source_class = source.class();
        Ok(target
            .class()
            .properties()
            .into_iter()
            .filter(|p| !p.read_only && source_class.property(&p.name).is_some())
            .map(|p| {
                Copy::new(
                    Positions::relative(operation.source().clone(), PathSegment::property(&p.name)),
                    Positions::relative(operation.target().clone(), PathSegment::property(&p.name)),
                )
            })
            .collect())
    }
}

impl Operator for BeanCopier {
    type Operation = Copy;

    fn signature(&self) -> Signature {
        Signature::new([Type::Bean(BeanClass::object()), Type::Bean(BeanClass::object())])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &Copy) -> Result<bool> {
        Ok(bean(operation.source())?.is_some() && bean(operation.target())?.is_some())
    }

    fn perform(&self, context: &mut EvaluationContext, operation: &mut Copy) -> Result<bool> {
        for mut copy in Self::property_copies(operation)? {
            if context.supports(&copy)? {
                context.eval(&mut copy)?;
            } else {
                debug!("Skipping unsupported {}", copy.describe());
            }
        }
        operation.set_result(());
        Ok(true)
    }
}

/// Replace the target's value by converting the source
///
/// A readable target must hold an immutable value; mutable state is left
/// to the copiers that know how to merge into it.
pub struct ConvertingCopier;

impl ConvertingCopier {
    fn conversion(operation: &Copy) -> Convert {
        Convert::new(operation.source().clone(), operation.target().clone())
    }
}

impl Operator for ConvertingCopier {
    type Operation = Copy;

    fn signature(&self) -> Signature {
        Signature::new([Type::Object, Type::Object])
    }

    fn supports(&self, context: &mut EvaluationContext, operation: &Copy) -> Result<bool> {
        if !operation.source().is_readable() || !operation.target().is_writable() {
            return Ok(false);
        }
        if operation.target().is_readable()
            && !context.eval_success(&mut ImmutableCheck::new(operation.target().clone()))?
        {
            return Ok(false);
        }
        context.supports(&Self::conversion(operation))
    }

    fn perform(&self, context: &mut EvaluationContext, operation: &mut Copy) -> Result<bool> {
        context.eval(&mut Self::conversion(operation))?;
        operation.set_result(());
        Ok(true)
    }
}

/// Copies declared `(from, to)` property pairs between two bean types
///
/// Backs a single mapper method. Each pair is a path expression on either
/// side; a pair that cannot be copied fails the whole copy, naming the pair.
pub struct PropertyCopier {
    contract: String,
    method: String,
    source_type: Type,
    target_class: BeanClass,
    pairs: Vec<(String, String)>,
}

impl PropertyCopier {
    pub fn new(
        contract: impl Into<String>,
        method: impl Into<String>,
        source_type: Type,
        target_class: BeanClass,
        pairs: Vec<(String, String)>,
    ) -> Self {
        Self {
            contract: contract.into(),
            method: method.into(),
            source_type,
            target_class,
            pairs,
        }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    fn mapping_error(&self, from: &str, to: &str, source: Error) -> Error {
        Error::Mapping {
            contract: self.contract.clone(),
            method: self.method.clone(),
            from: from.to_string(),
            to: to.to_string(),
            source: Box::new(source),
        }
    }
}

impl Operator for PropertyCopier {
    type Operation = Copy;

    fn signature(&self) -> Signature {
        Signature::new([self.source_type.clone(), Type::Bean(self.target_class.clone())])
    }

    fn supports(&self, _context: &mut EvaluationContext, operation: &Copy) -> Result<bool> {
        if !operation.source().is_readable() || operation.source().value()?.is_null() {
            return Ok(false);
        }
        Ok(bean(operation.target())?.is_some())
    }

    fn perform(&self, context: &mut EvaluationContext, operation: &mut Copy) -> Result<bool> {
        for (from, to) in &self.pairs {
            let mut copy = Copy::new(
                Positions::required(operation.source().clone(), PathSegment::expression(from)),
                Positions::required(operation.target().clone(), PathSegment::expression(to)),
            );
            context
                .eval(&mut copy)
                .map_err(|err| self.mapping_error(from, to, err))?;
        }
        operation.set_result(());
        Ok(true)
    }
}
