//! Convert and Copy operations
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use super::{ImmutableCheck, Operation, OperationCore, OperationKind};
use crate::context::EvaluationContext;
use crate::position::{PositionKey, PositionRef};
use crate::types::Type;
use crate::value::Value;
use crate::{Error, Result};

/// Produce a value of the target's type from the source
///
/// The result is the converted value, which is also written to the target.
pub struct Convert {
    source: PositionRef,
    target: PositionRef,
    core: OperationCore<Value>,
}

impl Convert {
    pub fn new(source: PositionRef, target: PositionRef) -> Self {
        Self {
            source,
            target,
            core: OperationCore::default(),
        }
    }

    pub fn source(&self) -> &PositionRef {
        &self.source
    }

    pub fn target(&self) -> &PositionRef {
        &self.target
    }

    pub fn source_type(&self) -> Type {
        self.source.value_type()
    }

    pub fn target_type(&self) -> Type {
        self.target.value_type()
    }

    pub fn source_value(&self) -> Result<Value> {
        self.source.value()
    }

    /// Store the converted value in the target and record it as the result
    pub fn write(&mut self, value: Value) -> Result<()> {
        self.target.set_value(value.clone())?;
        self.set_result(value);
        Ok(())
    }
}

impl Operation for Convert {
    type Output = Value;

    const KIND: OperationKind = OperationKind::Convert;

    fn type_arguments(&self) -> Vec<Type> {
        vec![self.source.value_type(), self.target.value_type()]
    }

    fn position_keys(&self) -> Vec<PositionKey> {
        vec![self.source.key(), self.target.key()]
    }

    fn core(&self) -> &OperationCore<Value> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OperationCore<Value> {
        &mut self.core
    }

    fn describe(&self) -> String {
        format!(
            "Convert {} to {}",
            self.source.describe(),
            self.target.describe()
        )
    }

    /// An immutable source already assignable to the target is passed through
    fn shortcut_applies(&self, context: &mut EvaluationContext) -> Result<bool> {
        if !self.source.is_readable() || !self.target.is_writable() {
            return Ok(false);
        }
        let target_type = self.target.value_type();
        if !target_type.is_assignable_from(&self.source.value_type()) {
            return Ok(false);
        }
        let value = self.source.value()?;
        if !target_type.accepts_value(&value) {
            return Ok(false);
        }
        context.eval_success(&mut ImmutableCheck::new(self.source.clone()))
    }

    fn apply_shortcut(&mut self, _context: &mut EvaluationContext) -> Result<()> {
        let value = self.source.value()?;
        self.write(value)
    }
}

/// Transfer the source's state into the target
pub struct Copy {
    source: PositionRef,
    target: PositionRef,
    core: OperationCore<()>,
}

impl Copy {
    pub fn new(source: PositionRef, target: PositionRef) -> Self {
        Self {
            source,
            target,
            core: OperationCore::default(),
        }
    }

    pub fn source(&self) -> &PositionRef {
        &self.source
    }

    pub fn target(&self) -> &PositionRef {
        &self.target
    }

    pub fn source_type(&self) -> Type {
        self.source.value_type()
    }

    pub fn target_type(&self) -> Type {
        self.target.value_type()
    }
}

impl Operation for Copy {
    type Output = ();

    const KIND: OperationKind = OperationKind::Copy;

    fn type_arguments(&self) -> Vec<Type> {
        vec![self.source.value_type(), self.target.value_type()]
    }

    fn position_keys(&self) -> Vec<PositionKey> {
        vec![self.source.key(), self.target.key()]
    }

    fn core(&self) -> &OperationCore<()> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OperationCore<()> {
        &mut self.core
    }

    fn describe(&self) -> String {
        format!("Copy {} to {}", self.source.describe(), self.target.describe())
    }

    /// A copy has nothing to return beyond its success
    fn result(&self) -> Result<()> {
        if self.is_successful() {
            Ok(())
        } else {
            Err(Error::ResultUnavailable {
                operation: self.describe(),
            })
        }
    }
}
