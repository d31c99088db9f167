//! ImmutableCheck operation
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use super::{Operation, OperationCore, OperationKind};
use crate::position::{PositionKey, PositionRef};
use crate::types::Type;
use crate::Result;

/// Whether the value at a position is immutable; the answer is the success flag
pub struct ImmutableCheck {
    position: PositionRef,
    core: OperationCore<bool>,
}

impl ImmutableCheck {
    pub fn new(position: PositionRef) -> Self {
        Self {
            position,
            core: OperationCore::default(),
        }
    }

    pub fn position(&self) -> &PositionRef {
        &self.position
    }
}

impl Operation for ImmutableCheck {
    type Output = bool;

    const KIND: OperationKind = OperationKind::ImmutableCheck;

    fn type_arguments(&self) -> Vec<Type> {
        vec![self.position.value_type()]
    }

    fn position_keys(&self) -> Vec<PositionKey> {
        vec![self.position.key()]
    }

    fn core(&self) -> &OperationCore<bool> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OperationCore<bool> {
        &mut self.core
    }

    fn describe(&self) -> String {
        format!("ImmutableCheck {}", self.position.describe())
    }

    /// Mirrors the success flag once performed
    fn result(&self) -> Result<bool> {
        match self.successful() {
            Some(successful) => Ok(successful),
            None => Err(crate::Error::ResultUnavailable {
                operation: self.describe(),
            }),
        }
    }
}
