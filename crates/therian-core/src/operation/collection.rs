//! Container operations: Add, AddAll, Size, GetElementType
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use super::{Operation, OperationCore, OperationKind};
use crate::position::{PositionKey, PositionRef};
use crate::types::Type;

/// Add one element to a target container; the result tells whether it changed
pub struct Add {
    target: PositionRef,
    element: PositionRef,
    core: OperationCore<bool>,
}

impl Add {
    pub fn new(target: PositionRef, element: PositionRef) -> Self {
        Self {
            target,
            element,
            core: OperationCore::default(),
        }
    }

    pub fn target(&self) -> &PositionRef {
        &self.target
    }

    pub fn element(&self) -> &PositionRef {
        &self.element
    }
}

impl Operation for Add {
    type Output = bool;

    const KIND: OperationKind = OperationKind::Add;

    fn type_arguments(&self) -> Vec<Type> {
        vec![self.target.value_type(), self.element.value_type()]
    }

    fn position_keys(&self) -> Vec<PositionKey> {
        vec![self.target.key(), self.element.key()]
    }

    fn core(&self) -> &OperationCore<bool> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OperationCore<bool> {
        &mut self.core
    }

    fn describe(&self) -> String {
        format!("Add {} to {}", self.element.describe(), self.target.describe())
    }
}

/// Add every element of the source to the target
pub struct AddAll {
    target: PositionRef,
    source: PositionRef,
    core: OperationCore<bool>,
}

impl AddAll {
    pub fn new(target: PositionRef, source: PositionRef) -> Self {
        Self {
            target,
            source,
            core: OperationCore::default(),
        }
    }

    pub fn target(&self) -> &PositionRef {
        &self.target
    }

    pub fn source(&self) -> &PositionRef {
        &self.source
    }
}

impl Operation for AddAll {
    type Output = bool;

    const KIND: OperationKind = OperationKind::AddAll;

    fn type_arguments(&self) -> Vec<Type> {
        vec![self.target.value_type(), self.source.value_type()]
    }

    fn position_keys(&self) -> Vec<PositionKey> {
        vec![self.target.key(), self.source.key()]
    }

    fn core(&self) -> &OperationCore<bool> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OperationCore<bool> {
        &mut self.core
    }

    fn describe(&self) -> String {
        format!("AddAll {} to {}", self.source.describe(), self.target.describe())
    }
}

/// Number of elements at a position
pub struct Size {
    position: PositionRef,
    core: OperationCore<usize>,
}

impl Size {
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

impl Operation for Size {
    type Output = usize;

    const KIND: OperationKind = OperationKind::Size;

    fn type_arguments(&self) -> Vec<Type> {
        vec![self.position.value_type()]
    }

    fn position_keys(&self) -> Vec<PositionKey> {
        vec![self.position.key()]
    }

    fn core(&self) -> &OperationCore<usize> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OperationCore<usize> {
        &mut self.core
    }

    fn describe(&self) -> String {
        format!("Size {}", self.position.describe())
    }
}

/// Element type of a container type
pub struct GetElementType {
    ty: Type,
    core: OperationCore<Type>,
}

impl GetElementType {
    pub fn new(ty: Type) -> Self {
        Self {
            ty,
            core: OperationCore::default(),
        }
    }

    pub fn container_type(&self) -> &Type {
        &self.ty
    }
}

impl Operation for GetElementType {
    type Output = Type;

    const KIND: OperationKind = OperationKind::GetElementType;

    fn type_arguments(&self) -> Vec<Type> {
        vec![self.ty.clone()]
    }

    fn position_keys(&self) -> Vec<PositionKey> {
        Vec::new()
    }

    fn core(&self) -> &OperationCore<Type> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OperationCore<Type> {
        &mut self.core
    }
}
