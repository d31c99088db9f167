//! Typed value slots
//!
//! A position pairs a declared [`Type`] with read and/or write access to a
//! value. Operations never hold raw values; they hold positions, so the same
//! operator can fill a local variable, a bean property or a list slot.
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

mod relative;

pub use relative::RelativePosition;

use crate::el::{ExpressionEvaluator, PathSegment};
use crate::types::Type;
use crate::value::{Value, ValueKey};
use crate::{Error, Result};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared handle to a position
pub type PositionRef = Arc<dyn Position>;

/// A typed slot with read and/or write capability
pub trait Position: Send + Sync {
    /// Declared type with full generic structure
    fn value_type(&self) -> Type;

    fn is_readable(&self) -> bool;

    fn is_writable(&self) -> bool;

    /// Current value; idempotent and free of side effects
    fn value(&self) -> Result<Value> {
        Err(Error::position(self.describe(), "position is not readable"))
    }

    fn set_value(&self, value: Value) -> Result<()> {
        let _ = value;
        Err(Error::position(self.describe(), "position is not writable"))
    }

    /// Human readable description used in error messages and logs
    fn describe(&self) -> String;

    /// Equality key: readable positions by type and value, write-only ones by type
    fn key(&self) -> PositionKey {
        PositionKey::of(self)
    }
}

impl fmt::Debug for dyn Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Identity of a position as seen by operation keys
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionKey {
    ty: Type,
    readable: bool,
    writable: bool,
    value: Option<ValueKey>,
    location: Option<Box<(PositionKey, String)>>,
}

impl PositionKey {
    fn of<P: Position + ?Sized>(position: &P) -> Self {
        let readable = position.is_readable();
        Self {
            ty: position.value_type(),
            readable,
            writable: position.is_writable(),
            value: readable.then(|| position.value().unwrap_or(Value::Null).key()),
            location: None,
        }
    }

    /// Key of a position derived from `parent` through `segment`
    ///
    /// A readable relative position is keyed like any other readable one, so
    /// walking a cyclic graph revisits the same keys. Without a value to go
    /// by, a write-only one is told apart by where it writes.
    pub(crate) fn relative<P: Position + ?Sized>(position: &P, parent: PositionKey, segment: &PathSegment) -> Self {
        let key = Self::of(position);
        if key.readable {
            return key;
        }
        Self {
            location: Some(Box::new((parent, segment.to_string()))),
            ..key
        }
    }
}

/// Reject values a slot of type `ty` cannot hold
pub(crate) fn check_storable(position: &str, ty: &Type, value: &Value) -> Result<()> {
    if value.is_null() && ty.is_primitive() {
        return Err(Error::position(position, format!("null cannot be stored in a {} position", ty)));
    }
    if !ty.accepts_value(value) {
        return Err(Error::position(
            position,
            format!("{} is not assignable to {}", value.runtime_type(), ty),
        ));
    }
    Ok(())
}

/// A read-only position around a fixed value
pub struct ReadOnlyPosition {
    ty: Type,
    value: Value,
}

impl Position for ReadOnlyPosition {
    fn value_type(&self) -> Type {
        self.ty.clone()
    }

    fn is_readable(&self) -> bool {
        true
    }

    fn is_writable(&self) -> bool {
        false
    }

    fn value(&self) -> Result<Value> {
        Ok(self.value.clone())
    }

    fn describe(&self) -> String {
        format!("Readable({}, {})", self.ty, self.value)
    }
}

/// A read-write position holding its own value
pub struct BoxedPosition {
    ty: Type,
    value: RwLock<Value>,
}

impl Position for BoxedPosition {
    fn value_type(&self) -> Type {
        self.ty.clone()
    }

    fn is_readable(&self) -> bool {
        true
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn value(&self) -> Result<Value> {
        Ok(self.value.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn set_value(&self, value: Value) -> Result<()> {
        check_storable(&self.describe(), &self.ty, &value)?;
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = value;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("ReadWrite({}, {})", self.ty, self.value().unwrap_or(Value::Null))
    }
}

type Sink = Box<dyn Fn(Value) -> Result<()> + Send + Sync>;

/// A write-only position forwarding to a setter
pub struct WriteOnlyPosition {
    ty: Type,
    sink: Sink,
}

impl Position for WriteOnlyPosition {
    fn value_type(&self) -> Type {
        self.ty.clone()
    }

    fn is_readable(&self) -> bool {
        false
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn set_value(&self, value: Value) -> Result<()> {
        check_storable(&self.describe(), &self.ty, &value)?;
        (self.sink)(value)
    }

    fn describe(&self) -> String {
        format!("Writable({})", self.ty)
    }
}

/// Position factories
pub struct Positions;

impl Positions {
    pub fn read_only(ty: Type, value: Value) -> PositionRef {
        Arc::new(ReadOnlyPosition { ty, value })
    }

    /// Read-only position typed by the value's runtime type
    pub fn read_only_value(value: Value) -> PositionRef {
        Arc::new(ReadOnlyPosition {
            ty: value.runtime_type(),
            value,
        })
    }

    /// Read-write position starting at the type's zero value (`null` for references)
    pub fn read_write(ty: Type) -> PositionRef {
        let initial = ty.primitive_kind().filter(|_| ty.is_primitive()).map(|k| k.default_value());
        Arc::new(BoxedPosition {
            ty,
            value: RwLock::new(initial.unwrap_or(Value::Null)),
        })
    }

    pub fn read_write_with(ty: Type, value: Value) -> Result<PositionRef> {
        check_storable(&format!("ReadWrite({})", ty), &ty, &value)?;
        Ok(Arc::new(BoxedPosition {
            ty,
            value: RwLock::new(value),
        }))
    }

    pub fn write_only<F>(ty: Type, sink: F) -> PositionRef
    where
        F: Fn(Value) -> Result<()> + Send + Sync + 'static,
    {
        Arc::new(WriteOnlyPosition {
            ty,
            sink: Box::new(sink),
        })
    }

    /// Optional relative position resolved by the standard resolver
    pub fn relative(parent: PositionRef, segment: PathSegment) -> PositionRef {
        Arc::new(RelativePosition::new(parent, segment))
    }

    /// Relative position whose unresolvable reads and writes fail
    pub fn required(parent: PositionRef, segment: PathSegment) -> PositionRef {
        Arc::new(RelativePosition::new(parent, segment).required())
    }

    pub fn relative_with(
        parent: PositionRef,
        segment: PathSegment,
        evaluator: Arc<dyn ExpressionEvaluator>,
    ) -> PositionRef {
        Arc::new(RelativePosition::new(parent, segment).with_evaluator(evaluator))
    }
}
