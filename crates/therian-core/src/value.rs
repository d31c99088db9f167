//! Dynamic runtime values
//!
//! Scalars have value semantics. Arrays, collections, maps, iterators and
//! bean instances are references: clones share storage, so an operator that
//! appends to a list through one handle is observed through every other.
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use crate::types::{BeanClass, EnumType, PrimitiveKind, Type};
use crate::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Runtime value
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    String(Arc<str>),
    Enum(EnumConstant),
    Array(ArrayRef),
    Collection(CollectionRef),
    Map(MapRef),
    Iterator(IteratorRef),
    Object(ObjectRef),
}

/// An enum constant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumConstant {
    pub ty: EnumType,
    pub ordinal: usize,
}

impl EnumConstant {
    pub fn name(&self) -> &str {
        self.ty
            .constants()
            .get(self.ordinal)
            .map(String::as_str)
            .unwrap_or("<invalid>")
    }
}

/// A fixed-length array with a reified component type
#[derive(Clone)]
pub struct ArrayRef {
    component: Type,
    items: Arc<RwLock<Vec<Value>>>,
}

impl ArrayRef {
    pub fn component(&self) -> &Type {
        &self.component
    }

    pub fn len(&self) -> usize {
        read(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        read(&self.items).get(index).cloned()
    }

    /// Overwrite an existing slot; arrays never grow in place
    pub fn set(&self, index: usize, value: Value) -> Result<()> {
        if !self.component.accepts_value(&value) {
            return Err(Error::position(
                format!("{}[{}]", self.component, index),
                format!("cannot store {}", value),
            ));
        }
        let mut items = write(&self.items);
        match items.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::position(
                format!("{}[{}]", self.component, index),
                "index out of bounds",
            )),
        }
    }

    pub fn to_vec(&self) -> Vec<Value> {
        read(&self.items).clone()
    }
}

/// List or set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    List,
    Set,
}

/// Whether a container accepts structural modification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    Mutable,
    Unmodifiable,
}

/// A growable list or set
#[derive(Clone)]
pub struct CollectionRef {
    kind: CollectionKind,
    mutability: Mutability,
    items: Arc<RwLock<Vec<Value>>>,
}

impl CollectionRef {
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    pub fn is_mutable(&self) -> bool {
        self.mutability == Mutability::Mutable
    }

    pub fn len(&self) -> usize {
        read(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        read(&self.items).get(index).cloned()
    }

    pub fn contains(&self, value: &Value) -> bool {
        read(&self.items).iter().any(|item| item == value)
    }

    /// Append an element; returns whether the collection changed
    pub fn add(&self, value: Value) -> Result<bool> {
        if !self.is_mutable() {
            return Err(Error::position(self.describe(), "collection is unmodifiable"));
        }
        if self.kind == CollectionKind::Set && self.contains(&value) {
            return Ok(false);
        }
        write(&self.items).push(value);
        Ok(true)
    }

    /// Replace the element at `index` (lists only)
    pub fn set(&self, index: usize, value: Value) -> Result<Value> {
        if !self.is_mutable() || self.kind != CollectionKind::List {
            return Err(Error::position(self.describe(), "indexed writes need a mutable list"));
        }
        let mut items = write(&self.items);
        match items.get_mut(index) {
            Some(slot) => Ok(std::mem::replace(slot, value)),
            None => Err(Error::position(self.describe(), format!("index {} out of bounds", index))),
        }
    }

    pub fn to_vec(&self) -> Vec<Value> {
        read(&self.items).clone()
    }

    fn describe(&self) -> String {
        match self.kind {
            CollectionKind::List => "List".to_string(),
            CollectionKind::Set => "Set".to_string(),
        }
    }
}

/// An insertion-ordered map
#[derive(Clone)]
pub struct MapRef {
    mutability: Mutability,
    entries: Arc<RwLock<Vec<(Value, Value)>>>,
}

impl MapRef {
    pub fn is_mutable(&self) -> bool {
        self.mutability == Mutability::Mutable
    }

    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        read(&self.entries).iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        read(&self.entries)
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Insert or replace; returns the previous value
    pub fn insert(&self, key: Value, value: Value) -> Result<Option<Value>> {
        if !self.is_mutable() {
            return Err(Error::position("Map", "map is unmodifiable"));
        }
        let mut entries = write(&self.entries);
        if let Some((_, slot)) = entries.iter_mut().find(|(k, _)| *k == key) {
            return Ok(Some(std::mem::replace(slot, value)));
        }
        entries.push((key, value));
        Ok(None)
    }

    pub fn entries(&self) -> Vec<(Value, Value)> {
        read(&self.entries).clone()
    }

    pub fn values(&self) -> Vec<Value> {
        read(&self.entries).iter().map(|(_, v)| v.clone()).collect()
    }
}

type DynIterator = Box<dyn Iterator<Item = Value> + Send>;

/// A single-pass iterator; consuming it through any handle consumes it for all
#[derive(Clone)]
pub struct IteratorRef(Arc<Mutex<DynIterator>>);

impl IteratorRef {
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Value> + Send + 'static,
    {
        IteratorRef(Arc::new(Mutex::new(Box::new(iter))))
    }

    pub fn next_value(&self) -> Option<Value> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).next()
    }

    /// Consume the remaining elements
    pub fn drain(&self) -> Vec<Value> {
        let mut iter = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        iter.by_ref().collect()
    }
}

/// Property storage of a bean instance
#[derive(Debug, Clone)]
pub struct BeanInstance {
    class: BeanClass,
    fields: HashMap<String, Value>,
}

impl BeanInstance {
    pub fn new(class: BeanClass, fields: HashMap<String, Value>) -> Self {
        Self { class, fields }
    }
}

/// Shared handle to a bean instance
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<BeanInstance>>);

impl ObjectRef {
    pub fn new(instance: BeanInstance) -> Self {
        ObjectRef(Arc::new(RwLock::new(instance)))
    }

    pub fn class(&self) -> BeanClass {
        read(&self.0).class.clone()
    }

    /// Property value, or `None` when the class declares no such property
    pub fn get(&self, property: &str) -> Option<Value> {
        let instance = read(&self.0);
        instance.class.property(property)?;
        Some(instance.fields.get(property).cloned().unwrap_or(Value::Null))
    }

    /// Store a property value
    ///
    /// The value is type-checked before the instance is locked for writing,
    /// so a bean may be stored in one of its own properties.
    pub fn set(&self, property: &str, value: Value) -> Result<()> {
        let class = self.class();
        let def = class
            .property(property)
            .ok_or_else(|| Error::position(class.name(), format!("no property '{}'", property)))?;
        if !def.ty.accepts_value(&value) {
            return Err(Error::position(
                format!("{}.{}", class.name(), property),
                format!("cannot store {} in a {} property", value, def.ty),
            ));
        }
        write(&self.0).fields.insert(property.to_string(), value);
        Ok(())
    }
}

/// Identity of a value as used by position equality and cache keys
///
/// Scalars compare by value (floats by bit pattern); references compare by
/// storage identity and keep their storage alive while the key exists.
#[derive(Clone)]
pub enum ValueKey {
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(u32),
    Double(u64),
    Char(char),
    String(Arc<str>),
    Enum(String, usize),
    Reference(usize, Value),
}

impl PartialEq for ValueKey {
    fn eq(&self, other: &Self) -> bool {
        use ValueKey::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Byte(a), Byte(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Double(a), Double(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Enum(ta, a), Enum(tb, b)) => ta == tb && a == b,
            (Reference(a, _), Reference(b, _)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ValueKey {}

impl Hash for ValueKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ValueKey::Null => {}
            ValueKey::Bool(v) => v.hash(state),
            ValueKey::Byte(v) => v.hash(state),
            ValueKey::Short(v) => v.hash(state),
            ValueKey::Int(v) => v.hash(state),
            ValueKey::Long(v) => v.hash(state),
            ValueKey::Float(v) => v.hash(state),
            ValueKey::Double(v) => v.hash(state),
            ValueKey::Char(v) => v.hash(state),
            ValueKey::String(v) => v.hash(state),
            ValueKey::Enum(ty, ordinal) => {
                ty.hash(state);
                ordinal.hash(state);
            }
            ValueKey::Reference(addr, _) => addr.hash(state),
        }
    }
}

impl fmt::Debug for ValueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKey::Reference(addr, value) => write!(f, "{}@{:#x}", value.runtime_type(), addr),
            ValueKey::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other.scalar_text()),
        }
    }
}

impl ValueKey {
    fn scalar_text(&self) -> String {
        match self {
            ValueKey::Null => "null".to_string(),
            ValueKey::Bool(v) => v.to_string(),
            ValueKey::Byte(v) => v.to_string(),
            ValueKey::Short(v) => v.to_string(),
            ValueKey::Int(v) => v.to_string(),
            ValueKey::Long(v) => v.to_string(),
            ValueKey::Float(v) => f32::from_bits(*v).to_string(),
            ValueKey::Double(v) => f64::from_bits(*v).to_string(),
            ValueKey::Char(v) => format!("{:?}", v),
            ValueKey::Enum(ty, ordinal) => format!("{}#{}", ty, ordinal),
            ValueKey::String(s) => s.to_string(),
            ValueKey::Reference(addr, _) => format!("{:#x}", addr),
        }
    }
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Arc::from(s.as_ref()))
    }

    pub fn enum_constant(ty: EnumType, ordinal: usize) -> Self {
        Value::Enum(EnumConstant { ty, ordinal })
    }

    pub fn array(component: Type, items: Vec<Value>) -> Self {
        Value::Array(ArrayRef {
            component,
            items: Arc::new(RwLock::new(items)),
        })
    }

    fn collection(kind: CollectionKind, mutability: Mutability, items: Vec<Value>) -> Self {
        let items = if kind == CollectionKind::Set {
            let mut unique: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                if !unique.contains(&item) {
                    unique.push(item);
                }
            }
            unique
        } else {
            items
        };
        Value::Collection(CollectionRef {
            kind,
            mutability,
            items: Arc::new(RwLock::new(items)),
        })
    }

    /// A mutable list
    pub fn list(items: Vec<Value>) -> Self {
        Self::collection(CollectionKind::List, Mutability::Mutable, items)
    }

    pub fn unmodifiable_list(items: Vec<Value>) -> Self {
        Self::collection(CollectionKind::List, Mutability::Unmodifiable, items)
    }

    /// A mutable set; duplicates are dropped
    pub fn set(items: Vec<Value>) -> Self {
        Self::collection(CollectionKind::Set, Mutability::Mutable, items)
    }

    pub fn unmodifiable_set(items: Vec<Value>) -> Self {
        Self::collection(CollectionKind::Set, Mutability::Unmodifiable, items)
    }

    /// A new empty collection of the given kind
    pub fn empty_collection(kind: CollectionKind) -> Self {
        Self::collection(kind, Mutability::Mutable, Vec::new())
    }

    pub fn map(entries: Vec<(Value, Value)>) -> Self {
        Value::Map(MapRef {
            mutability: Mutability::Mutable,
            entries: Arc::new(RwLock::new(entries)),
        })
    }

    pub fn unmodifiable_map(entries: Vec<(Value, Value)>) -> Self {
        Value::Map(MapRef {
            mutability: Mutability::Unmodifiable,
            entries: Arc::new(RwLock::new(entries)),
        })
    }

    pub fn iterator(items: Vec<Value>) -> Self {
        Value::Iterator(IteratorRef::new(items.into_iter()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Kind of a boxed scalar
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        Some(match self {
            Value::Bool(_) => PrimitiveKind::Boolean,
            Value::Byte(_) => PrimitiveKind::Byte,
            Value::Short(_) => PrimitiveKind::Short,
            Value::Int(_) => PrimitiveKind::Int,
            Value::Long(_) => PrimitiveKind::Long,
            Value::Float(_) => PrimitiveKind::Float,
            Value::Double(_) => PrimitiveKind::Double,
            Value::Char(_) => PrimitiveKind::Char,
            _ => return None,
        })
    }

    pub fn is_number(&self) -> bool {
        self.primitive_kind().is_some_and(PrimitiveKind::is_numeric)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Byte(v) => Some(*v as f64),
            Value::Short(v) => Some(*v as f64),
            Value::Int(v) => Some(*v as f64),
            Value::Long(v) => Some(*v as f64),
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(*v as i64),
            Value::Short(v) => Some(*v as i64),
            Value::Int(v) => Some(*v as i64),
            Value::Long(v) => Some(*v),
            Value::Float(v) => Some(*v as i64),
            Value::Double(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The most specific type describing this value at runtime
    pub fn runtime_type(&self) -> Type {
        match self {
            Value::Null => Type::Object,
            Value::String(_) => Type::String,
            Value::Enum(constant) => Type::Enum(Some(constant.ty.clone())),
            Value::Array(array) => Type::array(array.component.clone()),
            Value::Collection(c) => match c.kind {
                CollectionKind::List => Type::list(Type::any()),
                CollectionKind::Set => Type::set(Type::any()),
            },
            Value::Map(_) => Type::map(Type::any(), Type::any()),
            Value::Iterator(_) => Type::iterator(Type::any()),
            Value::Object(object) => Type::Bean(object.class()),
            scalar => match scalar.primitive_kind() {
                Some(kind) => Type::Boxed(kind),
                None => Type::Object,
            },
        }
    }

    /// Identity key, see [`ValueKey`]
    pub fn key(&self) -> ValueKey {
        match self {
            Value::Null => ValueKey::Null,
            Value::Bool(v) => ValueKey::Bool(*v),
            Value::Byte(v) => ValueKey::Byte(*v),
            Value::Short(v) => ValueKey::Short(*v),
            Value::Int(v) => ValueKey::Int(*v),
            Value::Long(v) => ValueKey::Long(*v),
            Value::Float(v) => ValueKey::Float(v.to_bits()),
            Value::Double(v) => ValueKey::Double(v.to_bits()),
            Value::Char(v) => ValueKey::Char(*v),
            Value::String(s) => ValueKey::String(s.clone()),
            Value::Enum(c) => ValueKey::Enum(c.ty.name().to_string(), c.ordinal),
            Value::Array(a) => ValueKey::Reference(Arc::as_ptr(&a.items) as *const () as usize, self.clone()),
            Value::Collection(c) => ValueKey::Reference(Arc::as_ptr(&c.items) as *const () as usize, self.clone()),
            Value::Map(m) => ValueKey::Reference(Arc::as_ptr(&m.entries) as *const () as usize, self.clone()),
            Value::Iterator(i) => ValueKey::Reference(Arc::as_ptr(&i.0) as *const () as usize, self.clone()),
            Value::Object(o) => ValueKey::Reference(Arc::as_ptr(&o.0) as *const () as usize, self.clone()),
        }
    }

    /// Whether both values are the same storage (or equal scalars)
    pub fn same(&self, other: &Value) -> bool {
        self.key() == other.key()
    }

    /// Elements of an array or collection, values of a map
    pub fn elements(&self) -> Option<Vec<Value>> {
        match self {
            Value::Array(a) => Some(a.to_vec()),
            Value::Collection(c) => Some(c.to_vec()),
            Value::Map(m) => Some(m.values()),
            _ => None,
        }
    }

    /// Convert from JSON: integers become `int` or `long`, arrays become mutable lists
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i32::try_from(i).map(Value::Int).unwrap_or(Value::Long(i))
                } else {
                    Value::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::string(s),
            serde_json::Value::Array(items) => Value::list(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(fields) => Value::map(
                fields
                    .iter()
                    .map(|(k, v)| (Value::string(k), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render as JSON; iterators are rendered without being consumed
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Byte(_) | Value::Short(_) | Value::Int(_) | Value::Long(_) => {
                Json::from(self.as_i64().unwrap_or_default())
            }
            Value::Float(_) | Value::Double(_) => serde_json::Number::from_f64(self.as_f64().unwrap_or_default())
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Char(c) => Json::String(c.to_string()),
            Value::String(s) => Json::String(s.to_string()),
            Value::Enum(c) => Json::String(c.name().to_string()),
            Value::Array(_) | Value::Collection(_) => Json::Array(
                self.elements()
                    .unwrap_or_default()
                    .iter()
                    .map(Value::to_json)
                    .collect(),
            ),
            Value::Map(m) => Json::Object(
                m.entries()
                    .iter()
                    .map(|(k, v)| (k.to_plain_string(), v.to_json()))
                    .collect(),
            ),
            Value::Iterator(_) => Json::String("<iterator>".to_string()),
            Value::Object(o) => {
                let instance = read(&o.0);
                Json::Object(
                    instance
                        .class
                        .properties()
                        .iter()
                        .map(|p| {
                            let value = instance.fields.get(&p.name).cloned().unwrap_or(Value::Null);
                            (p.name.clone(), value.to_json())
                        })
                        .collect(),
                )
            }
        }
    }

    /// Display without quoting strings
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::String(s) => s.to_string(),
            Value::Char(c) => c.to_string(),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    /// Scalars by value, containers by contents, iterators and beans by identity
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => {
                Arc::ptr_eq(&a.items, &b.items) || (a.component == b.component && a.to_vec() == b.to_vec())
            }
            (Value::Collection(a), Value::Collection(b)) => {
                Arc::ptr_eq(&a.items, &b.items) || (a.kind == b.kind && a.to_vec() == b.to_vec())
            }
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(&a.entries, &b.entries) || a.entries() == b.entries(),
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            _ => self.key() == other.key(),
        }
    }
}

/// Containers nested deeper than this render as an ellipsis
const DISPLAY_DEPTH: usize = 3;

struct Nested<'a>(&'a Value, usize);

impl fmt::Display for Nested<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_nested(f, self.1)
    }
}

impl Value {
    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let join = |items: Vec<Value>| {
            items
                .iter()
                .map(|item| Nested(item, depth + 1).to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}L", v),
            Value::Float(v) => write!(f, "{:?}f", v),
            Value::Double(v) => write!(f, "{:?}", v),
            Value::Char(v) => write!(f, "{:?}", v),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Enum(c) => write!(f, "{}.{}", c.ty.name(), c.name()),
            Value::Array(a) if depth >= DISPLAY_DEPTH => write!(f, "{}[...]", a.component),
            Value::Collection(_) if depth >= DISPLAY_DEPTH => write!(f, "[...]"),
            Value::Map(_) if depth >= DISPLAY_DEPTH => write!(f, "{{...}}"),
            Value::Array(a) => write!(f, "{}[{}]", a.component, join(a.to_vec())),
            Value::Collection(c) => write!(f, "[{}]", join(c.to_vec())),
            Value::Map(m) => {
                let entries = m
                    .entries()
                    .iter()
                    .map(|(k, v)| format!("{}={}", Nested(k, depth + 1), Nested(v, depth + 1)))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{{}}}", entries)
            }
            Value::Iterator(_) => write!(f, "<iterator>"),
            Value::Object(o) => write!(f, "{}@{:x}", o.class().name(), Arc::as_ptr(&o.0) as *const () as usize),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, 0)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::string(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(Arc::from(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collections_share_storage() {
        let list = Value::list(vec![Value::Int(1)]);
        let alias = list.clone();
        if let Value::Collection(c) = &alias {
            assert!(c.add(Value::Int(2)).unwrap());
        }
        assert_eq!(list.elements().unwrap().len(), 2);
        assert!(list.same(&alias));
    }

    #[test]
    fn test_set_deduplicates() {
        let set = Value::set(vec![Value::Int(1), Value::Int(1), Value::Int(2)]);
        let Value::Collection(c) = &set else { panic!("expected a collection") };
        assert_eq!(c.len(), 2);
        assert!(!c.add(Value::Int(2)).unwrap());
    }

    #[test]
    fn test_unmodifiable_rejects_add() {
        let Value::Collection(c) = Value::unmodifiable_list(vec![]) else { panic!("expected a collection") };
        assert!(c.add(Value::Int(1)).is_err());
    }

    #[test]
    fn test_keys_use_identity_for_references() {
        let a = Value::list(vec![]);
        let b = Value::list(vec![]);
        assert_eq!(a, b);
        assert_ne!(a.key(), b.key());
        assert_eq!(Value::Double(1.5).key(), Value::Double(1.5).key());
    }

    #[test]
    fn test_iterator_is_single_pass() {
        let Value::Iterator(it) = Value::iterator(vec![Value::Int(1), Value::Int(2)]) else {
            panic!("expected an iterator")
        };
        let alias = it.clone();
        assert_eq!(it.next_value(), Some(Value::Int(1)));
        assert_eq!(alias.drain(), vec![Value::Int(2)]);
        assert!(it.next_value().is_none());
    }

    #[test]
    fn test_json_conversion() {
        let value = Value::from_json(&json!({"a": [1, 2.5, "x", null], "big": 5000000000i64}));
        assert_eq!(value.runtime_type(), Type::map(Type::any(), Type::any()));
        assert_eq!(
            value.to_json(),
            json!({"a": [1, 2.5, "x", null], "big": 5000000000i64})
        );
    }

    #[test]
    fn test_runtime_types() {
        assert_eq!(Value::Int(1).runtime_type(), Type::Boxed(PrimitiveKind::Int));
        assert_eq!(
            Value::array(Type::Primitive(PrimitiveKind::Int), vec![]).runtime_type(),
            Type::array(Type::Primitive(PrimitiveKind::Int))
        );
        assert_eq!(Value::Null.runtime_type(), Type::Object);
    }

    #[test]
    fn test_bean_stores_itself() {
        let declared = BeanClass::builder("Node").build();
        let node = BeanClass::builder("Node")
            .property("next", Type::bean(&declared))
            .build();
        let Value::Object(object) = node.new_instance().unwrap() else {
            panic!("expected a bean")
        };
        let instance = Value::Object(object.clone());

        object.set("next", instance.clone()).unwrap();
        assert!(object.get("next").unwrap().same(&instance));
        assert!(object.set("next", Value::Int(1)).is_err());
    }

    #[test]
    fn test_display_of_self_containing_list() {
        let list = Value::list(vec![Value::Int(1)]);
        let Value::Collection(c) = &list else { panic!("expected a collection") };
        c.add(list.clone()).unwrap();

        assert_eq!(list.to_string(), "[1, [1, [1, [...]]]]");
        assert_eq!(list, list.clone());
        assert_eq!(
            Value::list(vec![Value::list(vec![Value::Int(2)])]).to_string(),
            "[[2]]"
        );
    }
}
