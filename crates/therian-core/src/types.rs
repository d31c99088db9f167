//! Semantic type descriptors used for operator matching
//!
//! A [`Type`] keeps the full generic structure of a slot (`List<String>`,
//! `int[]`, `Map<String, ? extends Number>`) rather than an erased class, since
//! operator dispatch and element-type inference both depend on it.
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use crate::value::{BeanInstance, ObjectRef, Value};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

/// Primitive value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
        PrimitiveKind::Char,
    ];

    /// Primitive spelling (`int`)
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Char => "char",
        }
    }

    /// Wrapper spelling (`Integer`)
    pub fn wrapper_name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::Short => "Short",
            PrimitiveKind::Int => "Integer",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Char => "Character",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveKind::Boolean | PrimitiveKind::Char)
    }

    /// Widening primitive conversion (identity included)
    pub fn widens_to(self, target: PrimitiveKind) -> bool {
        use PrimitiveKind::*;
        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short | Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => matches!(target, Double),
            Double | Boolean => false,
        }
    }

    /// The zero value a primitive slot starts with
    pub fn default_value(self) -> Value {
        match self {
            PrimitiveKind::Boolean => Value::Bool(false),
            PrimitiveKind::Byte => Value::Byte(0),
            PrimitiveKind::Short => Value::Short(0),
            PrimitiveKind::Int => Value::Int(0),
            PrimitiveKind::Long => Value::Long(0),
            PrimitiveKind::Float => Value::Float(0.0),
            PrimitiveKind::Double => Value::Double(0.0),
            PrimitiveKind::Char => Value::Char('\0'),
        }
    }

    fn from_name(name: &str) -> Option<(Self, bool)> {
        PrimitiveKind::ALL.iter().find_map(|kind| {
            if kind.name() == name {
                Some((*kind, true))
            } else if kind.wrapper_name() == name {
                Some((*kind, false))
            } else {
                None
            }
        })
    }
}

struct EnumTypeInner {
    name: String,
    constants: Vec<String>,
}

/// An enumeration type: a name plus its constants in declaration order
#[derive(Clone)]
pub struct EnumType(Arc<EnumTypeInner>);

impl EnumType {
    pub fn new<I, S>(name: impl Into<String>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EnumType(Arc::new(EnumTypeInner {
            name: name.into(),
            constants: constants.into_iter().map(Into::into).collect(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn constants(&self) -> &[String] {
        &self.0.constants
    }

    /// Constant by declaration index
    pub fn constant(&self, ordinal: usize) -> Option<Value> {
        (ordinal < self.0.constants.len()).then(|| Value::enum_constant(self.clone(), ordinal))
    }

    /// Constant by name
    pub fn value_of(&self, name: &str) -> Option<Value> {
        self.0
            .constants
            .iter()
            .position(|c| c == name)
            .map(|ordinal| Value::enum_constant(self.clone(), ordinal))
    }
}

impl PartialEq for EnumType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for EnumType {}

impl Hash for EnumType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl fmt::Debug for EnumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnumType({})", self.0.name)
    }
}

/// A bean property declaration
#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub name: String,
    pub ty: Type,
    pub read_only: bool,
}

/// Factory backing a one-argument constructor
pub type ConstructorFn = Arc<dyn Fn(&BeanClass, &Value) -> Result<Value> + Send + Sync>;

/// A one-argument constructor
#[derive(Clone)]
pub struct Constructor {
    pub parameter: Type,
    pub factory: ConstructorFn,
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constructor({})", self.parameter)
    }
}

struct BeanClassInner {
    name: String,
    superclass: Option<BeanClass>,
    interfaces: Vec<Type>,
    properties: Vec<PropertyDef>,
    constructors: Vec<Constructor>,
    is_abstract: bool,
    default_constructor: bool,
}

/// A user-defined class: properties, supertypes and constructors
///
/// Stands in for what a reflective runtime would discover on its own.
#[derive(Clone)]
pub struct BeanClass(Arc<BeanClassInner>);

impl BeanClass {
    pub fn builder(name: impl Into<String>) -> BeanClassBuilder {
        BeanClassBuilder {
            name: name.into(),
            superclass: None,
            interfaces: Vec::new(),
            properties: Vec::new(),
            constructors: Vec::new(),
            is_abstract: false,
            default_constructor: true,
        }
    }

    /// The root class every bean implicitly extends
    pub fn object() -> Self {
        BeanClass::builder("Object").build()
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn superclass(&self) -> Option<&BeanClass> {
        self.0.superclass.as_ref()
    }

    pub fn interfaces(&self) -> &[Type] {
        &self.0.interfaces
    }

    pub fn is_abstract(&self) -> bool {
        self.0.is_abstract
    }

    pub fn has_default_constructor(&self) -> bool {
        self.0.default_constructor && !self.0.is_abstract
    }

    pub fn constructors(&self) -> &[Constructor] {
        &self.0.constructors
    }

    /// All properties, inherited ones first
    pub fn properties(&self) -> Vec<PropertyDef> {
        let mut all = self
            .0
            .superclass
            .as_ref()
            .map(|s| s.properties())
            .unwrap_or_default();
        for property in &self.0.properties {
            all.retain(|p| p.name != property.name);
            all.push(property.clone());
        }
        all
    }

    pub fn property(&self, name: &str) -> Option<PropertyDef> {
        self.0
            .properties
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .or_else(|| self.0.superclass.as_ref().and_then(|s| s.property(name)))
    }

    /// Whether `self` is `other` or one of its subclasses
    pub fn is_subclass_of(&self, other: &BeanClass) -> bool {
        if self == other || other.name() == "Object" {
            return true;
        }
        self.0
            .superclass
            .as_ref()
            .is_some_and(|s| s.is_subclass_of(other))
    }

    /// Instantiate through the no-argument constructor
    pub fn new_instance(&self) -> Result<Value> {
        if !self.has_default_constructor() {
            return Err(Error::position(
                self.name(),
                "class has no accessible no-argument constructor",
            ));
        }
        let fields: HashMap<String, Value> = self
            .properties()
            .into_iter()
            .map(|p| {
                let initial = match &p.ty {
                    Type::Primitive(kind) => kind.default_value(),
                    _ => Value::Null,
                };
                (p.name, initial)
            })
            .collect();
        Ok(Value::Object(ObjectRef::new(BeanInstance::new(self.clone(), fields))))
    }
}

impl PartialEq for BeanClass {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for BeanClass {}

impl Hash for BeanClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl fmt::Debug for BeanClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BeanClass({})", self.0.name)
    }
}

/// Builder for [`BeanClass`]
pub struct BeanClassBuilder {
    name: String,
    superclass: Option<BeanClass>,
    interfaces: Vec<Type>,
    properties: Vec<PropertyDef>,
    constructors: Vec<Constructor>,
    is_abstract: bool,
    default_constructor: bool,
}

impl BeanClassBuilder {
    pub fn extends(mut self, superclass: BeanClass) -> Self {
        self.superclass = Some(superclass);
        self
    }

    /// Declare a generic supertype such as `Iterable<String>`
    pub fn implements(mut self, interface: Type) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn property(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.properties.push(PropertyDef {
            name: name.into(),
            ty,
            read_only: false,
        });
        self
    }

    pub fn read_only_property(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.properties.push(PropertyDef {
            name: name.into(),
            ty,
            read_only: true,
        });
        self
    }

    pub fn constructor<F>(mut self, parameter: Type, factory: F) -> Self
    where
        F: Fn(&BeanClass, &Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.constructors.push(Constructor {
            parameter,
            factory: Arc::new(factory),
        });
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn without_default_constructor(mut self) -> Self {
        self.default_constructor = false;
        self
    }

    pub fn build(self) -> BeanClass {
        BeanClass(Arc::new(BeanClassInner {
            name: self.name,
            superclass: self.superclass,
            interfaces: self.interfaces,
            properties: self.properties,
            constructors: self.constructors,
            is_abstract: self.is_abstract,
            default_constructor: self.default_constructor,
        }))
    }
}

/// A named type variable, optionally bounded
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeVariable {
    pub name: String,
    pub bound: Option<Box<Type>>,
}

/// Semantic type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Top type
    Object,
    Primitive(PrimitiveKind),
    Boxed(PrimitiveKind),
    Number,
    CharSequence,
    String,
    /// A specific enum, or `Enum<?>` when `None`
    Enum(Option<EnumType>),
    Array(Box<Type>),
    Iterable(Box<Type>),
    Collection(Box<Type>),
    List(Box<Type>),
    Set(Box<Type>),
    Iterator(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Bean(BeanClass),
    /// `?` or `? extends Bound`
    Wildcard(Option<Box<Type>>),
    /// Only meaningful inside operator signatures
    Variable(TypeVariable),
}

/// Generic container families used for supertype projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Iterable,
    Collection,
    List,
    Set,
    Iterator,
    Map,
}

/// Type variable bindings collected while matching a signature
#[derive(Debug, Clone, Default)]
pub struct TypeBindings {
    bound: HashMap<String, Type>,
}

impl TypeBindings {
    pub fn get(&self, name: &str) -> Option<&Type> {
        self.bound.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

impl Type {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Type::Primitive(kind)
    }

    pub fn boxed(kind: PrimitiveKind) -> Self {
        Type::Boxed(kind)
    }

    /// Unbounded wildcard, `?`
    pub fn any() -> Self {
        Type::Wildcard(None)
    }

    pub fn extends(bound: Type) -> Self {
        Type::Wildcard(Some(Box::new(bound)))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Type::Variable(TypeVariable {
            name: name.into(),
            bound: None,
        })
    }

    pub fn bounded_var(name: impl Into<String>, bound: Type) -> Self {
        Type::Variable(TypeVariable {
            name: name.into(),
            bound: Some(Box::new(bound)),
        })
    }

    pub fn array(component: Type) -> Self {
        Type::Array(Box::new(component))
    }

    pub fn iterable(element: Type) -> Self {
        Type::Iterable(Box::new(element))
    }

    pub fn collection(element: Type) -> Self {
        Type::Collection(Box::new(element))
    }

    pub fn list(element: Type) -> Self {
        Type::List(Box::new(element))
    }

    pub fn set(element: Type) -> Self {
        Type::Set(Box::new(element))
    }

    pub fn iterator(element: Type) -> Self {
        Type::Iterator(Box::new(element))
    }

    pub fn map(key: Type, value: Type) -> Self {
        Type::Map(Box::new(key), Box::new(value))
    }

    pub fn enumeration(ty: &EnumType) -> Self {
        Type::Enum(Some(ty.clone()))
    }

    pub fn bean(class: &BeanClass) -> Self {
        Type::Bean(class.clone())
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    /// Primitive kind behind a primitive or wrapper type
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Type::Primitive(kind) | Type::Boxed(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Whether no concrete instance of exactly this type can be created
    pub fn is_abstract(&self) -> bool {
        match self {
            Type::Number
            | Type::CharSequence
            | Type::Enum(_)
            | Type::Iterable(_)
            | Type::Collection(_)
            | Type::List(_)
            | Type::Set(_)
            | Type::Iterator(_)
            | Type::Map(_, _)
            | Type::Wildcard(_)
            | Type::Variable(_) => true,
            Type::Bean(class) => class.is_abstract(),
            _ => false,
        }
    }

    /// Replace every type argument with `?`
    pub fn erasure(&self) -> Type {
        match self {
            Type::Array(component) => Type::array(component.erasure()),
            Type::Iterable(_) => Type::iterable(Type::any()),
            Type::Collection(_) => Type::collection(Type::any()),
            Type::List(_) => Type::list(Type::any()),
            Type::Set(_) => Type::set(Type::any()),
            Type::Iterator(_) => Type::iterator(Type::any()),
            Type::Map(_, _) => Type::map(Type::any(), Type::any()),
            Type::Wildcard(bound) => bound.as_ref().map(|b| b.erasure()).unwrap_or(Type::Object),
            Type::Variable(var) => var.bound.as_ref().map(|b| b.erasure()).unwrap_or(Type::Object),
            other => other.clone(),
        }
    }

    /// Upper bound of a wildcard or variable, the type itself otherwise
    pub fn upper_bound(&self) -> Type {
        match self {
            Type::Wildcard(bound) => bound.as_ref().map(|b| b.upper_bound()).unwrap_or(Type::Object),
            Type::Variable(var) => var.bound.as_ref().map(|b| b.upper_bound()).unwrap_or(Type::Object),
            other => other.clone(),
        }
    }

    /// Whether a value of type `from` may be stored in a slot of this type
    pub fn is_assignable_from(&self, from: &Type) -> bool {
        self.unify(from, &mut TypeBindings::default())
    }

    /// Assignability check that binds type variables along the way
    pub fn unify(&self, from: &Type, bindings: &mut TypeBindings) -> bool {
        match (self, from) {
            (Type::Variable(var), _) => {
                if let Some(bound) = bindings.bound.get(&var.name).cloned() {
                    return match bound {
                        Type::Variable(_) => {
                            bound == *from || bound.upper_bound().is_assignable_from(&from.upper_bound())
                        }
                        _ => bound.unify(from, bindings),
                    };
                }
                if self == from {
                    return true;
                }
                let within = var
                    .bound
                    .as_ref()
                    .map_or(true, |b| b.unify(from, bindings));
                if within {
                    bindings.bound.insert(var.name.clone(), from.clone());
                }
                within
            }
            (Type::Wildcard(None), _) => true,
            (Type::Wildcard(Some(bound)), _) => bound.unify(from, bindings),
            (Type::Object, _) => true,
            (_, Type::Wildcard(_)) | (_, Type::Variable(_)) => self.unify(&from.upper_bound(), bindings),
            (a, b) if a == b => true,
            (Type::Primitive(p), Type::Primitive(q)) => q.widens_to(*p),
            (Type::Primitive(p), Type::Boxed(q)) => q.widens_to(*p),
            (Type::Boxed(p), Type::Primitive(q)) => p == q,
            (Type::Number, Type::Primitive(q)) | (Type::Number, Type::Boxed(q)) => q.is_numeric(),
            (Type::CharSequence, Type::String) => true,
            (Type::Enum(None), Type::Enum(_)) => true,
            (Type::Array(to), Type::Array(from)) => Self::unify_component(to, from, bindings),
            (Type::Iterable(e), _) => Self::unify_family(from, Family::Iterable, &[e.as_ref()], bindings),
            (Type::Collection(e), _) => Self::unify_family(from, Family::Collection, &[e.as_ref()], bindings),
            (Type::List(e), _) => Self::unify_family(from, Family::List, &[e.as_ref()], bindings),
            (Type::Set(e), _) => Self::unify_family(from, Family::Set, &[e.as_ref()], bindings),
            (Type::Iterator(e), _) => Self::unify_family(from, Family::Iterator, &[e.as_ref()], bindings),
            (Type::Map(k, v), _) => Self::unify_family(from, Family::Map, &[k.as_ref(), v.as_ref()], bindings),
            (Type::Bean(to), Type::Bean(from)) => from.is_subclass_of(to),
            _ => false,
        }
    }

    fn unify_component(to: &Type, from: &Type, bindings: &mut TypeBindings) -> bool {
        match to {
            Type::Wildcard(_) | Type::Variable(_) => to.unify(from, bindings),
            _ if to.is_primitive() || from.is_primitive() => to == from,
            _ => to.unify(from, bindings),
        }
    }

    fn unify_family(from: &Type, family: Family, args: &[&Type], bindings: &mut TypeBindings) -> bool {
        let Some(actual) = from.as_supertype(family) else {
            return false;
        };
        args.iter()
            .zip(actual.iter())
            .all(|(to, from)| Self::contains_argument(to, from, bindings))
    }

    /// Type-argument containment: invariant unless the target is a wildcard
    fn contains_argument(to: &Type, from: &Type, bindings: &mut TypeBindings) -> bool {
        match to {
            Type::Wildcard(None) => true,
            Type::Wildcard(Some(bound)) => bound.unify(&from.upper_bound(), bindings),
            Type::Variable(_) => to.unify(from, bindings),
            _ => to == from,
        }
    }

    /// View this type as a generic container family, returning its arguments
    pub fn as_supertype(&self, family: Family) -> Option<Vec<Type>> {
        let single = |e: &Type| Some(vec![e.clone()]);
        match (family, self) {
            (Family::Iterable, Type::Iterable(e))
            | (Family::Iterable, Type::Collection(e))
            | (Family::Iterable, Type::List(e))
            | (Family::Iterable, Type::Set(e))
            | (Family::Collection, Type::Collection(e))
            | (Family::Collection, Type::List(e))
            | (Family::Collection, Type::Set(e))
            | (Family::List, Type::List(e))
            | (Family::Set, Type::Set(e))
            | (Family::Iterator, Type::Iterator(e)) => single(e),
            (Family::Map, Type::Map(k, v)) => Some(vec![(**k).clone(), (**v).clone()]),
            (_, Type::Bean(class)) => {
                for interface in class.interfaces() {
                    if let Some(args) = interface.as_supertype(family) {
                        return Some(args);
                    }
                }
                class
                    .superclass()
                    .and_then(|s| Type::Bean(s.clone()).as_supertype(family))
            }
            (_, Type::Wildcard(Some(bound))) => bound.as_supertype(family),
            (_, Type::Variable(TypeVariable { bound: Some(bound), .. })) => bound.as_supertype(family),
            _ => None,
        }
    }

    /// Whether a runtime value can be stored in a slot of this type
    ///
    /// Generic arguments are not checked, the way erased runtimes behave.
    pub fn accepts_value(&self, value: &Value) -> bool {
        if value.is_null() {
            return !self.is_primitive();
        }
        if let Some(kind) = self.primitive_kind() {
            return value.primitive_kind() == Some(kind);
        }
        self.erasure().is_assignable_from(&value.runtime_type().erasure())
    }

    /// Type variables mentioned anywhere in this type, in order of appearance
    pub fn variables(&self) -> Vec<&TypeVariable> {
        let mut found = Vec::new();
        self.collect_variables(&mut found);
        found
    }

    fn collect_variables<'a>(&'a self, found: &mut Vec<&'a TypeVariable>) {
        match self {
            Type::Variable(var) => {
                found.push(var);
                if let Some(bound) = &var.bound {
                    bound.collect_variables(found);
                }
            }
            Type::Array(e)
            | Type::Iterable(e)
            | Type::Collection(e)
            | Type::List(e)
            | Type::Set(e)
            | Type::Iterator(e) => e.collect_variables(found),
            Type::Map(k, v) => {
                k.collect_variables(found);
                v.collect_variables(found);
            }
            Type::Wildcard(Some(bound)) => bound.collect_variables(found),
            _ => {}
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Object => write!(f, "Object"),
            Type::Primitive(kind) => write!(f, "{}", kind.name()),
            Type::Boxed(kind) => write!(f, "{}", kind.wrapper_name()),
            Type::Number => write!(f, "Number"),
            Type::CharSequence => write!(f, "CharSequence"),
            Type::String => write!(f, "String"),
            Type::Enum(None) => write!(f, "Enum<?>"),
            Type::Enum(Some(ty)) => write!(f, "{}", ty.name()),
            Type::Array(component) => write!(f, "{}[]", component),
            Type::Iterable(e) => write!(f, "Iterable<{}>", e),
            Type::Collection(e) => write!(f, "Collection<{}>", e),
            Type::List(e) => write!(f, "List<{}>", e),
            Type::Set(e) => write!(f, "Set<{}>", e),
            Type::Iterator(e) => write!(f, "Iterator<{}>", e),
            Type::Map(k, v) => write!(f, "Map<{}, {}>", k, v),
            Type::Bean(class) => write!(f, "{}", class.name()),
            Type::Wildcard(None) => write!(f, "?"),
            Type::Wildcard(Some(bound)) => write!(f, "? extends {}", bound),
            Type::Variable(var) => write!(f, "{}", var.name),
        }
    }
}

impl FromStr for Type {
    type Err = Error;

    /// Parse the notation produced by `Display` for built-in types
    fn from_str(s: &str) -> Result<Self> {
        let mut parser = TypeParser {
            source: s,
            chars: s.char_indices().peekable(),
        };
        let ty = parser.parse_type()?;
        parser.skip_whitespace();
        if let Some(pos) = parser.chars.peek().map(|(pos, _)| *pos) {
            return Err(parser.error(format!("unexpected input at offset {}", pos)));
        }
        Ok(ty)
    }
}

struct TypeParser<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> TypeParser<'a> {
    fn error(&self, message: impl Into<String>) -> Error {
        Error::Expression {
            expression: self.source.to_string(),
            message: message.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if matches!(self.chars.peek(), Some((_, c)) if *c == expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn identifier(&mut self) -> Result<String> {
        self.skip_whitespace();
        let mut ident = String::new();
        while let Some((_, c)) = self.chars.peek() {
            if c.is_alphanumeric() || *c == '_' || *c == '.' {
                ident.push(*c);
                self.chars.next();
            } else {
                break;
            }
        }
        if ident.is_empty() {
            Err(self.error("expected a type name"))
        } else {
            Ok(ident)
        }
    }

    fn parse_type(&mut self) -> Result<Type> {
        let mut ty = if self.eat('?') {
            self.skip_whitespace();
            let checkpoint = self.chars.clone();
            match self.identifier() {
                Ok(word) if word == "extends" => Type::extends(self.parse_type()?),
                _ => {
                    self.chars = checkpoint;
                    Type::any()
                }
            }
        } else {
            let name = self.identifier()?;
            let args = if self.eat('<') {
                let mut args = vec![self.parse_type()?];
                while self.eat(',') {
                    args.push(self.parse_type()?);
                }
                if !self.eat('>') {
                    return Err(self.error("expected '>'"));
                }
                args
            } else {
                Vec::new()
            };
            self.named(&name, args)?
        };
        while self.eat('[') {
            if !self.eat(']') {
                return Err(self.error("expected ']'"));
            }
            ty = Type::array(ty);
        }
        Ok(ty)
    }

    fn named(&self, name: &str, mut args: Vec<Type>) -> Result<Type> {
        let arity = match name {
            "Map" => 2,
            "Iterable" | "Collection" | "List" | "Set" | "Iterator" | "Enum" => 1,
            _ => 0,
        };
        if args.is_empty() {
            args = vec![Type::any(); arity];
        }
        if args.len() != arity {
            return Err(self.error(format!(
                "{} takes {} type argument(s), found {}",
                name,
                arity,
                args.len()
            )));
        }
        let mut args = args.into_iter();
        let mut next = || args.next().unwrap_or(Type::Object);
        Ok(match name {
            "Object" => Type::Object,
            "Number" => Type::Number,
            "CharSequence" => Type::CharSequence,
            "String" => Type::String,
            "Enum" => Type::Enum(None),
            "Iterable" => Type::iterable(next()),
            "Collection" => Type::collection(next()),
            "List" => Type::list(next()),
            "Set" => Type::set(next()),
            "Iterator" => Type::iterator(next()),
            "Map" => {
                let key = next();
                Type::map(key, next())
            }
            other => match PrimitiveKind::from_name(other) {
                Some((kind, true)) => Type::Primitive(kind),
                Some((kind, false)) => Type::Boxed(kind),
                None => return Err(self.error(format!("unknown type '{}'", other))),
            },
        })
    }
}
