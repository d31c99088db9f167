//! Shared test support utilities for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use therian_core::module::EvaluationListener;
use therian_core::value::ObjectRef;
use therian_core::{BeanClass, Engine, EnumType, PrimitiveKind, Profile, RegisteredOperator, Type, Value};

/// Engine with only the standard operators
pub fn standard_engine() -> Engine {
    Engine::standard().expect("standard engine builds")
}

pub fn int() -> Type {
    Type::Primitive(PrimitiveKind::Int)
}

pub fn integer() -> Type {
    Type::Boxed(PrimitiveKind::Int)
}

pub fn color() -> EnumType {
    EnumType::new("Color", ["RED", "GREEN", "BLUE"])
}

pub fn address_class() -> BeanClass {
    BeanClass::builder("Address")
        .property("street", Type::String)
        .property("city", Type::String)
        .build()
}

pub fn person_class() -> BeanClass {
    BeanClass::builder("Person")
        .property("name", Type::String)
        .property("age", int())
        .property("address", Type::bean(&address_class()))
        .property("tags", Type::list(Type::String))
        .build()
}

/// A flat view of a person, with its own address type
pub fn person_view_class() -> BeanClass {
    BeanClass::builder("PersonView")
        .property("name", Type::String)
        .property("age", Type::String)
        .property("city", Type::String)
        .read_only_property("id", Type::String)
        .build()
}

/// Instantiate `class` and set the given properties
pub fn bean(class: &BeanClass, properties: &[(&str, Value)]) -> Value {
    let instance = class.new_instance().expect("class has a no-arg constructor");
    let object = object(&instance);
    for (name, value) in properties {
        object.set(name, value.clone()).expect("property accepts value");
    }
    instance
}

pub fn object(value: &Value) -> ObjectRef {
    match value {
        Value::Object(object) => object.clone(),
        other => panic!("expected a bean, got {}", other),
    }
}

pub fn ints(values: &[i32]) -> Vec<Value> {
    values.iter().map(|v| Value::Int(*v)).collect()
}

pub fn strings(values: &[&str]) -> Vec<Value> {
    values.iter().map(Value::string).collect()
}

/// Records every listener callback as a readable line
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<String>>,
}

impl RecordingListener {
    pub fn shared() -> Arc<RecordingListener> {
        Arc::new(RecordingListener::default())
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn performed_by(&self, operator: &str) -> usize {
        let prefix = format!("performed {} ", operator);
        self.events()
            .iter()
            .filter(|e| e.starts_with(&prefix))
            .count()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl EvaluationListener for RecordingListener {
    fn support_checked(&self, operator: &RegisteredOperator, profile: &Profile, supported: bool) {
        self.record(format!("checked {} {} {}", operator.name(), profile, supported));
    }

    fn performed(&self, operator: &RegisteredOperator, profile: &Profile, successful: bool) {
        self.record(format!("performed {} {} {}", operator.name(), profile, successful));
    }

    fn shortcut_taken(&self, profile: &Profile) {
        self.record(format!("shortcut {}", profile));
    }
}
