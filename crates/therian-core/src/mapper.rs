//! Mapper contracts
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license
//!
//! A [`MapperContract`] declares methods mapping one source value onto a new
//! bean through a table of `(from, to)` property pairs. [`Mapper::new`]
//! validates the contract and prepares one engine per method; each call to
//! [`Mapper::invoke`] instantiates the target and copies the pairs in a fresh
//! evaluation context.

use crate::el::{parse_path, PathSegment};
use crate::engine::Engine;
use crate::module::Module;
use crate::operation::{Copy, Operation};
use crate::operators::PropertyCopier;
use crate::position::Positions;
use crate::types::{BeanClass, Type};
use crate::value::Value;
use crate::{Error, Result};
use log::{debug, info};
use std::collections::HashMap;

/// One method of a mapper contract
#[derive(Debug, Clone)]
pub struct MapperMethod {
    name: String,
    parameters: Vec<Type>,
    returns: Option<Type>,
    pairs: Vec<(String, String)>,
}

impl MapperMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            returns: None,
            pairs: Vec::new(),
        }
    }

    pub fn parameter(mut self, ty: Type) -> Self {
        self.parameters.push(ty);
        self
    }

    pub fn returns(mut self, ty: Type) -> Self {
        self.returns = Some(ty);
        self
    }

    /// Copy the source's `from` path into the target's `to` path
    pub fn map(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.pairs.push((from.into(), to.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

/// A named set of mapper methods
#[derive(Debug, Clone)]
pub struct MapperContract {
    name: String,
    methods: Vec<MapperMethod>,
}

impl MapperContract {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    pub fn method(mut self, method: MapperMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> &[MapperMethod] {
        &self.methods
    }
}

struct PreparedMethod {
    parameter: Type,
    target: BeanClass,
    engine: Engine,
}

/// A validated, callable mapper contract
pub struct Mapper {
    contract: String,
    methods: HashMap<String, PreparedMethod>,
}

impl Mapper {
    /// Validate `contract` and prepare every method against `engine`
    pub fn new(engine: &Engine, contract: MapperContract) -> Result<Self> {
        let mut methods = HashMap::new();
        for method in &contract.methods {
            let prepared = prepare(engine, &contract.name, method)?;
            if methods.insert(method.name.clone(), prepared).is_some() {
                return Err(definition_error(&contract.name, &method.name, "duplicate method"));
            }
        }
        info!(
            "Prepared mapper {} with {} method(s)",
            contract.name,
            methods.len()
        );
        Ok(Self {
            contract: contract.name,
            methods,
        })
    }

    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// Map `source` to a new instance of the method's return type
    pub fn invoke(&self, method: &str, source: Value) -> Result<Value> {
        let prepared = self
            .methods
            .get(method)
            .ok_or_else(|| definition_error(&self.contract, method, "no such method"))?;
        if !prepared.parameter.accepts_value(&source) {
            return Err(Error::Coercion {
                value: source.to_string(),
                target: prepared.parameter.to_string(),
            });
        }

        let instance = prepared.target.new_instance()?;
        let mut copy = Copy::new(
            Positions::read_only(prepared.parameter.clone(), source),
            Positions::read_only(Type::Bean(prepared.target.clone()), instance.clone()),
        );
        let mut context = prepared.engine.context();
        context.eval(&mut copy)?;
        debug!("{}.{} completed {}", self.contract, method, copy.describe());
        Ok(instance)
    }
}

fn definition_error(contract: &str, method: &str, message: impl Into<String>) -> Error {
    Error::MapperDefinition {
        contract: contract.to_string(),
        method: method.to_string(),
        message: message.into(),
    }
}

fn prepare(engine: &Engine, contract: &str, method: &MapperMethod) -> Result<PreparedMethod> {
    let [parameter] = method.parameters.as_slice() else {
        return Err(definition_error(
            contract,
            &method.name,
            format!(
                "expected exactly one parameter, found {}",
                method.parameters.len()
            ),
        ));
    };
    let target = match &method.returns {
        Some(Type::Bean(class)) if class.has_default_constructor() => class.clone(),
        Some(Type::Bean(class)) => {
            return Err(definition_error(
                contract,
                &method.name,
                format!("{} has no no-argument constructor", class.name()),
            ))
        }
        Some(other) => {
            return Err(definition_error(
                contract,
                &method.name,
                format!("return type {} is not a bean", other),
            ))
        }
        None => return Err(definition_error(contract, &method.name, "missing return type")),
    };

    for (from, to) in &method.pairs {
        if let Type::Bean(source_class) = parameter {
            check_property(contract, &method.name, source_class, from)?;
        }
        check_property(contract, &method.name, &target, to)?;
    }

    let engine = if method.pairs.is_empty() {
        engine.clone()
    } else {
        let copier = PropertyCopier::new(
            contract,
            &method.name,
            parameter.clone(),
            target.clone(),
            method.pairs.clone(),
        );
        engine.with_modules([Module::builder(format!("mapper:{}.{}", contract, method.name))
            .operator(copier)
            .build()])?
    };

    Ok(PreparedMethod {
        parameter: parameter.clone(),
        target,
        engine,
    })
}

/// The first step of `path` must be a property `class` declares
fn check_property(contract: &str, method: &str, class: &BeanClass, path: &str) -> Result<()> {
    let segments = parse_path(path).map_err(|err| definition_error(contract, method, err.to_string()))?;
    match segments.first() {
        Some(PathSegment::Property(name)) if class.property(name).is_some() => Ok(()),
        Some(PathSegment::Property(name)) => Err(definition_error(
            contract,
            method,
            format!("{} has no property {}", class.name(), name),
        )),
        _ => Err(definition_error(
            contract,
            method,
            format!("{} does not start with a property", path),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveKind;

    fn person() -> BeanClass {
        BeanClass::builder("Person")
            .property("name", Type::String)
            .property("age", Type::Primitive(PrimitiveKind::Int))
            .build()
    }

    fn dto() -> BeanClass {
        BeanClass::builder("PersonDto")
            .property("full_name", Type::String)
            .property("years", Type::String)
            .build()
    }

    #[test]
    fn test_rejects_wrong_parameter_count() {
        let engine = Engine::standard().unwrap();
        let contract = MapperContract::new("PersonMapper")
            .method(MapperMethod::new("to_dto").returns(Type::bean(&dto())));
        let err = Mapper::new(&engine, contract).err().unwrap();
        assert!(matches!(err, Error::MapperDefinition { ref method, .. } if method == "to_dto"));
    }

    #[test]
    fn test_rejects_non_bean_return() {
        let engine = Engine::standard().unwrap();
        let contract = MapperContract::new("PersonMapper").method(
            MapperMethod::new("name_of")
                .parameter(Type::bean(&person()))
                .returns(Type::String),
        );
        assert!(matches!(
            Mapper::new(&engine, contract),
            Err(Error::MapperDefinition { .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_property() {
        let engine = Engine::standard().unwrap();
        let contract = MapperContract::new("PersonMapper").method(
            MapperMethod::new("to_dto")
                .parameter(Type::bean(&person()))
                .returns(Type::bean(&dto()))
                .map("nickname", "full_name"),
        );
        let err = Mapper::new(&engine, contract).err().unwrap();
        assert!(err.to_string().contains("nickname"));
    }

    #[test]
    fn test_maps_declared_pairs() {
        let engine = Engine::standard().unwrap();
        let person = person();
        let contract = MapperContract::new("PersonMapper").method(
            MapperMethod::new("to_dto")
                .parameter(Type::bean(&person))
                .returns(Type::bean(&dto()))
                .map("name", "full_name")
                .map("age", "years"),
        );
        let mapper = Mapper::new(&engine, contract).unwrap();

        let source = person.new_instance().unwrap();
        let Value::Object(object) = &source else {
            unreachable!()
        };
        object.set("name", Value::string("Ada")).unwrap();
        object.set("age", Value::Int(36)).unwrap();

        let Value::Object(mapped) = mapper.invoke("to_dto", source).unwrap() else {
            panic!("expected a bean");
        };
        assert_eq!(mapped.get("full_name"), Some(Value::string("Ada")));
        assert_eq!(mapped.get("years"), Some(Value::string("36")));
    }
}
