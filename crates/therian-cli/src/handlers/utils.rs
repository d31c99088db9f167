//! Helpers shared by command handlers

use crate::config::Config;
use crate::error::{Error, Result};
use therian_core::{Engine, PositionRef, Positions, Type, Value};
use tracing::debug;

/// Build an engine from the effective configuration
pub fn build_engine(config: &Config) -> Result<Engine> {
    let engine = Engine::builder().config(config.engine.clone()).build()?;
    debug!(
        operators = engine.registry().len(),
        caching = %config.engine.caching,
        "Engine ready"
    );
    Ok(engine)
}

/// Parse a type in the engine's notation
pub fn parse_type(text: &str) -> Result<Type> {
    text.parse::<Type>()
        .map_err(|e| Error::invalid_args(format!("'{}' is not a valid type: {}", text, e)))
}

/// Parse a JSON argument into an engine value
pub fn parse_value(text: &str) -> Result<Value> {
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| Error::invalid_args(format!("'{}' is not valid JSON: {}", text, e)))?;
    Ok(Value::from_json(&json))
}

/// A read-only position holding `value`, typed by `declared` or by the
/// value's runtime type
pub fn value_position(value: Value, declared: Option<&str>) -> Result<PositionRef> {
    match declared {
        Some(text) => {
            let ty = parse_type(text)?;
            if !ty.accepts_value(&value) {
                return Err(Error::invalid_args(format!(
                    "value {} is not an instance of {}",
                    value, ty
                )));
            }
            Ok(Positions::read_only(ty, value))
        }
        None => Ok(Positions::read_only_value(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use therian_core::PrimitiveKind;

    #[test]
    fn test_parse_type_and_value() {
        assert_eq!(
            parse_type("List<String>").unwrap(),
            Type::list(Type::String)
        );
        assert!(matches!(parse_type("List<"), Err(Error::InvalidArgs(_))));

        assert_eq!(parse_value("7").unwrap(), Value::Int(7));
        assert_eq!(parse_value("\"seven\"").unwrap(), Value::string("seven"));
        assert!(matches!(parse_value("seven"), Err(Error::InvalidArgs(_))));
    }

    #[test]
    fn test_value_position_checks_declared_type() {
        let position = value_position(Value::Int(3), Some("int")).unwrap();
        assert_eq!(position.value_type(), Type::primitive(PrimitiveKind::Int));

        let err = value_position(Value::string("x"), Some("int")).unwrap_err();
        assert!(err.to_string().contains("not an instance of int"));

        let inferred = value_position(Value::string("x"), None).unwrap();
        assert_eq!(inferred.value_type(), Type::String);
    }

    #[test]
    fn test_build_engine_honours_config() {
        let mut config = Config::default();
        config.engine.standard_operators = false;
        assert!(build_engine(&config).unwrap().registry().is_empty());
        assert!(!build_engine(&Config::default()).unwrap().registry().is_empty());
    }
}
