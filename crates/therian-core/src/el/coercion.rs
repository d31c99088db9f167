//! Expression-language coercion rules
//!
//! Coerces a value to a target type the way expression languages do when a
//! literal meets a typed slot: everything becomes a string, numbers convert
//! between each other (narrowing included), strings parse, null becomes the
//! zero value of scalar targets.
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use crate::types::{PrimitiveKind, Type};
use crate::value::Value;
use crate::{Error, Result};

fn coercion_error(value: &Value, target: &Type) -> Error {
    Error::Coercion {
        value: value.to_string(),
        target: target.to_string(),
    }
}

/// Coerce `value` to `target`
pub fn coerce(value: &Value, target: &Type) -> Result<Value> {
    match target {
        Type::String | Type::CharSequence => Ok(coerce_to_string(value)),
        Type::Primitive(PrimitiveKind::Boolean) | Type::Boxed(PrimitiveKind::Boolean) => {
            coerce_to_boolean(value, target)
        }
        Type::Primitive(PrimitiveKind::Char) | Type::Boxed(PrimitiveKind::Char) => {
            coerce_to_char(value, target)
        }
        Type::Primitive(kind) | Type::Boxed(kind) => coerce_to_number(value, *kind, target),
        Type::Number => coerce_to_any_number(value, target),
        Type::Enum(Some(enum_type)) => match value {
            Value::Null => Ok(Value::Null),
            Value::String(s) if s.is_empty() => Ok(Value::Null),
            Value::String(s) => enum_type
                .value_of(s)
                .ok_or_else(|| coercion_error(value, target)),
            Value::Enum(constant) if constant.ty == *enum_type => Ok(value.clone()),
            _ => Err(coercion_error(value, target)),
        },
        _ => {
            if value.is_null() || target.accepts_value(value) {
                Ok(value.clone())
            } else {
                Err(coercion_error(value, target))
            }
        }
    }
}

fn coerce_to_string(value: &Value) -> Value {
    match value {
        Value::Null => Value::string(""),
        Value::String(_) => value.clone(),
        Value::Enum(constant) => Value::string(constant.name()),
        other => Value::string(other.to_plain_string()),
    }
}

fn coerce_to_boolean(value: &Value, target: &Type) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Bool(false)),
        Value::Bool(_) => Ok(value.clone()),
        Value::String(s) => Ok(Value::Bool(s.eq_ignore_ascii_case("true"))),
        _ => Err(coercion_error(value, target)),
    }
}

fn coerce_to_char(value: &Value, target: &Type) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Char('\0')),
        Value::Char(_) => Ok(value.clone()),
        Value::String(s) => Ok(Value::Char(s.chars().next().unwrap_or('\0'))),
        Value::Bool(_) => Err(coercion_error(value, target)),
        number => number
            .as_i64()
            .and_then(|code| u32::try_from(code).ok())
            .and_then(char::from_u32)
            .map(Value::Char)
            .ok_or_else(|| coercion_error(value, target)),
    }
}

fn coerce_to_any_number(value: &Value, target: &Type) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Long(0)),
        v if v.is_number() => Ok(v.clone()),
        Value::Char(c) => Ok(Value::Int(*c as i32)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(Value::Long(0));
            }
            trimmed
                .parse::<i64>()
                .map(Value::Long)
                .or_else(|_| trimmed.parse::<f64>().map(Value::Double))
                .map_err(|_| coercion_error(value, target))
        }
        _ => Err(coercion_error(value, target)),
    }
}

fn coerce_to_number(value: &Value, kind: PrimitiveKind, target: &Type) -> Result<Value> {
    match value {
        Value::Null => Ok(kind.default_value()),
        Value::Char(c) => Ok(narrow_integral(*c as i64, kind)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(kind.default_value());
            }
            parse_number(trimmed, kind).ok_or_else(|| coercion_error(value, target))
        }
        v if v.is_number() => Ok(match v {
            Value::Float(_) | Value::Double(_) => narrow_floating(v.as_f64().unwrap_or_default(), kind),
            _ => narrow_integral(v.as_i64().unwrap_or_default(), kind),
        }),
        _ => Err(coercion_error(value, target)),
    }
}

fn parse_number(text: &str, kind: PrimitiveKind) -> Option<Value> {
    Some(match kind {
        PrimitiveKind::Byte => Value::Byte(text.parse().ok()?),
        PrimitiveKind::Short => Value::Short(text.parse().ok()?),
        PrimitiveKind::Int => Value::Int(text.parse().ok()?),
        PrimitiveKind::Long => Value::Long(text.parse().ok()?),
        PrimitiveKind::Float => Value::Float(text.parse().ok()?),
        PrimitiveKind::Double => Value::Double(text.parse().ok()?),
        PrimitiveKind::Boolean | PrimitiveKind::Char => return None,
    })
}

/// Integral source narrowed or widened to `kind`
pub(crate) fn narrow_integral(n: i64, kind: PrimitiveKind) -> Value {
    match kind {
        PrimitiveKind::Byte => Value::Byte(n as i8),
        PrimitiveKind::Short => Value::Short(n as i16),
        PrimitiveKind::Int => Value::Int(n as i32),
        PrimitiveKind::Long => Value::Long(n),
        PrimitiveKind::Float => Value::Float(n as f32),
        PrimitiveKind::Double => Value::Double(n as f64),
        PrimitiveKind::Char => Value::Char(char::from_u32(n as u32).unwrap_or('\0')),
        PrimitiveKind::Boolean => Value::Bool(n != 0),
    }
}

fn narrow_floating(n: f64, kind: PrimitiveKind) -> Value {
    match kind {
        PrimitiveKind::Float => Value::Float(n as f32),
        PrimitiveKind::Double => Value::Double(n),
        other => narrow_integral(n as i64, other),
    }
}
