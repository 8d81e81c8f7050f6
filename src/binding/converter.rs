//! Value converters.
//!
//! A converter links two property types. `convert` maps a `first`-typed value
//! to `second`, `convert_back` maps the other way. Registries store every
//! converter together with its [`ReversedConverter`] so lookups work for
//! either order of the pair.

use std::rc::Rc;

use thiserror::Error;

use super::value::{Value, ValueType};

/// Why a value could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ConversionError {
    pub reason: String,
}

impl ConversionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// A bidirectional conversion between two property types.
pub trait Converter {
    fn first_type(&self) -> ValueType;
    fn second_type(&self) -> ValueType;

    /// first -> second.
    fn convert(&self, value: &Value) -> Result<Value, ConversionError>;

    /// second -> first.
    fn convert_back(&self, value: &Value) -> Result<Value, ConversionError>;
}

/// Swaps the direction of another converter.
pub struct ReversedConverter {
    inner: Rc<dyn Converter>,
}

impl ReversedConverter {
    pub fn new(inner: Rc<dyn Converter>) -> Self {
        Self { inner }
    }
}

impl Converter for ReversedConverter {
    fn first_type(&self) -> ValueType {
        self.inner.second_type()
    }

    fn second_type(&self) -> ValueType {
        self.inner.first_type()
    }

    fn convert(&self, value: &Value) -> Result<Value, ConversionError> {
        self.inner.convert_back(value)
    }

    fn convert_back(&self, value: &Value) -> Result<Value, ConversionError> {
        self.inner.convert(value)
    }
}

// ---------------------------------------------------------------------------
// Built-in converters
// ---------------------------------------------------------------------------

fn expect_str(value: &Value) -> Result<&str, ConversionError> {
    match value {
        Value::Str(s) => Ok(s),
        Value::Null => Err(ConversionError::new("String is null")),
        other => Err(ConversionError::new(format!("Expected a string, got {other}"))),
    }
}

fn to_display_string(value: &Value) -> Result<Value, ConversionError> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::List(_) => Err(ConversionError::new("Lists have no string form")),
        other => Ok(Value::Str(other.to_string())),
    }
}

/// string <-> int. Parsing accepts surrounding whitespace.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringToIntConverter;

impl Converter for StringToIntConverter {
    fn first_type(&self) -> ValueType {
        ValueType::Str
    }

    fn second_type(&self) -> ValueType {
        ValueType::Int
    }

    fn convert(&self, value: &Value) -> Result<Value, ConversionError> {
        expect_str(value)?
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| ConversionError::new("Incorrect number"))
    }

    fn convert_back(&self, value: &Value) -> Result<Value, ConversionError> {
        to_display_string(value)
    }
}

/// string <-> float.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringToFloatConverter;

impl Converter for StringToFloatConverter {
    fn first_type(&self) -> ValueType {
        ValueType::Str
    }

    fn second_type(&self) -> ValueType {
        ValueType::Float
    }

    fn convert(&self, value: &Value) -> Result<Value, ConversionError> {
        expect_str(value)?
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| ConversionError::new("Incorrect number"))
    }

    fn convert_back(&self, value: &Value) -> Result<Value, ConversionError> {
        to_display_string(value)
    }
}

/// string <-> bool. Accepts `true`/`false` in any case.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringToBoolConverter;

impl Converter for StringToBoolConverter {
    fn first_type(&self) -> ValueType {
        ValueType::Str
    }

    fn second_type(&self) -> ValueType {
        ValueType::Bool
    }

    fn convert(&self, value: &Value) -> Result<Value, ConversionError> {
        let s = expect_str(value)?.trim();
        if s.eq_ignore_ascii_case("true") {
            Ok(Value::Bool(true))
        } else if s.eq_ignore_ascii_case("false") {
            Ok(Value::Bool(false))
        } else {
            Err(ConversionError::new("Incorrect boolean"))
        }
    }

    fn convert_back(&self, value: &Value) -> Result<Value, ConversionError> {
        to_display_string(value)
    }
}
