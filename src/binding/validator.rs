//! Validators applied to values flowing from target to source.

use thiserror::Error;

use super::value::Value;

/// A rejected value, with a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

pub trait Validator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError>;
}

/// Rejects `Null` and the empty string.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequiredValidator;

impl Validator for RequiredValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::Null => Err(ValidationError::new("Value is required")),
            Value::Str(s) if s.is_empty() => Err(ValidationError::new("Value is required")),
            _ => Ok(()),
        }
    }
}

/// Closure-backed validator.
pub struct FnValidator<F> {
    check: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&Value) -> Result<(), ValidationError>,
{
    pub fn new(check: F) -> Self {
        Self { check }
    }
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(&Value) -> Result<(), ValidationError>,
{
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        (self.check)(value)
    }
}
