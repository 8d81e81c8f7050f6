//! Binding error taxonomy.

use thiserror::Error;

use super::mode::{BindingMode, Side};
use super::value::ValueType;

/// Errors raised while configuring, binding or explicitly updating a binding.
///
/// Per-update conversion and validation failures are not errors: they are
/// reported through [`BindingResult`](super::mode::BindingResult).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("property name must not be empty")]
    EmptyPropertyName,

    #[error("{side} has no property `{property}`")]
    PropertyNotFound { side: Side, property: String },

    #[error("no property `{0}`")]
    UnknownProperty(String),

    #[error("no adapter registered for target type `{target_type}`")]
    AdapterNotFound { target_type: &'static str },

    #[error("adapter is for `{adapter_type}` but the target is `{target_type}`")]
    AdapterMismatch { adapter_type: &'static str, target_type: &'static str },

    #[error("an adapter for `{target_type}` is already registered")]
    DuplicateAdapter { target_type: &'static str },

    #[error("no converter between {first} and {second}")]
    ConverterNotFound { first: ValueType, second: ValueType },

    #[error("a converter between {first} and {second} is already registered")]
    DuplicateConverter { first: ValueType, second: ValueType },

    #[error("converter between {0} and {0} has no resolvable direction; assign it to the binding explicitly")]
    AmbiguousConverter(ValueType),

    #[error("converter {first} <-> {second} does not fit target {target} / source {source_type}")]
    ConverterMismatch { first: ValueType, second: ValueType, target: ValueType, source_type: ValueType },

    #[error("missing accessor: {0}")]
    MissingAccessor(&'static str),

    #[error("adapter default mode must not be Default")]
    InvalidDefaultMode,

    #[error("{direction} update is not allowed in {mode} mode")]
    InvalidMode { direction: &'static str, mode: BindingMode },

    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    #[error("property `{property}` expects {expected}, got {actual}")]
    TypeMismatch { property: String, expected: ValueType, actual: ValueType },

    #[error("property `{property}` is read-only")]
    ReadOnlyProperty { property: String },
}

impl BindingError {
    /// Whether this is a configuration problem detected at bind time.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BindingError::PropertyNotFound { .. }
                | BindingError::AdapterNotFound { .. }
                | BindingError::AdapterMismatch { .. }
                | BindingError::ConverterNotFound { .. }
                | BindingError::AmbiguousConverter(_)
                | BindingError::ConverterMismatch { .. }
                | BindingError::MissingAccessor(_)
                | BindingError::InvalidDefaultMode
        )
    }
}
