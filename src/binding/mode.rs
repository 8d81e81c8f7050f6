//! Binding modes and per-update results.

use std::fmt;
use std::rc::Rc;

/// Direction(s) in which a binding moves data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BindingMode {
    /// Target is set from the source once, at bind time.
    OneTime,
    /// Source changes flow to the target.
    OneWay,
    /// Target changes flow to the source.
    OneWayToSource,
    /// Both directions.
    TwoWay,
    /// Resolved at bind time: the adapter's default mode, else `TwoWay`.
    #[default]
    Default,
}

impl BindingMode {
    /// Whether the (resolved) mode moves data from source to target.
    pub const fn is_source_to_target(self) -> bool {
        matches!(self, BindingMode::OneTime | BindingMode::OneWay | BindingMode::TwoWay)
    }

    /// Whether the (resolved) mode moves data from target to source.
    pub const fn is_target_to_source(self) -> bool {
        matches!(self, BindingMode::OneWayToSource | BindingMode::TwoWay)
    }

    /// Whether the mode keeps listening after the initial flush.
    pub const fn is_live(self) -> bool {
        !matches!(self, BindingMode::OneTime)
    }
}

impl fmt::Display for BindingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BindingMode::OneTime => "OneTime",
            BindingMode::OneWay => "OneWay",
            BindingMode::OneWayToSource => "OneWayToSource",
            BindingMode::TwoWay => "TwoWay",
            BindingMode::Default => "Default",
        })
    }
}

/// Which endpoint of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Source,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Source => "source",
            Side::Target => "target",
        })
    }
}

/// Outcome of one target -> source update, reported to the result listener.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingResult {
    pub has_conversion_error: bool,
    pub has_validation_error: bool,
    pub message: Option<String>,
}

impl BindingResult {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn conversion_error(message: impl Into<String>) -> Self {
        Self { has_conversion_error: true, has_validation_error: false, message: Some(message.into()) }
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self { has_conversion_error: false, has_validation_error: true, message: Some(message.into()) }
    }

    pub fn has_error(&self) -> bool {
        self.has_conversion_error || self.has_validation_error
    }
}

/// Receives a [`BindingResult`] after every target -> source update.
pub type ResultListener = Rc<dyn Fn(&BindingResult)>;
