//! Converter and adapter registries.
//!
//! Bindings take their registries from an explicitly constructed
//! [`BindingSettings`]. A per-thread default carrying the built-in converters
//! is available through [`BindingSettings::shared_default`].

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::adapter::BindingAdapter;
use super::converter::{
    Converter, ReversedConverter, StringToBoolConverter, StringToFloatConverter, StringToIntConverter,
};
use super::error::BindingError;
use super::value::ValueType;

#[derive(Default)]
pub struct BindingSettings {
    converters: HashMap<(ValueType, ValueType), Rc<dyn Converter>>,
    adapters: HashMap<TypeId, Rc<dyn BindingAdapter>>,
}

impl fmt::Debug for BindingSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingSettings")
            .field("converters", &self.converters.keys().collect::<Vec<_>>())
            .field("adapters", &self.adapters.len())
            .finish()
    }
}

thread_local! {
    static SHARED_DEFAULT: Rc<BindingSettings> = Rc::new(BindingSettings::with_defaults());
}

impl BindingSettings {
    /// Empty registries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registries pre-populated with the built-in converters
    /// (string <-> int, float, bool).
    pub fn with_defaults() -> Self {
        let mut settings = Self::new();
        let builtins: [Rc<dyn Converter>; 3] =
            [Rc::new(StringToIntConverter), Rc::new(StringToFloatConverter), Rc::new(StringToBoolConverter)];
        let registered = builtins.into_iter().try_for_each(|converter| settings.add_converter(converter));
        debug_assert!(registered.is_ok(), "{registered:?}");
        settings
    }

    /// The default settings of the current (UI) thread.
    pub fn shared_default() -> Rc<BindingSettings> {
        SHARED_DEFAULT.with(Rc::clone)
    }

    /// Register a converter and its reverse.
    pub fn add_converter(&mut self, converter: Rc<dyn Converter>) -> Result<(), BindingError> {
        let first = converter.first_type();
        let second = converter.second_type();
        if first == second {
            return Err(BindingError::AmbiguousConverter(first));
        }
        if self.converters.contains_key(&(first, second)) || self.converters.contains_key(&(second, first)) {
            return Err(BindingError::DuplicateConverter { first, second });
        }
        let reversed: Rc<dyn Converter> = Rc::new(ReversedConverter::new(Rc::clone(&converter)));
        self.converters.insert((first, second), converter);
        self.converters.insert((second, first), reversed);
        Ok(())
    }

    /// Builder form of [`add_converter`](Self::add_converter).
    pub fn with_converter(mut self, converter: Rc<dyn Converter>) -> Result<Self, BindingError> {
        self.add_converter(converter)?;
        Ok(self)
    }

    /// A converter whose `convert` maps `first` to `second`.
    pub fn converter_for(&self, first: ValueType, second: ValueType) -> Option<Rc<dyn Converter>> {
        self.converters.get(&(first, second)).cloned()
    }

    pub fn add_adapter(&mut self, adapter: Rc<dyn BindingAdapter>) -> Result<(), BindingError> {
        let key = adapter.target_type();
        if self.adapters.contains_key(&key) {
            return Err(BindingError::DuplicateAdapter { target_type: adapter.target_type_name() });
        }
        self.adapters.insert(key, adapter);
        Ok(())
    }

    /// Builder form of [`add_adapter`](Self::add_adapter).
    pub fn with_adapter(mut self, adapter: Rc<dyn BindingAdapter>) -> Result<Self, BindingError> {
        self.add_adapter(adapter)?;
        Ok(self)
    }

    pub fn adapter_for(&self, target_type: TypeId) -> Option<Rc<dyn BindingAdapter>> {
        self.adapters.get(&target_type).cloned()
    }
}
