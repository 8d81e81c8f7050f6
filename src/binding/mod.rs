//! Data binding: keeps a source property and a target property in sync.
//!
//! - [`value`]: dynamic `Value` and property types
//! - [`notify`]: the property-changed notification contract
//! - [`bindable`]: the `Bindable` capability and `BindableObject`
//! - [`observable`]: `ObservableList` and structural change events
//! - [`converter`] / [`validator`]: the conversion and validation pipeline
//! - [`adapter`]: access to targets that are not `Bindable`
//! - [`settings`]: converter and adapter registries
//! - [`engine`]: the `Binding` itself

pub mod adapter;
pub mod bindable;
pub mod converter;
pub mod engine;
pub mod error;
pub mod mode;
pub mod notify;
pub mod observable;
pub mod settings;
pub mod validator;
pub mod value;

pub use adapter::BindingAdapter;
pub use bindable::{Bindable, BindableObject, PropertyInfo, TargetRef};
pub use converter::{
    ConversionError, Converter, ReversedConverter, StringToBoolConverter, StringToFloatConverter,
    StringToIntConverter,
};
pub use engine::{Binding, BindingBuilder};
pub use error::BindingError;
pub use mode::{BindingMode, BindingResult, ResultListener, Side};
pub use notify::{ListenerId, PropertyChangedEvent, PropertyListener};
pub use observable::{ListChange, ListChangeKind, ListId, ListListener, ObservableList};
pub use settings::BindingSettings;
pub use validator::{FnValidator, RequiredValidator, ValidationError, Validator};
pub use value::{Value, ValueList, ValueType};
