//! Adapters give binding access to targets that are not [`Bindable`].
//!
//! An adapter serves one concrete target type and exposes a set of virtual
//! properties on it, together with a change subscription if the target has
//! some native event to hook.
//!
//! [`Bindable`]: super::bindable::Bindable

use std::any::{Any, TypeId};

use super::error::BindingError;
use super::mode::BindingMode;
use super::notify::{ListenerId, PropertyListener};
use super::value::{Value, ValueType};

pub trait BindingAdapter {
    /// The concrete target type this adapter serves.
    fn target_type(&self) -> TypeId;

    /// Human-readable name of [`target_type`](Self::target_type), for errors.
    fn target_type_name(&self) -> &'static str;

    /// Declared type of a virtual property; `None` if it does not exist.
    fn property_type(&self, property: &str) -> Option<ValueType>;

    fn get_value(&self, target: &dyn Any, property: &str) -> Option<Value>;

    fn set_value(&self, target: &dyn Any, property: &str, value: Value) -> Result<(), BindingError>;

    /// Hook the target's change notification. The listener receives virtual
    /// property names. `None` if the target cannot notify.
    fn subscribe(&self, target: &dyn Any, listener: PropertyListener) -> Option<ListenerId>;

    fn unsubscribe(&self, target: &dyn Any, id: ListenerId);

    /// Mode used by bindings that request [`BindingMode::Default`]. Must not
    /// itself be `Default`.
    fn default_mode(&self) -> BindingMode;
}
