//! The bindable-object capability and a ready-made property bag.
//!
//! Bindings address properties by name. An object takes part in binding by
//! implementing [`Bindable`]; objects that cannot are wrapped in an opaque
//! [`TargetRef`] and reached through a
//! [`BindingAdapter`](super::adapter::BindingAdapter).

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::error::BindingError;
use super::notify::PropertyChangedEvent;
use super::value::{Value, ValueType};

// ---------------------------------------------------------------------------
// PropertyInfo / Bindable
// ---------------------------------------------------------------------------

/// Declared type and accessors of one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyInfo {
    pub value_type: ValueType,
    pub readable: bool,
    pub writable: bool,
}

impl PropertyInfo {
    pub const fn read_write(value_type: ValueType) -> Self {
        Self { value_type, readable: true, writable: true }
    }

    pub const fn read_only(value_type: ValueType) -> Self {
        Self { value_type, readable: true, writable: false }
    }

    pub const fn write_only(value_type: ValueType) -> Self {
        Self { value_type, readable: false, writable: true }
    }
}

/// Named, typed property access plus optional change notification.
///
/// Setters take `&self`: bindable objects are shared through `Rc` and keep
/// their state behind interior mutability.
pub trait Bindable {
    /// `None` if the object has no such property.
    fn property_info(&self, name: &str) -> Option<PropertyInfo>;

    /// Current value; `None` if the property is missing or not readable.
    fn get_property(&self, name: &str) -> Option<Value>;

    fn set_property(&self, name: &str, value: Value) -> Result<(), BindingError>;

    /// The object's change notification, if it raises one.
    fn notifier(&self) -> Option<&PropertyChangedEvent> {
        None
    }
}

// ---------------------------------------------------------------------------
// TargetRef
// ---------------------------------------------------------------------------

/// A binding target: any object, optionally with its [`Bindable`] face.
#[derive(Clone)]
pub struct TargetRef {
    object: Rc<dyn Any>,
    bindable: Option<Rc<dyn Bindable>>,
    type_name: &'static str,
}

impl fmt::Debug for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetRef")
            .field("type_name", &self.type_name)
            .field("bindable", &self.bindable.is_some())
            .finish()
    }
}

impl TargetRef {
    /// A target that implements [`Bindable`].
    pub fn bindable<T: Bindable + 'static>(object: &Rc<T>) -> Self {
        let any: Rc<dyn Any> = Rc::clone(object) as Rc<dyn Any>;
        let bindable: Rc<dyn Bindable> = Rc::clone(object) as Rc<dyn Bindable>;
        Self { object: any, bindable: Some(bindable), type_name: type_name::<T>() }
    }

    /// A target reachable only through an adapter.
    pub fn opaque<T: 'static>(object: &Rc<T>) -> Self {
        let any: Rc<dyn Any> = Rc::clone(object) as Rc<dyn Any>;
        Self { object: any, bindable: None, type_name: type_name::<T>() }
    }

    /// Runtime type of the wrapped object.
    pub fn type_id(&self) -> TypeId {
        Any::type_id(&*self.object)
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn as_any(&self) -> &dyn Any {
        &*self.object
    }

    pub fn as_bindable(&self) -> Option<&Rc<dyn Bindable>> {
        self.bindable.as_ref()
    }
}

// ---------------------------------------------------------------------------
// BindableObject
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Slot {
    info: PropertyInfo,
    value: Value,
}

/// A property bag implementing [`Bindable`] with change notification.
///
/// ```
/// use cellframe::binding::{BindableObject, Value, ValueType};
///
/// let model = BindableObject::new().with_property("Name", ValueType::Str, Value::from("a"));
/// model.set("Name", Value::from("b")).unwrap();
/// assert_eq!(model.get("Name"), Some(Value::from("b")));
/// ```
#[derive(Debug, Default)]
pub struct BindableObject {
    slots: RefCell<HashMap<String, Slot>>,
    changed: PropertyChangedEvent,
}

impl BindableObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a read/write property.
    pub fn with_property(self, name: &str, value_type: ValueType, initial: Value) -> Self {
        self.with_property_info(name, PropertyInfo::read_write(value_type), initial)
    }

    /// Declare a property with explicit accessors.
    pub fn with_property_info(self, name: &str, info: PropertyInfo, initial: Value) -> Self {
        self.slots.borrow_mut().insert(name.to_owned(), Slot { info, value: initial });
        self
    }

    /// Current value, ignoring the readable flag.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.slots.borrow().get(name).map(|s| s.value.clone())
    }

    /// Store a value through the public setter: the property must be
    /// writable and the value must fit its type.
    pub fn set(&self, name: &str, value: Value) -> Result<(), BindingError> {
        self.store(name, value, true)
    }

    /// Store a value regardless of the writable flag, as the owning model
    /// does for its computed properties.
    pub fn publish(&self, name: &str, value: Value) -> Result<(), BindingError> {
        self.store(name, value, false)
    }

    /// The change notification raised by [`set`](Self::set).
    pub fn changed(&self) -> &PropertyChangedEvent {
        &self.changed
    }

    fn store(&self, name: &str, value: Value, check_access: bool) -> Result<(), BindingError> {
        let changed = {
            let mut slots = self.slots.borrow_mut();
            let slot = slots
                .get_mut(name)
                .ok_or_else(|| BindingError::UnknownProperty(name.to_owned()))?;
            if check_access && !slot.info.writable {
                return Err(BindingError::ReadOnlyProperty { property: name.to_owned() });
            }
            if let Some(actual) = value.value_type() {
                if actual != slot.info.value_type {
                    return Err(BindingError::TypeMismatch {
                        property: name.to_owned(),
                        expected: slot.info.value_type,
                        actual,
                    });
                }
            }
            if slot.value == value {
                false
            } else {
                slot.value = value;
                true
            }
        };
        if changed {
            self.changed.raise(name);
        }
        Ok(())
    }
}

impl Bindable for BindableObject {
    fn property_info(&self, name: &str) -> Option<PropertyInfo> {
        self.slots.borrow().get(name).map(|s| s.info)
    }

    fn get_property(&self, name: &str) -> Option<Value> {
        self.slots.borrow().get(name).filter(|s| s.info.readable).map(|s| s.value.clone())
    }

    fn set_property(&self, name: &str, value: Value) -> Result<(), BindingError> {
        self.set(name, value)
    }

    fn notifier(&self) -> Option<&PropertyChangedEvent> {
        Some(&self.changed)
    }
}
