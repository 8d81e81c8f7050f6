//! The binding engine: one live synchronization channel between a source
//! property and a target property.
//!
//! `bind()` resolves everything up front (mode, adapter, converter,
//! accessors) without side effects, then subscribes listeners and performs
//! the initial flush. Any failure rolls the binding back to unbound.
//!
//! Listeners hold a weak reference to the binding plus the generation they
//! were installed in. Each `bind`/`unbind` bumps the generation, so a stale
//! listener still sitting in some dispatch snapshot does nothing. Collection
//! listeners additionally check that the event's origin list is the one the
//! binding currently tracks.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use super::adapter::BindingAdapter;
use super::bindable::{Bindable, PropertyInfo, TargetRef};
use super::converter::{Converter, ReversedConverter};
use super::error::BindingError;
use super::mode::{BindingMode, BindingResult, ResultListener, Side};
use super::notify::ListenerId;
use super::observable::{ListChange, ListChangeKind, ListId};
use super::settings::BindingSettings;
use super::validator::Validator;
use super::value::{Value, ValueList, ValueType};

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

/// Everything `bind()` resolved; cloned out of the state before use so no
/// borrow is held across user callbacks.
#[derive(Clone)]
struct Plan {
    mode: BindingMode,
    adapter: Option<Rc<dyn BindingAdapter>>,
    /// `first` = target type, `second` = source type.
    converter: Option<Rc<dyn Converter>>,
    source_type: ValueType,
    target_type: ValueType,
}

impl Plan {
    fn source_is_list(&self) -> bool {
        self.source_type == ValueType::List
    }

    fn target_is_list(&self) -> bool {
        self.target_type == ValueType::List
    }
}

enum TargetSubscription {
    Native(ListenerId),
    Adapter(ListenerId),
}

struct Resolved {
    plan: Plan,
    source_subscription: Option<ListenerId>,
    target_subscription: Option<TargetSubscription>,
}

struct ListLink {
    list: ValueList,
    listener: ListenerId,
}

#[derive(Default)]
struct ListLinks {
    source: Option<ListLink>,
    target: Option<ListLink>,
}

impl ListLinks {
    fn slot(&mut self, side: Side) -> &mut Option<ListLink> {
        match side {
            Side::Source => &mut self.source,
            Side::Target => &mut self.target,
        }
    }
}

/// Raises a re-entrancy flag and restores the previous value on drop.
struct FlagGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> FlagGuard<'a> {
    fn raise(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

struct BindingCore {
    target: RefCell<TargetRef>,
    target_property: String,
    source: RefCell<Rc<dyn Bindable>>,
    source_property: String,
    mode: Cell<BindingMode>,
    settings: RefCell<Rc<BindingSettings>>,
    converter: RefCell<Option<Rc<dyn Converter>>>,
    adapter: RefCell<Option<Rc<dyn BindingAdapter>>>,
    validator: RefCell<Option<Rc<dyn Validator>>>,
    result_listener: RefCell<Option<ResultListener>>,
    update_source_if_binding_fails: Cell<bool>,
    state: RefCell<Option<Resolved>>,
    generation: Cell<u64>,
    /// Set while the binding writes the source; source notifications are ignored.
    ignore_source: Cell<bool>,
    /// Set while the binding writes the target; target notifications are ignored.
    ignore_target: Cell<bool>,
    lists: RefCell<ListLinks>,
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// A binding between `source.source_property` and `target.target_property`.
///
/// Created unbound. Dropping a bound binding unbinds it.
pub struct Binding {
    core: Rc<BindingCore>,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("target", &*self.core.target.borrow())
            .field("target_property", &self.core.target_property)
            .field("source_property", &self.core.source_property)
            .field("mode", &self.core.mode.get())
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Configuration applied before a [`Binding`] exists. After `build()`,
/// changes go through the binding's `set_*` methods, which fail while bound.
pub struct BindingBuilder {
    target: TargetRef,
    target_property: String,
    source: Rc<dyn Bindable>,
    source_property: String,
    mode: BindingMode,
    settings: Option<Rc<BindingSettings>>,
    converter: Option<Rc<dyn Converter>>,
    adapter: Option<Rc<dyn BindingAdapter>>,
    validator: Option<Rc<dyn Validator>>,
    result_listener: Option<ResultListener>,
    update_source_if_binding_fails: bool,
}

impl BindingBuilder {
    /// Defaults to the thread's shared settings.
    pub fn with_settings(mut self, settings: Rc<BindingSettings>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_converter(mut self, converter: Rc<dyn Converter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn with_adapter(mut self, adapter: Rc<dyn BindingAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn with_validator(mut self, validator: Rc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_result_listener(mut self, listener: ResultListener) -> Self {
        self.result_listener = Some(listener);
        self
    }

    pub fn with_update_source_if_binding_fails(mut self, value: bool) -> Self {
        self.update_source_if_binding_fails = value;
        self
    }

    /// An unbound binding. Fails on an empty property name.
    pub fn build(self) -> Result<Binding, BindingError> {
        if self.target_property.is_empty() || self.source_property.is_empty() {
            return Err(BindingError::EmptyPropertyName);
        }
        Ok(Binding {
            core: Rc::new(BindingCore {
                target: RefCell::new(self.target),
                target_property: self.target_property,
                source: RefCell::new(self.source),
                source_property: self.source_property,
                mode: Cell::new(self.mode),
                settings: RefCell::new(self.settings.unwrap_or_else(BindingSettings::shared_default)),
                converter: RefCell::new(self.converter),
                adapter: RefCell::new(self.adapter),
                validator: RefCell::new(self.validator),
                result_listener: RefCell::new(self.result_listener),
                update_source_if_binding_fails: Cell::new(self.update_source_if_binding_fails),
                state: RefCell::new(None),
                generation: Cell::new(0),
                ignore_source: Cell::new(false),
                ignore_target: Cell::new(false),
                lists: RefCell::new(ListLinks::default()),
            }),
        })
    }
}

impl Binding {
    /// Create an unbound binding using the thread's default settings.
    pub fn new(
        target: TargetRef,
        target_property: &str,
        source: Rc<dyn Bindable>,
        source_property: &str,
        mode: BindingMode,
    ) -> Result<Self, BindingError> {
        Self::builder(target, target_property, source, source_property, mode).build()
    }

    /// Start configuring a binding; see [`BindingBuilder`].
    pub fn builder(
        target: TargetRef,
        target_property: &str,
        source: Rc<dyn Bindable>,
        source_property: &str,
        mode: BindingMode,
    ) -> BindingBuilder {
        BindingBuilder {
            target,
            target_property: target_property.to_owned(),
            source,
            source_property: source_property.to_owned(),
            mode,
            settings: None,
            converter: None,
            adapter: None,
            validator: None,
            result_listener: None,
            update_source_if_binding_fails: true,
        }
    }

    // -- setters (fail while bound) ----------------------------------------------

    pub fn set_mode(&self, mode: BindingMode) -> Result<(), BindingError> {
        self.ensure_unbound("cannot change the mode of a bound binding")?;
        self.core.mode.set(mode);
        Ok(())
    }

    pub fn set_converter(&self, converter: Option<Rc<dyn Converter>>) -> Result<(), BindingError> {
        self.ensure_unbound("cannot change the converter of a bound binding")?;
        *self.core.converter.borrow_mut() = converter;
        Ok(())
    }

    pub fn set_adapter(&self, adapter: Option<Rc<dyn BindingAdapter>>) -> Result<(), BindingError> {
        self.ensure_unbound("cannot change the adapter of a bound binding")?;
        *self.core.adapter.borrow_mut() = adapter;
        Ok(())
    }

    pub fn set_validator(&self, validator: Option<Rc<dyn Validator>>) -> Result<(), BindingError> {
        self.ensure_unbound("cannot change the validator of a bound binding")?;
        *self.core.validator.borrow_mut() = validator;
        Ok(())
    }

    pub fn set_update_source_if_binding_fails(&self, value: bool) -> Result<(), BindingError> {
        self.ensure_unbound("cannot change the failure policy of a bound binding")?;
        self.core.update_source_if_binding_fails.set(value);
        Ok(())
    }

    /// The result listener may be replaced at any time.
    pub fn set_result_listener(&self, listener: Option<ResultListener>) {
        *self.core.result_listener.borrow_mut() = listener;
    }

    fn ensure_unbound(&self, message: &'static str) -> Result<(), BindingError> {
        if self.is_bound() {
            Err(BindingError::InvalidOperation(message))
        } else {
            Ok(())
        }
    }

    // -- queries -----------------------------------------------------------------

    pub fn is_bound(&self) -> bool {
        self.core.state.borrow().is_some()
    }

    /// The requested mode.
    pub fn mode(&self) -> BindingMode {
        self.core.mode.get()
    }

    /// The resolved mode; `None` while unbound.
    pub fn effective_mode(&self) -> Option<BindingMode> {
        self.core.state.borrow().as_ref().map(|s| s.plan.mode)
    }

    pub fn target_property(&self) -> &str {
        &self.core.target_property
    }

    pub fn source_property(&self) -> &str {
        &self.core.source_property
    }

    pub fn update_source_if_binding_fails(&self) -> bool {
        self.core.update_source_if_binding_fails.get()
    }

    // -- lifecycle -----------------------------------------------------------------

    /// Resolve, subscribe and flush. Fails if already bound.
    pub fn bind(&self) -> Result<(), BindingError> {
        self.core.bind()
    }

    /// Remove every listener. No-op when unbound.
    pub fn unbind(&self) {
        self.core.unbind();
    }

    /// Push the source value to the target now.
    pub fn update_target(&self) -> Result<(), BindingError> {
        self.core.update_target()
    }

    /// Push the target value to the source now.
    pub fn update_source(&self) -> Result<(), BindingError> {
        self.core.update_source()
    }

    /// Swap the source; a bound binding is unbound and bound again.
    pub fn set_source(&self, source: Rc<dyn Bindable>) -> Result<(), BindingError> {
        let was_bound = self.is_bound();
        self.core.unbind();
        *self.core.source.borrow_mut() = source;
        if was_bound {
            self.core.bind()?;
        }
        Ok(())
    }

    /// Swap the target; a bound binding is unbound and bound again.
    pub fn set_target(&self, target: TargetRef) -> Result<(), BindingError> {
        let was_bound = self.is_bound();
        self.core.unbind();
        *self.core.target.borrow_mut() = target;
        if was_bound {
            self.core.bind()?;
        }
        Ok(())
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        self.core.unbind();
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

impl BindingCore {
    fn bind(self: &Rc<Self>) -> Result<(), BindingError> {
        if self.state.borrow().is_some() {
            return Err(BindingError::InvalidOperation("binding is already bound"));
        }
        let plan = self.resolve()?;
        let mode = plan.mode;
        *self.state.borrow_mut() =
            Some(Resolved { plan, source_subscription: None, target_subscription: None });
        self.generation.set(self.generation.get() + 1);

        if let Err(err) = self.connect().and_then(|()| self.flush(mode)) {
            debug!(error = %err, "bind failed, rolling back");
            self.unbind();
            return Err(err);
        }
        debug!(
            source_property = %self.source_property,
            target_property = %self.target_property,
            target_type = self.target.borrow().type_name(),
            mode = %mode,
            "binding bound"
        );
        Ok(())
    }

    fn resolve(&self) -> Result<Plan, BindingError> {
        let target = self.target.borrow().clone();
        let source = self.source.borrow().clone();
        let settings = self.settings.borrow().clone();

        // Adapter known before the mode is resolved.
        let mut adapter = match self.adapter.borrow().clone() {
            Some(explicit) => {
                if explicit.target_type() != target.type_id() {
                    return Err(BindingError::AdapterMismatch {
                        adapter_type: explicit.target_type_name(),
                        target_type: target.type_name(),
                    });
                }
                Some(explicit)
            }
            None if target.as_bindable().is_none() => Some(
                settings
                    .adapter_for(target.type_id())
                    .ok_or(BindingError::AdapterNotFound { target_type: target.type_name() })?,
            ),
            None => None,
        };

        let mode = match (self.mode.get(), &adapter) {
            (BindingMode::Default, Some(a)) => match a.default_mode() {
                BindingMode::Default => return Err(BindingError::InvalidDefaultMode),
                m => m,
            },
            (BindingMode::Default, None) => BindingMode::TwoWay,
            (m, _) => m,
        };

        // A bindable target without notification still needs an adapter to
        // report its changes.
        if adapter.is_none()
            && mode.is_target_to_source()
            && target.as_bindable().is_some_and(|b| b.notifier().is_none())
        {
            adapter = Some(
                settings
                    .adapter_for(target.type_id())
                    .ok_or(BindingError::AdapterNotFound { target_type: target.type_name() })?,
            );
        }

        let source_info = source.property_info(&self.source_property).ok_or_else(|| {
            BindingError::PropertyNotFound { side: Side::Source, property: self.source_property.clone() }
        })?;
        let target_info = match (&adapter, target.as_bindable()) {
            (Some(a), _) => a.property_type(&self.target_property).map(PropertyInfo::read_write),
            (None, Some(b)) => b.property_info(&self.target_property),
            (None, None) => None,
        }
        .ok_or_else(|| BindingError::PropertyNotFound {
            side: Side::Target,
            property: self.target_property.clone(),
        })?;

        let source_is_list = source_info.value_type == ValueType::List;
        let target_is_list = target_info.value_type == ValueType::List;

        // Accessors.
        if mode.is_source_to_target() {
            if !source_info.readable {
                return Err(BindingError::MissingAccessor("source getter"));
            }
            if source_is_list {
                if !target_info.readable {
                    return Err(BindingError::MissingAccessor("target getter"));
                }
                if !target_is_list {
                    return Err(BindingError::MissingAccessor("target collection"));
                }
            } else if !target_info.writable {
                return Err(BindingError::MissingAccessor("target setter"));
            }
            if mode.is_live() && source.notifier().is_none() {
                return Err(BindingError::MissingAccessor("source change notification"));
            }
        }
        if mode.is_target_to_source() {
            if !target_info.readable {
                return Err(BindingError::MissingAccessor("target getter"));
            }
            if target_is_list {
                if !source_info.readable {
                    return Err(BindingError::MissingAccessor("source getter"));
                }
                if !source_is_list {
                    return Err(BindingError::MissingAccessor("source collection"));
                }
            } else if !source_info.writable {
                return Err(BindingError::MissingAccessor("source setter"));
            }
        }

        // Converter: only scalar flows convert.
        let scalar_flow = (mode.is_source_to_target() && !source_is_list)
            || (mode.is_target_to_source() && !target_is_list);
        let (first, second) = (target_info.value_type, source_info.value_type);
        let converter = match self.converter.borrow().clone() {
            Some(explicit) if scalar_flow => {
                let pair = (explicit.first_type(), explicit.second_type());
                if pair == (first, second) {
                    Some(explicit)
                } else if pair == (second, first) {
                    Some(Rc::new(ReversedConverter::new(explicit)) as Rc<dyn Converter>)
                } else {
                    return Err(BindingError::ConverterMismatch {
                        first: pair.0,
                        second: pair.1,
                        target: first,
                        source_type: second,
                    });
                }
            }
            _ if scalar_flow && first != second => Some(
                settings.converter_for(first, second).ok_or(BindingError::ConverterNotFound { first, second })?,
            ),
            _ => None,
        };

        Ok(Plan { mode, adapter, converter, source_type: second, target_type: first })
    }

    fn plan(&self) -> Result<Plan, BindingError> {
        self.state
            .borrow()
            .as_ref()
            .map(|s| s.plan.clone())
            .ok_or(BindingError::InvalidOperation("binding is not bound"))
    }

    // -----------------------------------------------------------------------
    // Subscription
    // -----------------------------------------------------------------------

    fn connect(self: &Rc<Self>) -> Result<(), BindingError> {
        let plan = self.plan()?;
        if !plan.mode.is_live() {
            return Ok(());
        }
        let generation = self.generation.get();

        if plan.mode.is_source_to_target() {
            let source = self.source.borrow().clone();
            let notifier = source.notifier().ok_or(BindingError::MissingAccessor("source change notification"))?;
            let weak = Rc::downgrade(self);
            let property = self.source_property.clone();
            let id = notifier.subscribe(Rc::new(move |name: &str| {
                if name == property {
                    if let Some(core) = weak.upgrade() {
                        core.on_source_changed(generation);
                    }
                }
            }));
            if let Some(state) = self.state.borrow_mut().as_mut() {
                state.source_subscription = Some(id);
            }
        }

        if plan.mode.is_target_to_source() {
            let target = self.target.borrow().clone();
            let weak = Rc::downgrade(self);
            let property = self.target_property.clone();
            let listener = Rc::new(move |name: &str| {
                if name == property {
                    if let Some(core) = weak.upgrade() {
                        core.on_target_changed(generation);
                    }
                }
            });
            let subscription = match (&plan.adapter, target.as_bindable()) {
                (Some(adapter), _) => adapter.subscribe(target.as_any(), listener).map(TargetSubscription::Adapter),
                (None, Some(b)) => b.notifier().map(|n| TargetSubscription::Native(n.subscribe(listener))),
                (None, None) => None,
            }
            .ok_or(BindingError::MissingAccessor("target change notification"))?;
            if let Some(state) = self.state.borrow_mut().as_mut() {
                state.target_subscription = Some(subscription);
            }
        }
        Ok(())
    }

    fn flush(self: &Rc<Self>, mode: BindingMode) -> Result<(), BindingError> {
        if mode.is_source_to_target() {
            self.update_target()?;
        }
        if mode.is_target_to_source() {
            self.update_source()?;
        }
        Ok(())
    }

    fn unbind(&self) {
        let Some(state) = self.state.borrow_mut().take() else {
            return;
        };
        self.generation.set(self.generation.get() + 1);

        if let Some(id) = state.source_subscription {
            if let Some(notifier) = self.source.borrow().notifier() {
                notifier.unsubscribe(id);
            }
        }
        match state.target_subscription {
            Some(TargetSubscription::Adapter(id)) => {
                if let Some(adapter) = &state.plan.adapter {
                    adapter.unsubscribe(self.target.borrow().as_any(), id);
                }
            }
            Some(TargetSubscription::Native(id)) => {
                if let Some(notifier) = self.target.borrow().as_bindable().and_then(|b| b.notifier()) {
                    notifier.unsubscribe(id);
                }
            }
            None => {}
        }
        let links = std::mem::take(&mut *self.lists.borrow_mut());
        for link in [links.source, links.target].into_iter().flatten() {
            link.list.unsubscribe(link.listener);
        }
        debug!(
            source_property = %self.source_property,
            target_property = %self.target_property,
            "binding unbound"
        );
    }

    // -----------------------------------------------------------------------
    // Change handlers
    // -----------------------------------------------------------------------

    fn on_source_changed(self: &Rc<Self>, generation: u64) {
        if generation != self.generation.get() || self.ignore_source.get() {
            return;
        }
        if let Err(err) = self.update_target() {
            warn!(error = %err, property = %self.source_property, "source change not propagated");
        }
    }

    fn on_target_changed(self: &Rc<Self>, generation: u64) {
        if generation != self.generation.get() || self.ignore_target.get() {
            return;
        }
        if let Err(err) = self.update_source() {
            warn!(error = %err, property = %self.target_property, "target change not propagated");
        }
    }

    fn on_list_changed(self: &Rc<Self>, side: Side, generation: u64, change: &ListChange<Value>) {
        if generation != self.generation.get() || !self.is_tracking(side, change.origin) {
            return;
        }
        // A change on one side is mirrored onto the other side's list.
        let (own_flag, mirror_flag, mirror) = match side {
            Side::Source => (&self.ignore_source, &self.ignore_target, self.read_target()),
            Side::Target => (&self.ignore_target, &self.ignore_source, self.read_source()),
        };
        if own_flag.get() {
            return;
        }
        let mirror = match mirror {
            Ok(Value::List(list)) => list,
            Ok(Value::Null) => {
                trace!(?side, "no mirror collection, change skipped");
                return;
            }
            Ok(_) => {
                warn!(?side, "collection mirror missing, change skipped");
                return;
            }
            Err(err) => {
                warn!(?side, error = %err, "collection mirror unreadable, change skipped");
                return;
            }
        };
        if mirror.id() == change.origin {
            return;
        }
        let _guard = FlagGuard::raise(mirror_flag);
        trace!(?side, kind = ?change.kind, index = change.index, count = change.count, "mirror list change");
        apply_change(&mirror, change);
    }

    fn is_tracking(&self, side: Side, origin: ListId) -> bool {
        let lists = self.lists.borrow();
        let link = match side {
            Side::Source => &lists.source,
            Side::Target => &lists.target,
        };
        link.as_ref().is_some_and(|l| l.list.id() == origin)
    }

    /// Track `list` (or nothing) as the collection on `side`, replacing the
    /// previous subscription.
    fn relink(self: &Rc<Self>, side: Side, list: Option<&ValueList>) {
        let old = self.lists.borrow_mut().slot(side).take();
        if let Some(old) = old {
            old.list.unsubscribe(old.listener);
        }
        let Some(list) = list else {
            return;
        };
        let weak: Weak<Self> = Rc::downgrade(self);
        let generation = self.generation.get();
        let listener = list.subscribe(Rc::new(move |change: &ListChange<Value>| {
            if let Some(core) = weak.upgrade() {
                core.on_list_changed(side, generation, change);
            }
        }));
        *self.lists.borrow_mut().slot(side) = Some(ListLink { list: list.clone(), listener });
    }

    // -----------------------------------------------------------------------
    // Updates
    // -----------------------------------------------------------------------

    fn update_target(self: &Rc<Self>) -> Result<(), BindingError> {
        let plan = self.plan()?;
        if !plan.mode.is_source_to_target() {
            return Err(BindingError::InvalidMode { direction: "target", mode: plan.mode });
        }
        let _guard = FlagGuard::raise(&self.ignore_target);
        let value = self.read_source()?;

        if plan.source_is_list() {
            let source_list = value.as_list().cloned();
            match self.target_list()? {
                Some(mirror) => {
                    let items = source_list.as_ref().map(|list| list.to_vec()).unwrap_or_default();
                    mirror.clear();
                    mirror.extend(items);
                    trace!(property = %self.target_property, items = mirror.len(), "target collection refilled");
                }
                None => trace!(property = %self.target_property, "target collection is null, sync skipped"),
            }
            if plan.mode.is_live() {
                self.relink(Side::Source, source_list.as_ref());
            }
            return Ok(());
        }

        let value = match &plan.converter {
            Some(converter) => match converter.convert_back(&value) {
                Ok(v) => v,
                Err(err) => {
                    trace!(reason = %err, property = %self.target_property, "target update skipped");
                    return Ok(());
                }
            },
            None => value,
        };
        trace!(property = %self.target_property, value = %value, "update target");
        self.write_target(&plan, value)
    }

    fn update_source(self: &Rc<Self>) -> Result<(), BindingError> {
        let plan = self.plan()?;
        if !plan.mode.is_target_to_source() {
            return Err(BindingError::InvalidMode { direction: "source", mode: plan.mode });
        }
        let _guard = FlagGuard::raise(&self.ignore_source);
        let value = self.read_target_with(&plan)?;

        if plan.target_is_list() {
            let target_list = value.as_list().cloned();
            match self.source_list()? {
                Some(mirror) => {
                    let items = target_list.as_ref().map(|list| list.to_vec()).unwrap_or_default();
                    mirror.clear();
                    mirror.extend(items);
                    trace!(property = %self.source_property, items = mirror.len(), "source collection refilled");
                }
                None => trace!(property = %self.source_property, "source collection is null, sync skipped"),
            }
            if plan.mode.is_live() {
                self.relink(Side::Target, target_list.as_ref());
            }
            return Ok(());
        }

        let value = match &plan.converter {
            Some(converter) => match converter.convert(&value) {
                Ok(v) => v,
                Err(err) => return self.reject(BindingResult::conversion_error(err.reason)),
            },
            None => value,
        };
        let validator = self.validator.borrow().clone();
        if let Some(validator) = validator {
            if let Err(err) = validator.validate(&value) {
                return self.reject(BindingResult::validation_error(err.message));
            }
        }
        trace!(property = %self.source_property, value = %value, "update source");
        let source = self.source.borrow().clone();
        source.set_property(&self.source_property, value)?;
        self.report(&BindingResult::ok());
        Ok(())
    }

    /// Report a failed target -> source update and apply the failure policy.
    fn reject(&self, result: BindingResult) -> Result<(), BindingError> {
        debug!(
            property = %self.source_property,
            reason = result.message.as_deref().unwrap_or(""),
            "target value rejected"
        );
        self.report(&result);
        if self.update_source_if_binding_fails.get() {
            let source = self.source.borrow().clone();
            source.set_property(&self.source_property, Value::Null)?;
        }
        Ok(())
    }

    fn report(&self, result: &BindingResult) {
        let listener = self.result_listener.borrow().clone();
        if let Some(listener) = listener {
            listener(result);
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    fn read_source(&self) -> Result<Value, BindingError> {
        let source = self.source.borrow().clone();
        source.get_property(&self.source_property).ok_or_else(|| BindingError::PropertyNotFound {
            side: Side::Source,
            property: self.source_property.clone(),
        })
    }

    fn read_target(&self) -> Result<Value, BindingError> {
        let plan = self.plan()?;
        self.read_target_with(&plan)
    }

    fn read_target_with(&self, plan: &Plan) -> Result<Value, BindingError> {
        let target = self.target.borrow().clone();
        let value = match (&plan.adapter, target.as_bindable()) {
            (Some(adapter), _) => adapter.get_value(target.as_any(), &self.target_property),
            (None, Some(b)) => b.get_property(&self.target_property),
            (None, None) => None,
        };
        value.ok_or_else(|| BindingError::PropertyNotFound {
            side: Side::Target,
            property: self.target_property.clone(),
        })
    }

    fn write_target(&self, plan: &Plan, value: Value) -> Result<(), BindingError> {
        let target = self.target.borrow().clone();
        match (&plan.adapter, target.as_bindable()) {
            (Some(adapter), _) => adapter.set_value(target.as_any(), &self.target_property, value),
            (None, Some(b)) => b.set_property(&self.target_property, value),
            (None, None) => Err(BindingError::MissingAccessor("target setter")),
        }
    }

    /// The target's list; `None` while the property holds `Null`.
    fn target_list(&self) -> Result<Option<ValueList>, BindingError> {
        match self.read_target()? {
            Value::List(list) => Ok(Some(list)),
            Value::Null => Ok(None),
            _ => Err(BindingError::MissingAccessor("target collection")),
        }
    }

    fn source_list(&self) -> Result<Option<ValueList>, BindingError> {
        match self.read_source()? {
            Value::List(list) => Ok(Some(list)),
            Value::Null => Ok(None),
            _ => Err(BindingError::MissingAccessor("source collection")),
        }
    }
}

/// Replay one structural change onto `mirror`, index for index.
fn apply_change(mirror: &ValueList, change: &ListChange<Value>) {
    match change.kind {
        ListChangeKind::Inserted => {
            for (offset, item) in change.items.iter().enumerate() {
                let index = change.index + offset;
                if index > mirror.len() {
                    warn!(index, len = mirror.len(), "collection mirror diverged, insert skipped");
                    return;
                }
                mirror.insert(index, item.clone());
            }
        }
        ListChangeKind::Removed => {
            for _ in 0..change.count {
                if mirror.remove_at(change.index).is_none() {
                    warn!(index = change.index, len = mirror.len(), "collection mirror diverged, remove skipped");
                    return;
                }
            }
        }
        ListChangeKind::Replaced => {
            for (offset, item) in change.items.iter().enumerate() {
                if mirror.set(change.index + offset, item.clone()).is_none() {
                    warn!(index = change.index + offset, "collection mirror diverged, replace skipped");
                    return;
                }
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
