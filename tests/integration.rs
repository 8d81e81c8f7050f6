//! Integration tests for cellframe.
//!
//! These tests exercise the public API from outside the crate: bindings
//! between models, layout of small control trees, and the full
//! binding -> invalidation -> layout -> differential render path.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use cellframe::app::{App, AppConfig};
use cellframe::binding::{
    Bindable, BindableObject, Binding, BindingAdapter, BindingError, BindingMode, BindingResult, ListChange, ListenerId,
    PropertyChangedEvent, PropertyInfo, PropertyListener, RequiredValidator, TargetRef, Value, ValueList, ValueType,
};
use cellframe::geometry::{Offset, Region, Size, Spacing};
use cellframe::layout::LayoutContext;
use cellframe::render::{Cell, CellStyle, MemorySurface, RenderBuffer};
use cellframe::testing::{render_tree_to_string, surface_to_string};
use cellframe::tree::{ControlTree, HorizontalAlignment, LayoutProps, NodeData, NodeId, VerticalAlignment};
use cellframe::widget::Widget;
use pretty_assertions::assert_eq;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn text_model(initial: &str) -> Rc<BindableObject> {
    Rc::new(BindableObject::new().with_property("Text", ValueType::Str, Value::from(initial)))
}

fn strings(list: &ValueList) -> Vec<String> {
    list.to_vec().iter().map(ToString::to_string).collect()
}

/// Records the sizes its layout hooks receive.
#[derive(Debug, Default)]
struct Recorder {
    measured: Option<Size>,
    arranged: Option<Size>,
}

impl Widget for Recorder {
    fn widget_type(&self) -> &str {
        "Recorder"
    }

    fn measure_override(&mut self, _ctx: &mut LayoutContext<'_>, available: Size) -> Size {
        self.measured = Some(available);
        Size::ZERO
    }

    fn arrange_override(&mut self, _ctx: &mut LayoutContext<'_>, final_size: Size) -> Size {
        self.arranged = Some(final_size);
        final_size
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A label showing the "Text" property of its model.
struct Label {
    model: Rc<BindableObject>,
}

impl Label {
    fn text(&self) -> String {
        self.model.get("Text").map(|v| v.to_string()).unwrap_or_default()
    }
}

impl Widget for Label {
    fn widget_type(&self) -> &str {
        "Label"
    }

    fn measure_override(&mut self, _ctx: &mut LayoutContext<'_>, _available: Size) -> Size {
        Size::new(self.text().chars().count() as i32, 1)
    }

    fn render(&self, _size: Size, buffer: &mut RenderBuffer) {
        buffer.put_str(0, 0, &self.text(), CellStyle::new());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Binding behaviour
// ---------------------------------------------------------------------------

#[test]
fn one_time_binding_ignores_later_changes() {
    let source = text_model("first");
    let target = text_model("");
    let binding = Binding::new(TargetRef::bindable(&target), "Text", source.clone(), "Text", BindingMode::OneTime)
        .unwrap();
    binding.bind().unwrap();
    source.set("Text", Value::from("second")).unwrap();
    assert_eq!(target.get("Text"), Some(Value::from("first")));
}

#[test]
fn two_way_round_trip_through_converter() {
    let source = Rc::new(BindableObject::new().with_property("Count", ValueType::Int, Value::Int(42)));
    let target = text_model("");
    let binding =
        Binding::new(TargetRef::bindable(&target), "Text", source.clone(), "Count", BindingMode::TwoWay).unwrap();
    binding.bind().unwrap();
    assert_eq!(target.get("Text"), Some(Value::from("42")));

    target.set("Text", Value::from("7")).unwrap();
    assert_eq!(source.get("Count"), Some(Value::Int(7)));
}

#[test]
fn failure_policies_for_source_updates() {
    let results = Rc::new(RefCell::new(Vec::<BindingResult>::new()));

    for reset in [true, false] {
        results.borrow_mut().clear();
        let source = text_model("keep");
        let target = text_model("keep");
        let sink = Rc::clone(&results);
        let binding =
            Binding::builder(TargetRef::bindable(&target), "Text", source.clone(), "Text", BindingMode::TwoWay)
                .with_validator(Rc::new(RequiredValidator))
                .with_update_source_if_binding_fails(reset)
                .with_result_listener(Rc::new(move |r: &BindingResult| sink.borrow_mut().push(r.clone())))
                .build()
                .unwrap();
        binding.bind().unwrap();

        target.set("Text", Value::from("")).unwrap();
        let expected = if reset { Value::Null } else { Value::from("keep") };
        assert_eq!(source.get("Text"), Some(expected));
        assert!(results.borrow().last().is_some_and(|r| r.has_validation_error));
    }
}

#[test]
fn configuration_error_leaves_nothing_bound() {
    let source = Rc::new(BindableObject::new().with_property("Flag", ValueType::Bool, Value::Bool(true)));
    let target = Rc::new(BindableObject::new().with_property("Count", ValueType::Int, Value::Int(0)));
    let binding =
        Binding::new(TargetRef::bindable(&target), "Count", source.clone(), "Flag", BindingMode::TwoWay).unwrap();
    assert!(matches!(binding.bind(), Err(BindingError::ConverterNotFound { .. })));
    assert!(!binding.is_bound());
    assert_eq!(source.changed().listener_count(), 0);
    assert_eq!(target.changed().listener_count(), 0);
}

#[test]
fn collection_sync_is_incremental() {
    let items = ValueList::from_vec(vec![Value::from("A"), Value::from("B")]);
    let mirror = ValueList::new();
    let source = Rc::new(BindableObject::new().with_property("Items", ValueType::List, Value::List(items.clone())));
    let target = Rc::new(BindableObject::new().with_property("Items", ValueType::List, Value::List(mirror.clone())));
    let binding =
        Binding::new(TargetRef::bindable(&target), "Items", source, "Items", BindingMode::OneWay).unwrap();
    binding.bind().unwrap();

    let inserts = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&inserts);
    mirror.subscribe(Rc::new(move |change: &ListChange<Value>| log.borrow_mut().push((change.kind, change.index, change.count))));

    items.push(Value::from("C"));
    assert_eq!(strings(&mirror), vec!["A", "B", "C"]);
    items.remove(&Value::from("A"));
    assert_eq!(strings(&mirror), vec!["B", "C"]);
    assert_eq!(inserts.borrow().len(), 2);
}

// ---------------------------------------------------------------------------
// Collection rebind from inside the collection's own change handler
// ---------------------------------------------------------------------------

/// Replaces its list with a fresh empty one the first time the initial list
/// changes.
struct RebindingSource {
    items: RefCell<ValueList>,
    changed: PropertyChangedEvent,
}

impl RebindingSource {
    fn new() -> Rc<Self> {
        let initial = ValueList::new();
        let source = Rc::new(Self {
            items: RefCell::new(initial.clone()),
            changed: PropertyChangedEvent::new(),
        });
        let weak: Weak<Self> = Rc::downgrade(&source);
        initial.subscribe(Rc::new(move |_: &ListChange<Value>| {
            if let Some(source) = weak.upgrade() {
                *source.items.borrow_mut() = ValueList::new();
                source.changed.raise("SourceItems");
            }
        }));
        source
    }

    fn items(&self) -> ValueList {
        self.items.borrow().clone()
    }
}

impl Bindable for RebindingSource {
    fn property_info(&self, name: &str) -> Option<PropertyInfo> {
        (name == "SourceItems").then(|| PropertyInfo::read_write(ValueType::List))
    }

    fn get_property(&self, name: &str) -> Option<Value> {
        (name == "SourceItems").then(|| Value::List(self.items()))
    }

    fn set_property(&self, name: &str, value: Value) -> Result<(), BindingError> {
        match (name, value) {
            ("SourceItems", Value::List(list)) => {
                *self.items.borrow_mut() = list;
                self.changed.raise("SourceItems");
                Ok(())
            }
            (name, _) => Err(BindingError::UnknownProperty(name.to_owned())),
        }
    }

    fn notifier(&self) -> Option<&PropertyChangedEvent> {
        Some(&self.changed)
    }
}

#[test]
fn collection_replaced_during_its_own_change_event() {
    let source = RebindingSource::new();
    let mirror = ValueList::new();
    let target = Rc::new(BindableObject::new().with_property("Items", ValueType::List, Value::List(mirror.clone())));
    let binding =
        Binding::new(TargetRef::bindable(&target), "Items", source.clone(), "SourceItems", BindingMode::OneWay)
            .unwrap();
    binding.bind().unwrap();

    // The source swaps lists while this push is being dispatched; the
    // binding's listener on the old list must not act on it.
    let old = source.items();
    old.push(Value::from("1"));
    assert!(mirror.is_empty());

    source.items().push(Value::from("1"));
    assert_eq!(strings(&mirror), vec!["1"]);

    source.items().remove(&Value::from("1"));
    assert!(mirror.is_empty());

    old.push(Value::from("2"));
    assert!(mirror.is_empty());
}

// ---------------------------------------------------------------------------
// Adapter round trip
// ---------------------------------------------------------------------------

/// A control with a plain field and its own event, not `Bindable`.
struct TextBox {
    value: RefCell<String>,
    edited: PropertyChangedEvent,
}

impl TextBox {
    fn type_in(&self, text: &str) {
        *self.value.borrow_mut() = text.to_owned();
        self.edited.raise("S");
    }
}

struct TextBoxAdapter;

impl BindingAdapter for TextBoxAdapter {
    fn target_type(&self) -> TypeId {
        TypeId::of::<TextBox>()
    }

    fn target_type_name(&self) -> &'static str {
        "TextBox"
    }

    fn property_type(&self, property: &str) -> Option<ValueType> {
        (property == "S").then_some(ValueType::Str)
    }

    fn get_value(&self, target: &dyn Any, _property: &str) -> Option<Value> {
        target.downcast_ref::<TextBox>().map(|t| Value::from(t.value.borrow().clone()))
    }

    fn set_value(&self, target: &dyn Any, _property: &str, value: Value) -> Result<(), BindingError> {
        if let Some(t) = target.downcast_ref::<TextBox>() {
            *t.value.borrow_mut() = value.as_str().unwrap_or_default().to_owned();
        }
        Ok(())
    }

    fn subscribe(&self, target: &dyn Any, listener: PropertyListener) -> Option<ListenerId> {
        target.downcast_ref::<TextBox>().map(|t| t.edited.subscribe(listener))
    }

    fn unsubscribe(&self, target: &dyn Any, id: ListenerId) {
        if let Some(t) = target.downcast_ref::<TextBox>() {
            t.edited.unsubscribe(id);
        }
    }

    fn default_mode(&self) -> BindingMode {
        BindingMode::TwoWay
    }
}

#[test]
fn adapter_round_trip_and_unbind() {
    let settings = Rc::new(
        cellframe::binding::BindingSettings::with_defaults()
            .with_adapter(Rc::new(TextBoxAdapter))
            .unwrap(),
    );
    let source = Rc::new(BindableObject::new().with_property("Str", ValueType::Str, Value::from("")));
    let textbox = Rc::new(TextBox { value: RefCell::new(String::new()), edited: PropertyChangedEvent::new() });
    let binding = Binding::builder(TargetRef::opaque(&textbox), "S", source.clone(), "Str", BindingMode::Default)
        .with_settings(settings)
        .build()
        .unwrap();
    binding.bind().unwrap();
    assert_eq!(binding.effective_mode(), Some(BindingMode::TwoWay));

    source.set("Str", Value::from("123")).unwrap();
    assert_eq!(TextBoxAdapter.get_value(&*textbox, "S"), Some(Value::from("123")));

    textbox.type_in("456");
    assert_eq!(source.get("Str"), Some(Value::from("456")));

    binding.unbind();
    assert_eq!(textbox.edited.listener_count(), 0);
    source.set("Str", Value::from("x")).unwrap();
    assert_eq!(*textbox.value.borrow(), "456");
    textbox.type_in("y");
    assert_eq!(source.get("Str"), Some(Value::from("x")));
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// A content control holding one recording child.
fn content_with_child(content: LayoutProps, child: LayoutProps) -> (ControlTree, NodeId, NodeId) {
    let mut tree = ControlTree::new();
    let root = tree.insert(NodeData::panel().with_props(content));
    let child = tree
        .insert_child(root, NodeData::new(Recorder::default()).with_props(child))
        .unwrap();
    (tree, root, child)
}

#[test]
fn stretch_fills_the_slot() {
    let (mut tree, root, child) =
        content_with_child(LayoutProps::new().with_size(80, 80), LayoutProps::new().stretched());
    tree.update_layout(Region::new(0, 0, 80, 80));
    let layout = *tree.layout(child).unwrap();
    assert_eq!(layout.render_size, Size::new(80, 80));
    assert_eq!(layout.actual_offset, Offset::ZERO);
    assert_eq!(tree.layout(root).unwrap().render_size, Size::new(80, 80));
}

#[test]
fn centered_child_wider_than_its_parent() {
    let (mut tree, root, child) = content_with_child(
        LayoutProps::new().with_size(80, 80),
        LayoutProps::new()
            .with_size(100, 100)
            .with_margin(Spacing::new(10, 0, 20, 0))
            .with_alignment(HorizontalAlignment::Center, VerticalAlignment::Top),
    );
    tree.measure(root, Size::new(80, 80));
    tree.arrange(root, Region::new(0, 0, 80, 80));

    let layout = *tree.layout(child).unwrap();
    assert_eq!(layout.render_slot_rect, Region::new(0, 0, 80, 80));
    assert_eq!(layout.actual_offset, Offset::new(-15, 0));
    assert_eq!(layout.render_size, Size::new(100, 100));
    assert_eq!(layout.desired_size, Size::new(80, 80));
    assert_eq!(layout.layout_clip, Region::new(25, 0, 50, 80));
    assert_eq!(layout.measure_argument, Some(Size::new(80, 80)));

    let recorder = tree.widget::<Recorder>(child).unwrap();
    assert_eq!(recorder.measured, Some(Size::new(100, 100)));
    assert_eq!(recorder.arranged, Some(Size::new(100, 100)));
}

#[test]
fn explicit_height_shrinks_the_content_control() {
    let (mut tree, root, child) = content_with_child(
        LayoutProps::new(),
        LayoutProps::new()
            .with_size(100, 20)
            .with_margin(Spacing::new(10, 0, 20, 0))
            .with_alignment(HorizontalAlignment::Center, VerticalAlignment::Top),
    );
    tree.measure(root, Size::new(80, 80));
    tree.arrange(root, Region::new(0, 0, 80, 80));

    let layout = *tree.layout(child).unwrap();
    assert_eq!(layout.render_slot_rect, Region::new(0, 0, 80, 20));
    assert_eq!(layout.actual_offset, Offset::new(-15, 0));
    assert_eq!(layout.render_size, Size::new(100, 20));
    assert_eq!(layout.desired_size, Size::new(80, 20));
    assert_eq!(layout.layout_clip, Region::new(25, 0, 50, 20));

    let recorder = tree.widget::<Recorder>(child).unwrap();
    assert_eq!(recorder.measured, Some(Size::new(100, 20)));
    assert_eq!(recorder.arranged, Some(Size::new(100, 20)));
}

#[test]
fn negative_margin_and_right_center_alignment() {
    let (mut tree, root, child) = content_with_child(
        LayoutProps::new().with_size(70, 80),
        LayoutProps::new()
            .with_size(100, 20)
            .with_margin(Spacing::new(10, -10, 20, 7))
            .with_alignment(HorizontalAlignment::Right, VerticalAlignment::Center),
    );
    tree.measure(root, Size::new(1000, 1000));
    tree.arrange(root, Region::new(0, 0, 1000, 1000));

    let layout = *tree.layout(child).unwrap();
    assert_eq!(layout.render_slot_rect, Region::new(0, 0, 70, 80));
    assert_eq!(layout.actual_offset, Offset::new(-50, 21));
    assert_eq!(layout.render_size, Size::new(100, 20));
    assert_eq!(layout.desired_size, Size::new(70, 17));
    assert_eq!(layout.layout_clip, Region::new(60, -31, 40, 83));
    assert_eq!(layout.measure_argument, Some(Size::new(70, 80)));
}

#[test]
fn common_ancestor_queries() {
    let mut tree = ControlTree::new();
    let root = tree.insert(NodeData::panel());
    let branch = tree.insert_child(root, NodeData::panel()).unwrap();
    let a = tree.insert_child(branch, NodeData::panel()).unwrap();
    let b = tree.insert_child(branch, NodeData::panel()).unwrap();
    let other = tree.insert_child(root, NodeData::panel()).unwrap();
    let loose_1 = tree.insert(NodeData::panel());
    let loose_2 = tree.insert(NodeData::panel());

    assert_eq!(tree.find_common_ancestor(a, a), Some(a));
    assert_eq!(tree.find_common_ancestor(a, b), Some(branch));
    assert_eq!(tree.find_common_ancestor(a, other), Some(root));
    assert_eq!(tree.find_common_ancestor(loose_1, loose_2), None);
    assert_eq!(tree.find_common_ancestor(a, loose_1), None);
}

#[test]
fn overflowing_child_is_clipped_when_rendered() {
    let mut tree = ControlTree::new();
    let root = tree.insert(NodeData::panel().with_props(LayoutProps::new().stretched()));
    let model = text_model("clipped-text");
    tree.insert_child(
        root,
        NodeData::new(Label { model }).with_props(
            LayoutProps::new()
                .with_max_width(7)
                .with_margin(Spacing::new(1, 0, 0, 0)),
        ),
    )
    .unwrap();
    assert_eq!(render_tree_to_string(&mut tree, 10, 1).unwrap(), " clipped");
}

// ---------------------------------------------------------------------------
// End to end: binding -> invalidation -> layout -> differential render
// ---------------------------------------------------------------------------

struct Scene {
    app: App<MemorySurface>,
    label: NodeId,
    source: Rc<BindableObject>,
    _binding: Binding,
}

fn scene() -> Scene {
    let mut app = App::new(
        AppConfig::new().with_background(Cell::new('.')),
        MemorySurface::new(Size::new(8, 2)),
    );
    let root = app.tree.insert(NodeData::panel());
    let model = text_model("");
    let label = app
        .tree
        .insert_child(
            root,
            NodeData::new(Label { model: model.clone() })
                .with_props(LayoutProps::new().with_margin(Spacing::new(1, 1, 0, 0))),
        )
        .unwrap();

    let invalidator = app.tree.invalidator();
    model.changed().subscribe(Rc::new(move |_: &str| invalidator.invalidate(label)));

    let source = Rc::new(BindableObject::new().with_property("Name", ValueType::Str, Value::from("Hi")));
    let binding =
        Binding::new(TargetRef::bindable(&model), "Text", source.clone(), "Name", BindingMode::OneWay).unwrap();
    binding.bind().unwrap();

    Scene { app, label, source, _binding: binding }
}

#[test]
fn bound_label_renders_and_updates_minimally() {
    let mut scene = scene();
    let first = scene.app.run_frame().unwrap();
    assert_eq!(first.render.cells_written, 16);
    insta::assert_snapshot!(surface_to_string(scene.app.surface()), @r"
    ........
    .Hi.....
    ");

    scene.source.set("Name", Value::from("Hello")).unwrap();
    scene.app.surface_mut().reset_counters();
    let report = scene.app.run_frame().unwrap();
    assert_eq!(report.render.cells_written, 4);
    assert_eq!(scene.app.surface().flushed_regions(), &[Region::new(2, 1, 4, 1)]);
    assert_eq!(scene.app.tree.layout(scene.label).unwrap().render_size, Size::new(5, 1));
    insta::assert_snapshot!(surface_to_string(scene.app.surface()), @r"
    ........
    .Hello..
    ");

    let idle = scene.app.run_frame().unwrap();
    assert_eq!(idle.render.cells_written, 0);
    assert_eq!(idle.render.widgets_rendered, 0);
}

#[test]
fn failed_surface_recovers_on_next_frame() {
    let mut scene = scene();
    scene.app.run_frame().unwrap();
    scene.source.set("Name", Value::from("Hello")).unwrap();
    scene.app.run_frame().unwrap();

    scene.app.surface_mut().set_failing(true);
    scene.source.set("Name", Value::from("Yo")).unwrap();
    assert!(scene.app.run_frame().is_err());
    assert_eq!(scene.app.tree.layout(scene.label).unwrap().render_size, Size::new(2, 1));

    scene.app.surface_mut().set_failing(false);
    scene.app.surface_mut().reset_counters();
    let report = scene.app.run_frame().unwrap();
    assert_eq!(report.render.cells_written, 5);
    insta::assert_snapshot!(surface_to_string(scene.app.surface()), @r"
    ........
    .Yo.....
    ");
}

#[test]
fn posted_action_updates_bound_model() {
    let mut scene = scene();
    scene.app.run_frame().unwrap();

    let label = scene.label;
    let handle = scene.app.handle();
    std::thread::spawn(move || {
        handle
            .post(move |tree| {
                if let Some(l) = tree.widget::<Label>(label) {
                    l.model.set("Text", Value::from("Hey")).unwrap();
                }
            })
            .unwrap();
    })
    .join()
    .unwrap();

    let report = scene.app.run_frame().unwrap();
    assert_eq!(report.actions_run, 1);
    assert_eq!(report.render.cells_written, 2);
    insta::assert_snapshot!(surface_to_string(scene.app.surface()), @r"
    ........
    .Hey....
    ");
}
