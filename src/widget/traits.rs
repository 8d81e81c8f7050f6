//! Widget trait: layout hooks and rendering.
//!
//! A widget is the behaviour attached to one control in the tree. The layout
//! passes call [`Widget::measure_override`] and [`Widget::arrange_override`]
//! with margins, alignment and min/max already handled; the renderer calls
//! [`Widget::render`] with the final render size.

use std::any::Any;

use crate::geometry::Size;
use crate::layout::LayoutContext;
use crate::render::RenderBuffer;

// ---------------------------------------------------------------------------
// Widget trait
// ---------------------------------------------------------------------------

/// Core trait implemented by all widgets.
///
/// Object-safe: the tree stores widgets as `Box<dyn Widget>`.
pub trait Widget {
    /// Type name for diagnostics (e.g. "Panel", "Label").
    fn widget_type(&self) -> &str;

    /// Size the content needs within `available` (margins already removed).
    ///
    /// The default measures every child with `available` and returns the
    /// largest desired size, which is `(0, 0)` for a leaf.
    fn measure_override(&mut self, ctx: &mut LayoutContext<'_>, available: Size) -> Size {
        ctx.measure_children(available)
    }

    /// Place children within `final_size` and return the size actually used.
    ///
    /// The default gives every child the whole area and uses all of it.
    fn arrange_override(&mut self, ctx: &mut LayoutContext<'_>, final_size: Size) -> Size {
        ctx.arrange_children(final_size)
    }

    /// Draw own content (not children) into `buffer`, which is `size` cells.
    fn render(&self, size: Size, buffer: &mut RenderBuffer) {
        let _ = (size, buffer);
    }

    /// Downcast to `&dyn Any` for runtime type inspection.
    fn as_any(&self) -> &dyn Any;

    /// Downcast to `&mut dyn Any` for mutable runtime type inspection.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// ---------------------------------------------------------------------------
// Panel
// ---------------------------------------------------------------------------

/// A plain container: children overlap and share the whole area.
#[derive(Debug, Default, Clone, Copy)]
pub struct Panel;

impl Widget for Panel {
    fn widget_type(&self) -> &str {
        "Panel"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Offset, Region};
    use crate::render::Cell;
    use crate::tree::{ControlTree, NodeData};
    use pretty_assertions::assert_eq;

    // -----------------------------------------------------------------------
    // Test widget
    // -----------------------------------------------------------------------

    #[derive(Debug)]
    struct TestLabel {
        text: String,
    }

    impl Widget for TestLabel {
        fn widget_type(&self) -> &str {
            "Label"
        }

        fn measure_override(&mut self, _ctx: &mut LayoutContext<'_>, _available: Size) -> Size {
            Size::new(self.text.chars().count() as i32, 1)
        }

        fn render(&self, size: Size, buffer: &mut RenderBuffer) {
            let text: String = self.text.chars().take(size.width.max(0) as usize).collect();
            buffer.put_str(0, 0, &text, Default::default());
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// Stacks children vertically.
    #[derive(Debug)]
    struct Column;

    impl Widget for Column {
        fn widget_type(&self) -> &str {
            "Column"
        }

        fn measure_override(&mut self, ctx: &mut LayoutContext<'_>, available: Size) -> Size {
            let mut size = Size::ZERO;
            for child in ctx.children() {
                let desired = ctx.measure(child, available);
                size.width = size.width.max(desired.width);
                size.height += desired.height;
            }
            size
        }

        fn arrange_override(&mut self, ctx: &mut LayoutContext<'_>, final_size: Size) -> Size {
            let mut y = 0;
            for child in ctx.children() {
                let h = ctx.desired_size(child).height;
                ctx.arrange(child, Region::new(0, y, final_size.width, h));
                y += h;
            }
            final_size
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    // -----------------------------------------------------------------------
    // Widget trait
    // -----------------------------------------------------------------------

    #[test]
    fn panel_is_a_leaf_of_zero_size() {
        let mut tree = ControlTree::new();
        let root = tree.insert(NodeData::panel());
        assert_eq!(tree.measure(root, Size::new(10, 10)), Size::ZERO);
        assert_eq!(Panel.widget_type(), "Panel");
    }

    #[test]
    fn custom_measure_and_arrange() {
        let mut tree = ControlTree::new();
        let root = tree.insert(NodeData::new(Column));
        let a = tree.insert_child(root, NodeData::new(TestLabel { text: "hello".into() })).unwrap();
        let b = tree.insert_child(root, NodeData::new(TestLabel { text: "hi".into() })).unwrap();
        tree.update_layout(Region::new(0, 0, 20, 10));

        assert_eq!(tree.layout(root).unwrap().desired_size, Size::new(5, 2));
        assert_eq!(tree.layout(a).unwrap().render_slot_rect, Region::new(0, 0, 5, 1));
        assert_eq!(tree.layout(b).unwrap().actual_offset, Offset::new(0, 1));
        assert_eq!(tree.layout(b).unwrap().render_size, Size::new(2, 1));
    }

    #[test]
    fn widget_downcast_and_update() {
        let mut tree = ControlTree::new();
        let id = tree.insert(NodeData::new(TestLabel { text: "a".into() }));
        tree.update_layout(Region::new(0, 0, 10, 1));
        assert_eq!(tree.widget::<TestLabel>(id).map(|l| l.text.as_str()), Some("a"));
        assert!(tree.widget::<Panel>(id).is_none());

        tree.update_widget::<TestLabel, _>(id, |l| l.text = "abc".into()).unwrap();
        tree.update_layout(Region::new(0, 0, 10, 1));
        assert_eq!(tree.layout(id).unwrap().render_size, Size::new(3, 1));
    }

    #[test]
    fn render_writes_into_buffer() {
        let label = TestLabel { text: "hey".into() };
        let mut buffer = RenderBuffer::new(Size::new(2, 1));
        label.render(Size::new(2, 1), &mut buffer);
        assert_eq!(buffer.get(0, 0).map(|c| c.ch), Some('h'));
        assert_eq!(buffer.get(1, 0), Some(&Cell::new('e')));
    }
}
