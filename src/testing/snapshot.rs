//! Snapshot rendering helpers.
//!
//! Functions for turning rendered output (buffers, surfaces, whole trees)
//! into plain-text strings suitable for snapshot testing and assertions.
//! Each row becomes one line with trailing spaces trimmed; lines are joined
//! with `'\n'` and the last line has no trailing newline.

use crate::geometry::{Region, Size};
use crate::render::{MemorySurface, RenderBuffer, RenderError, Renderer};
use crate::tree::ControlTree;
use crate::widget::Widget;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Render a single widget (no layout) into a `width` x `height` area.
///
/// # Examples
///
/// ```
/// use std::any::Any;
/// use cellframe::geometry::Size;
/// use cellframe::render::{CellStyle, RenderBuffer};
/// use cellframe::testing::render_to_string;
/// use cellframe::widget::Widget;
///
/// struct Hello;
///
/// impl Widget for Hello {
///     fn widget_type(&self) -> &str { "Hello" }
///     fn render(&self, _size: Size, buffer: &mut RenderBuffer) {
///         buffer.put_str(0, 0, "Hello", CellStyle::new());
///     }
///     fn as_any(&self) -> &dyn Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn Any { self }
/// }
///
/// assert_eq!(render_to_string(&Hello, 8, 2), "Hello\n");
/// ```
pub fn render_to_string(widget: &dyn Widget, width: i32, height: i32) -> String {
    let size = Size::new(width, height);
    let mut buffer = RenderBuffer::new(size);
    widget.render(size, &mut buffer);
    buffer_to_string(&buffer)
}

/// Text of a buffer; transparent cells read as spaces.
pub fn buffer_to_string(buffer: &RenderBuffer) -> String {
    (0..buffer.height())
        .map(|y| buffer.row_text(y).trim_end().to_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text currently shown on a memory surface.
pub fn surface_to_string(surface: &MemorySurface) -> String {
    buffer_to_string(surface.buffer())
}

/// Lay out `tree` into a `width` x `height` area and render it onto a fresh
/// memory surface.
pub fn render_tree_to_string(tree: &mut ControlTree, width: i32, height: i32) -> Result<String, RenderError> {
    let mut surface = MemorySurface::new(Size::new(width, height));
    tree.update_layout(Region::new(0, 0, width, height));
    Renderer::default().render(tree, &mut surface)?;
    Ok(surface_to_string(&surface))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Cell, CellStyle, Surface};
    use crate::tree::NodeData;

    #[test]
    fn buffer_rows_are_trimmed() {
        let mut buffer = RenderBuffer::new(Size::new(5, 3));
        buffer.put_str(1, 0, "ab", CellStyle::new());
        buffer.set(4, 2, Cell::new('z'));
        assert_eq!(buffer_to_string(&buffer), " ab\n\n    z");
    }

    #[test]
    fn empty_buffer_is_empty_string() {
        assert_eq!(buffer_to_string(&RenderBuffer::new(Size::ZERO)), "");
    }

    #[test]
    fn surface_text() {
        let mut surface = MemorySurface::new(Size::new(3, 2));
        surface.write(1, 1, &Cell::new('x')).unwrap();
        assert_eq!(surface_to_string(&surface), "\n x");
    }

    #[test]
    fn empty_panel_tree_renders_blank() {
        let mut tree = ControlTree::new();
        tree.insert(NodeData::panel());
        assert_eq!(render_tree_to_string(&mut tree, 2, 2).unwrap(), "\n");
    }
}
