//! Measure and arrange passes.
//!
//! Measure asks every control how much space it wants given an upper bound;
//! arrange hands each control its slot and records where and how big it ends
//! up. Both passes cache their result and skip controls whose layout is
//! still valid for the same input.

use tracing::{debug_span, trace};

use super::constraints::MinMax;
use super::info::{LayoutInfo, LayoutValidity};
use crate::geometry::{add_dim, sub_dim, Offset, Region, Size};
use crate::tree::{ControlTree, HorizontalAlignment, LayoutProps, NodeId, VerticalAlignment, Visibility};

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Offset of an `ink`-sized box inside a `client`-sized area.
///
/// `Stretch` behaves like `Center` when the ink fits and like `Left`/`Top`
/// when it does not. Centering truncates toward zero.
pub fn alignment_offset(
    horizontal: HorizontalAlignment,
    vertical: VerticalAlignment,
    client: Size,
    ink: Size,
) -> Offset {
    let x = match horizontal {
        HorizontalAlignment::Stretch if ink.width > client.width => 0,
        HorizontalAlignment::Center | HorizontalAlignment::Stretch => (client.width - ink.width) / 2,
        HorizontalAlignment::Right => client.width - ink.width,
        HorizontalAlignment::Left => 0,
    };
    let y = match vertical {
        VerticalAlignment::Stretch if ink.height > client.height => 0,
        VerticalAlignment::Center | VerticalAlignment::Stretch => (client.height - ink.height) / 2,
        VerticalAlignment::Bottom => client.height - ink.height,
        VerticalAlignment::Top => 0,
    };
    Offset::new(x, y)
}

/// Restrict `clip` to `(0, 0, min(render, max))` when an explicit maximum is set.
pub fn apply_max_constraints(props: &LayoutProps, render_size: Size, clip: Region) -> Region {
    if props.max_width.is_none() && props.max_height.is_none() {
        return clip;
    }
    let width = props.max_width.map_or(render_size.width, |m| m.min(render_size.width));
    let height = props.max_height.map_or(render_size.height, |m| m.min(render_size.height));
    clip.intersection(Region::new(0, 0, width, height))
}

/// The visible part of a control in its own coordinates.
///
/// When the (max-clipped) ink overflows the slot minus margins, the clip is
/// the slot seen from the control's origin; otherwise it is the whole
/// render area.
pub fn compute_layout_clip(props: &LayoutProps, mm: &MinMax, slot: Size, render_size: Size) -> Region {
    let ink = Size::new(render_size.width.min(mm.max_width), render_size.height.min(mm.max_height));
    let clipping = Size::new(
        (slot.width - props.margin.width()).max(0),
        (slot.height - props.margin.height()).max(0),
    );
    let clip = if clipping.width < ink.width || clipping.height < ink.height {
        let offset = alignment_offset(props.horizontal_alignment, props.vertical_alignment, clipping, ink);
        Region::new(-offset.x, -offset.y, clipping.width, clipping.height)
    } else {
        render_size.to_region()
    };
    apply_max_constraints(props, render_size, clip)
}

// ---------------------------------------------------------------------------
// LayoutContext
// ---------------------------------------------------------------------------

/// What a widget's layout hooks can do: measure and arrange its children.
pub struct LayoutContext<'a> {
    tree: &'a mut ControlTree,
    node: NodeId,
}

impl<'a> LayoutContext<'a> {
    pub(crate) fn new(tree: &'a mut ControlTree, node: NodeId) -> Self {
        Self { tree, node }
    }

    /// The control whose hook is running.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn children(&self) -> Vec<NodeId> {
        self.tree.children(self.node).to_vec()
    }

    /// Measure a child; returns its desired size.
    pub fn measure(&mut self, child: NodeId, available: Size) -> Size {
        self.tree.measure(child, available)
    }

    pub fn arrange(&mut self, child: NodeId, rect: Region) {
        self.tree.arrange(child, rect);
    }

    pub fn desired_size(&self, child: NodeId) -> Size {
        self.tree.layout(child).map_or(Size::ZERO, |l| l.desired_size)
    }

    /// Measure every child with the same bound; returns the largest desired size.
    pub fn measure_children(&mut self, available: Size) -> Size {
        let mut size = Size::ZERO;
        for child in self.children() {
            let desired = self.measure(child, available);
            size.width = size.width.max(desired.width);
            size.height = size.height.max(desired.height);
        }
        size
    }

    /// Arrange every child over the whole area; returns `final_size`.
    pub fn arrange_children(&mut self, final_size: Size) -> Size {
        for child in self.children() {
            self.arrange(child, final_size.to_region());
        }
        final_size
    }
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

impl ControlTree {
    /// Cached layout of a control.
    pub fn layout(&self, id: NodeId) -> Option<&LayoutInfo> {
        self.nodes.get(id).map(|n| &n.layout)
    }

    /// Measure `id` against `available` (margin included) and return its
    /// desired size.
    ///
    /// # Panics
    ///
    /// Panics if `available` has a negative dimension.
    pub fn measure(&mut self, id: NodeId, available: Size) -> Size {
        assert!(available.is_valid(), "measure with negative available size {available:?}");
        let Some(node) = self.nodes.get(id) else {
            return Size::ZERO;
        };
        if node.layout.validity >= LayoutValidity::Measure && node.layout.measure_argument == Some(available) {
            return node.layout.desired_size;
        }
        let props = node.props.clone();

        if props.visibility == Visibility::Collapsed {
            self.store_layout(id, |l| {
                l.measure_argument = Some(available);
                l.unclipped_desired_size = Size::ZERO;
                l.desired_size = Size::ZERO;
                l.validity = LayoutValidity::Measure;
            });
            return Size::ZERO;
        }

        let mm = MinMax::new(&props);
        let margin = props.margin;
        let frame = Size::new(
            sub_dim(available.width, margin.width()).max(0).min(mm.max_width).max(mm.min_width),
            sub_dim(available.height, margin.height()).max(0).min(mm.max_height).max(mm.min_height),
        );

        let content = self.measure_override(id, frame);
        assert!(content.is_valid(), "widget measured to a negative size {content:?}");

        let unclipped = Size::new(content.width.max(mm.min_width), content.height.max(mm.min_height));
        let clipped = Size::new(unclipped.width.min(mm.max_width), unclipped.height.min(mm.max_height));
        let desired = Size::new(
            add_dim(clipped.width, margin.width()).min(available.width).max(0),
            add_dim(clipped.height, margin.height()).min(available.height).max(0),
        );
        trace!(?id, ?available, ?frame, ?desired, "measured");

        self.store_layout(id, |l| {
            l.measure_argument = Some(available);
            l.unclipped_desired_size = unclipped;
            l.desired_size = desired;
            l.validity = LayoutValidity::Measure;
        });
        desired
    }

    /// Arrange `id` into `final_rect` (parent coordinates, margin included).
    ///
    /// # Panics
    ///
    /// Panics if `final_rect` has a negative dimension.
    pub fn arrange(&mut self, id: NodeId, final_rect: Region) {
        assert!(final_rect.size().is_valid(), "arrange into negative rect {final_rect:?}");
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if node.layout.validity == LayoutValidity::Arrange && node.layout.render_slot_rect == final_rect {
            return;
        }
        if node.layout.validity == LayoutValidity::Nothing {
            let constraint = node.layout.measure_argument.unwrap_or(final_rect.size());
            self.measure(id, constraint);
        }
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let props = node.props.clone();
        let unclipped = node.layout.unclipped_desired_size;

        if props.visibility == Visibility::Collapsed {
            self.store_layout(id, |l| {
                l.render_slot_rect = final_rect;
                l.render_size = Size::ZERO;
                l.actual_offset = final_rect.offset();
                l.layout_clip = Region::EMPTY;
                l.validity = LayoutValidity::Arrange;
            });
            return;
        }

        let mm = MinMax::new(&props);
        let margin = props.margin;
        let client = Size::new(
            (final_rect.width - margin.width()).max(0),
            (final_rect.height - margin.height()).max(0),
        );

        let mut arrange_size = client;
        if arrange_size.width < unclipped.width || props.horizontal_alignment != HorizontalAlignment::Stretch {
            arrange_size.width = unclipped.width;
        }
        if arrange_size.height < unclipped.height || props.vertical_alignment != VerticalAlignment::Stretch {
            arrange_size.height = unclipped.height;
        }
        arrange_size.width = arrange_size.width.min(unclipped.width.max(mm.max_width));
        arrange_size.height = arrange_size.height.min(unclipped.height.max(mm.max_height));

        let render_size = self.arrange_override(id, arrange_size);
        assert!(render_size.is_valid(), "widget arranged to a negative size {render_size:?}");

        let ink = Size::new(render_size.width.min(mm.max_width), render_size.height.min(mm.max_height));
        let offset = alignment_offset(props.horizontal_alignment, props.vertical_alignment, client, ink)
            + Offset::new(final_rect.x + margin.left, final_rect.y + margin.top);
        let layout_clip = compute_layout_clip(&props, &mm, final_rect.size(), render_size);
        trace!(?id, ?final_rect, ?render_size, ?offset, ?layout_clip, "arranged");

        self.store_layout(id, |l| {
            l.render_slot_rect = final_rect;
            l.render_size = render_size;
            l.actual_offset = offset;
            l.layout_clip = layout_clip;
            l.validity = LayoutValidity::Arrange;
        });
    }

    /// Apply queued invalidations, then measure and arrange the root into
    /// `root_rect`. Returns whether a root was laid out.
    pub fn update_layout(&mut self, root_rect: Region) -> bool {
        let _span = debug_span!("layout", width = root_rect.width, height = root_rect.height).entered();
        self.apply_pending_invalidations();
        let Some(root) = self.root() else {
            return false;
        };
        self.measure(root, root_rect.size());
        self.arrange(root, root_rect);
        true
    }

    fn store_layout(&mut self, id: NodeId, f: impl FnOnce(&mut LayoutInfo)) {
        if let Some(node) = self.nodes.get_mut(id) {
            f(&mut node.layout);
        }
    }

    fn measure_override(&mut self, id: NodeId, available: Size) -> Size {
        let mut widget = self.nodes.get_mut(id).and_then(|n| n.widget.take());
        let size = {
            let mut ctx = LayoutContext::new(self, id);
            match widget.as_mut() {
                Some(w) => w.measure_override(&mut ctx, available),
                None => ctx.measure_children(available),
            }
        };
        if let Some(node) = self.nodes.get_mut(id) {
            node.widget = widget;
        }
        size
    }

    fn arrange_override(&mut self, id: NodeId, final_size: Size) -> Size {
        let mut widget = self.nodes.get_mut(id).and_then(|n| n.widget.take());
        let size = {
            let mut ctx = LayoutContext::new(self, id);
            match widget.as_mut() {
                Some(w) => w.arrange_override(&mut ctx, final_size),
                None => ctx.arrange_children(final_size),
            }
        };
        if let Some(node) = self.nodes.get_mut(id) {
            node.widget = widget;
        }
        size
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Spacing;
    use crate::tree::NodeData;
    use pretty_assertions::assert_eq;

    use HorizontalAlignment as H;
    use VerticalAlignment as V;

    // -----------------------------------------------------------------------
    // Alignment offsets
    // -----------------------------------------------------------------------

    #[test]
    fn alignment_offset_table() {
        let client = Size::new(10, 10);
        let cases = [
            ((2, 3), H::Center, V::Center, (4, 3)),
            ((2, 3), H::Left, V::Center, (0, 3)),
            ((2, 3), H::Right, V::Center, (8, 3)),
            ((2, 3), H::Stretch, V::Center, (4, 3)),
            ((2, 3), H::Center, V::Top, (4, 0)),
            ((2, 3), H::Center, V::Bottom, (4, 7)),
            ((2, 3), H::Left, V::Bottom, (0, 7)),
            ((2, 3), H::Right, V::Bottom, (8, 7)),
            ((3, 2), H::Center, V::Center, (3, 4)),
            ((25, 15), H::Center, V::Center, (-7, -2)),
            ((25, 15), H::Stretch, V::Stretch, (0, 0)),
            ((25, 15), H::Right, V::Bottom, (-15, -5)),
        ];
        for ((w, h), ha, va, (x, y)) in cases {
            assert_eq!(
                alignment_offset(ha, va, client, Size::new(w, h)),
                Offset::new(x, y),
                "ink ({w},{h}) {ha:?}/{va:?}"
            );
        }
    }

    #[test]
    fn max_constraints_clip_to_max_and_render() {
        let props = LayoutProps::new().stretched().with_max_width(3);
        let clip = apply_max_constraints(&props, Size::new(10, 1), Region::new(-10, -10, 20, 20));
        assert_eq!(clip, Region::new(0, 0, 3, 1));

        let unbounded = LayoutProps::new();
        let clip = Region::new(-10, -10, 20, 20);
        assert_eq!(apply_max_constraints(&unbounded, Size::new(10, 1), clip), clip);
    }

    // -----------------------------------------------------------------------
    // Passes
    // -----------------------------------------------------------------------

    fn single(props: LayoutProps) -> (ControlTree, NodeId) {
        let mut tree = ControlTree::new();
        let id = tree.insert(NodeData::panel().with_props(props));
        (tree, id)
    }

    #[test]
    fn stretch_fills_slot() {
        let (mut tree, id) = single(LayoutProps::new().stretched());
        tree.update_layout(Region::new(0, 0, 80, 80));
        let l = tree.layout(id).unwrap();
        assert_eq!(l.render_size, Size::new(80, 80));
        assert_eq!(l.actual_offset, Offset::ZERO);
        assert_eq!(l.layout_clip, Region::new(0, 0, 80, 80));
    }

    #[test]
    fn default_alignment_uses_desired_size() {
        let (mut tree, id) = single(LayoutProps::new().with_size(10, 4).with_margin(Spacing::new(2, 1, 0, 0)));
        tree.update_layout(Region::new(0, 0, 80, 24));
        let l = tree.layout(id).unwrap();
        assert_eq!(l.desired_size, Size::new(12, 5));
        assert_eq!(l.render_size, Size::new(10, 4));
        assert_eq!(l.actual_offset, Offset::new(2, 1));
    }

    #[test]
    fn min_size_floors_desired() {
        let (mut tree, id) = single(LayoutProps::new().with_min_width(7).with_min_height(2));
        tree.update_layout(Region::new(0, 0, 80, 24));
        assert_eq!(tree.layout(id).unwrap().desired_size, Size::new(7, 2));
    }

    #[test]
    fn max_width_limits_stretch() {
        let (mut tree, id) = single(LayoutProps::new().stretched().with_max_width(30));
        tree.update_layout(Region::new(0, 0, 80, 10));
        let l = tree.layout(id).unwrap();
        assert_eq!(l.render_size, Size::new(30, 10));
        assert_eq!(l.actual_offset, Offset::new(25, 0));
    }

    #[test]
    fn collapsed_takes_no_space() {
        let mut tree = ControlTree::new();
        let root = tree.insert(NodeData::panel());
        let props = LayoutProps::new().with_size(5, 5).with_visibility(Visibility::Collapsed);
        let child = tree.insert_child(root, NodeData::panel().with_props(props)).unwrap();
        tree.update_layout(Region::new(0, 0, 20, 20));
        assert_eq!(tree.layout(child).unwrap().desired_size, Size::ZERO);
        assert_eq!(tree.layout(child).unwrap().render_size, Size::ZERO);
        assert_eq!(tree.layout(root).unwrap().desired_size, Size::ZERO);
    }

    #[test]
    fn hidden_still_takes_space() {
        let mut tree = ControlTree::new();
        let root = tree.insert(NodeData::panel());
        let props = LayoutProps::new().with_size(5, 3).with_visibility(Visibility::Hidden);
        tree.insert_child(root, NodeData::panel().with_props(props)).unwrap();
        tree.update_layout(Region::new(0, 0, 20, 20));
        assert_eq!(tree.layout(root).unwrap().desired_size, Size::new(5, 3));
    }

    #[test]
    fn infinite_available_size_is_preserved() {
        let (mut tree, id) = single(LayoutProps::new().with_margin(Spacing::all(2)));
        let desired = tree.measure(id, Size::INFINITE);
        assert_eq!(desired, Size::new(4, 4));
        assert_eq!(tree.layout(id).unwrap().measure_argument, Some(Size::INFINITE));
    }

    #[test]
    fn layout_is_cached_until_invalidated() {
        let (mut tree, id) = single(LayoutProps::new().with_size(3, 3));
        tree.update_layout(Region::new(0, 0, 10, 10));
        assert_eq!(tree.layout(id).unwrap().validity, LayoutValidity::Arrange);

        tree.update_props(id, |p| p.width = Some(6)).unwrap();
        assert_eq!(tree.layout(id).unwrap().validity, LayoutValidity::Nothing);
        tree.update_layout(Region::new(0, 0, 10, 10));
        assert_eq!(tree.layout(id).unwrap().render_size, Size::new(6, 3));
    }

    #[test]
    #[should_panic(expected = "negative")]
    fn negative_available_size_panics() {
        let (mut tree, id) = single(LayoutProps::new());
        tree.measure(id, Size::new(-1, 5));
    }
}
