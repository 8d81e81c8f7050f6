//! Differential renderer.
//!
//! Each frame, the renderer re-renders only controls that were invalidated
//! or whose geometry moved, recomposes the subtrees that contain them, then
//! compares the composed image with what the surface last showed and writes
//! just the cells that differ.

use slotmap::SecondaryMap;
use thiserror::Error;
use tracing::{debug, debug_span, trace};

use crate::geometry::Region;
use crate::layout::LayoutInfo;
use crate::tree::{ControlTree, NodeId, Visibility};

use super::buffer::RenderBuffer;
use super::cell::Cell;
use super::surface::{Surface, SurfaceError};

// ---------------------------------------------------------------------------
// Config, stats, errors
// ---------------------------------------------------------------------------

/// Renderer settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderConfig {
    /// Shown wherever no control drew anything.
    pub background: Cell,
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_background(mut self, background: Cell) -> Self {
        self.background = background;
        self
    }
}

/// What one render pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Controls whose `Widget::render` was invoked.
    pub widgets_rendered: usize,
    /// Cells sent to the surface.
    pub cells_written: usize,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render pass aborted: {0}")]
    Surface(#[from] SurfaceError),
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct RenderedState {
    layout: LayoutInfo,
    children: Vec<NodeId>,
}

/// Retained render state for one control tree.
#[derive(Debug, Default)]
pub struct Renderer {
    config: RenderConfig,
    /// What each control drew itself, in its own coordinates.
    own: SecondaryMap<NodeId, RenderBuffer>,
    /// `own` with visible children composited on top.
    composed: SecondaryMap<NodeId, RenderBuffer>,
    rendered: SecondaryMap<NodeId, RenderedState>,
    /// The image the surface currently shows.
    presented: Option<RenderBuffer>,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// The last image successfully sent to the surface.
    pub fn presented(&self) -> Option<&RenderBuffer> {
        self.presented.as_ref()
    }

    /// Forget what the surface shows, so the next pass rewrites every cell.
    pub fn invalidate_presented(&mut self) {
        self.presented = None;
    }

    /// Render `tree` onto `surface`, writing only cells that changed.
    ///
    /// On error the presented image is left as it was, so the next successful
    /// pass re-sends everything that still differs.
    pub fn render<S: Surface + ?Sized>(
        &mut self,
        tree: &mut ControlTree,
        surface: &mut S,
    ) -> Result<RenderStats, RenderError> {
        let _span = debug_span!("render").entered();
        let mut stats = RenderStats::default();

        self.own.retain(|id, _| tree.contains(id));
        self.composed.retain(|id, _| tree.contains(id));
        self.rendered.retain(|id, _| tree.contains(id));

        let mut frame = RenderBuffer::filled(surface.size(), self.config.background.clone());
        if let Some(root) = tree.root().filter(|&r| is_visible(tree, r)) {
            self.render_node(tree, root, &mut stats);
            if let (Some(info), Some(image)) = (tree.layout(root), self.composed.get(root)) {
                frame.blit(image, visible_region(info, frame.bounds()), info.actual_offset);
            }
        }

        let mut touched = Region::EMPTY;
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                let Some(cell) = frame.get(x, y) else {
                    continue;
                };
                let unchanged = self
                    .presented
                    .as_ref()
                    .is_some_and(|p| p.size() == frame.size() && p.get(x, y) == Some(cell));
                if unchanged {
                    continue;
                }
                surface.write(y, x, cell)?;
                stats.cells_written += 1;
                touched = touched.union(Region::new(x, y, 1, 1));
            }
        }
        if !touched.is_empty() {
            surface.flush(touched)?;
        }
        self.presented = Some(frame);

        debug!(
            widgets_rendered = stats.widgets_rendered,
            cells_written = stats.cells_written,
            "frame rendered"
        );
        Ok(stats)
    }

    /// Bring `id`'s buffers up to date. Returns whether its composed image changed.
    fn render_node(&mut self, tree: &mut ControlTree, id: NodeId, stats: &mut RenderStats) -> bool {
        let Some(node) = tree.nodes.get(id) else {
            return false;
        };
        let info = node.layout;
        let children: Vec<NodeId> = tree
            .children(id)
            .iter()
            .copied()
            .filter(|&c| is_visible(tree, c))
            .collect();

        let stale = node.render_dirty
            || !self.own.contains_key(id)
            || self.rendered.get(id).map_or(true, |r| !r.layout.same_geometry(&info));
        if stale {
            let mut buffer = RenderBuffer::new(info.render_size);
            if let Some(widget) = node.widget.as_deref() {
                widget.render(info.render_size, &mut buffer);
            }
            trace!(?id, size = ?info.render_size, "widget rendered");
            self.own.insert(id, buffer);
            stats.widgets_rendered += 1;
        }

        let mut changed = stale;
        for &child in &children {
            changed |= self.render_node(tree, child, stats);
        }
        changed |= self.rendered.get(id).map_or(true, |r| r.children != children);

        if changed || !self.composed.contains_key(id) {
            let mut image = self
                .own
                .get(id)
                .cloned()
                .unwrap_or_else(|| RenderBuffer::new(info.render_size));
            let bounds = image.bounds();
            for &child in &children {
                if let (Some(child_info), Some(child_image)) = (tree.layout(child), self.composed.get(child)) {
                    image.blit(child_image, visible_region(child_info, bounds), child_info.actual_offset);
                }
            }
            self.composed.insert(id, image);
        }

        if let Some(node) = tree.nodes.get_mut(id) {
            node.render_dirty = false;
        }
        self.rendered.insert(id, RenderedState { layout: info, children });
        changed
    }
}

fn is_visible(tree: &ControlTree, id: NodeId) -> bool {
    tree.props(id).is_some_and(|p| p.visibility == Visibility::Visible)
}

/// The part of a control that shows through, in its own coordinates:
/// its layout clip, its render area, its slot and the parent's bounds.
fn visible_region(info: &LayoutInfo, parent_bounds: Region) -> Region {
    let back = -info.actual_offset;
    info.layout_clip
        .intersection(info.render_size.to_region())
        .intersection(info.render_slot_rect.translate(back))
        .intersection(parent_bounds.translate(back))
}

// ===========================================================================
// Tests
// ===========================================================================
