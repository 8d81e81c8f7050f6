//! Tree operations: insert, attach, detach, remove, ancestors, invalidation.
//!
//! Parents own their children through the `children` map; a child only keeps
//! a back-reference in `parent`. Every attach goes through a single-parent
//! check, so a control can never appear under two parents.

use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{SecondaryMap, SlotMap};
use thiserror::Error;
use tracing::trace;

use super::node::{LayoutProps, NodeData, NodeId};
use crate::layout::LayoutValidity;
use crate::widget::Widget;

const NO_CHILDREN: &[NodeId] = &[];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("node {0:?} does not exist")]
    NodeNotFound(NodeId),

    #[error("node {node:?} is already attached to {parent:?}")]
    AlreadyAttached { node: NodeId, parent: NodeId },

    #[error("attaching {node:?} under {parent:?} would create a cycle")]
    CycleDetected { node: NodeId, parent: NodeId },

    #[error("node {0:?} has no parent")]
    NotAttached(NodeId),
}

// ---------------------------------------------------------------------------
// Invalidator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Invalidation {
    Layout,
    Visual,
}

/// Cloneable handle for requesting invalidation without `&mut ControlTree`,
/// e.g. from a bound model's change listener. Requests are applied at the
/// start of the next layout pass.
#[derive(Debug, Clone, Default)]
pub struct Invalidator {
    pending: Rc<RefCell<Vec<(NodeId, Invalidation)>>>,
}

impl Invalidator {
    /// Request re-measure, re-arrange and re-render of `id`.
    pub fn invalidate(&self, id: NodeId) {
        self.pending.borrow_mut().push((id, Invalidation::Layout));
    }

    /// Request a re-render of `id` only.
    pub fn invalidate_visual(&self, id: NodeId) {
        self.pending.borrow_mut().push((id, Invalidation::Visual));
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.borrow().is_empty()
    }
}

// ---------------------------------------------------------------------------
// ControlTree
// ---------------------------------------------------------------------------

/// The control tree, backed by a slotmap arena.
pub struct ControlTree {
    pub(crate) nodes: SlotMap<NodeId, NodeData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    root: Option<NodeId>,
    invalidator: Invalidator,
}

impl ControlTree {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::default(),
            parent: SecondaryMap::default(),
            root: None,
            invalidator: Invalidator::default(),
        }
    }

    /// Add a detached control. The first control added becomes the root.
    pub fn insert(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        if self.root.is_none() {
            self.root = Some(id);
        }
        trace!(?id, "control inserted");
        id
    }

    /// Insert a node as the last child of `parent`.
    pub fn insert_child(&mut self, parent: NodeId, data: NodeData) -> Result<NodeId, LayoutError> {
        if !self.nodes.contains_key(parent) {
            return Err(LayoutError::NodeNotFound(parent));
        }
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        self.link(parent, id);
        Ok(id)
    }

    /// Attach a detached node (with its subtree) as the last child of `parent`.
    ///
    /// Attaching to the current parent again is a no-op.
    pub fn attach(&mut self, parent: NodeId, node: NodeId) -> Result<(), LayoutError> {
        for id in [parent, node] {
            if !self.nodes.contains_key(id) {
                return Err(LayoutError::NodeNotFound(id));
            }
        }
        match self.parent.get(node).copied() {
            Some(current) if current == parent => return Ok(()),
            Some(current) => return Err(LayoutError::AlreadyAttached { node, parent: current }),
            None => {}
        }
        if parent == node || self.ancestors(parent).contains(&node) {
            return Err(LayoutError::CycleDetected { node, parent });
        }
        if self.root == Some(node) {
            self.root = Some(self.root_of(parent));
        }
        self.link(parent, node);
        Ok(())
    }

    /// Detach `node` from its parent. The node and its subtree stay in the
    /// arena as a separate tree.
    pub fn detach(&mut self, node: NodeId) -> Result<(), LayoutError> {
        if !self.nodes.contains_key(node) {
            return Err(LayoutError::NodeNotFound(node));
        }
        if !self.parent.contains_key(node) {
            return Err(LayoutError::NotAttached(node));
        }
        self.unlink(node);
        Ok(())
    }

    /// Splice an attached node out of its parent's child list.
    fn unlink(&mut self, node: NodeId) {
        let Some(parent) = self.parent.remove(node) else {
            return;
        };
        if let Some(kids) = self.children.get_mut(parent) {
            kids.retain(|&kid| kid != node);
        }
        self.invalidate(parent);
        trace!(?node, ?parent, "control detached");
    }

    fn link(&mut self, parent: NodeId, node: NodeId) {
        self.parent.insert(node, parent);
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.push(node);
        }
        self.invalidate(node);
        trace!(?node, ?parent, "control attached");
    }

    /// Drop `id` and its whole subtree from the arena, returning the data of
    /// `id` itself.
    pub fn remove(&mut self, id: NodeId) -> Option<NodeData> {
        if !self.contains(id) {
            return None;
        }
        self.unlink(id);
        if self.root == Some(id) {
            self.root = None;
        }
        let subtree = self.walk_depth_first(id);
        trace!(?id, count = subtree.len(), "subtree removed");
        for &gone in subtree.iter().skip(1) {
            self.forget(gone);
        }
        self.forget(id)
    }

    fn forget(&mut self, id: NodeId) -> Option<NodeData> {
        self.children.remove(id);
        self.parent.remove(id);
        self.nodes.remove(id)
    }

    // -- structure queries ---------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Children in order. Empty if the node has none or does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(NO_CHILDREN)
    }

    /// Ancestors from the immediate parent up to the root; excludes `id`.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        std::iter::successors(self.parent(id), |&up| self.parent(up)).collect()
    }

    /// The topmost ancestor of `id` (`id` itself when detached).
    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().copied().unwrap_or(id)
    }

    /// The lowest node that is `a` or an ancestor of `a` and also `b` or an
    /// ancestor of `b`. `None` when the two belong to different trees.
    pub fn find_common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        if !self.contains(a) || !self.contains(b) {
            return None;
        }
        let mut chain_a = vec![a];
        chain_a.extend(self.ancestors(a));
        let mut chain_b = vec![b];
        chain_b.extend(self.ancestors(b));

        // Walk both chains from the root down while they agree.
        let mut common = None;
        for (x, y) in chain_a.iter().rev().zip(chain_b.iter().rev()) {
            if x != y {
                break;
            }
            common = Some(*x);
        }
        common
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
        self.invalidate(id);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// `start` followed by its descendants in pre-order (paint order).
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut pending = vec![start];
        while let Some(id) = pending.pop() {
            if self.contains(id) {
                order.push(id);
                pending.extend(self.children(id).iter().rev());
            }
        }
        order
    }

    // -- properties and widgets ------------------------------------------------------

    pub fn props(&self, id: NodeId) -> Option<&LayoutProps> {
        self.nodes.get(id).map(|n| &n.props)
    }

    /// Mutate a control's layout properties; invalidates its layout when
    /// anything changed.
    pub fn update_props(&mut self, id: NodeId, f: impl FnOnce(&mut LayoutProps)) -> Result<(), LayoutError> {
        let node = self.nodes.get_mut(id).ok_or(LayoutError::NodeNotFound(id))?;
        let before = node.props.clone();
        f(&mut node.props);
        if node.props != before {
            self.invalidate(id);
        }
        Ok(())
    }

    /// Downcast a control's widget.
    pub fn widget<W: Widget + 'static>(&self, id: NodeId) -> Option<&W> {
        self.nodes.get(id)?.widget.as_deref()?.as_any().downcast_ref::<W>()
    }

    /// Mutate a control's widget in place and invalidate its layout.
    /// `None` if the node is missing or holds a different widget type.
    pub fn update_widget<W: Widget + 'static, R>(&mut self, id: NodeId, f: impl FnOnce(&mut W) -> R) -> Option<R> {
        let widget = self.nodes.get_mut(id)?.widget.as_deref_mut()?.as_any_mut().downcast_mut::<W>()?;
        let result = f(widget);
        self.invalidate(id);
        Some(result)
    }

    // -- invalidation ------------------------------------------------------------------

    /// Mark `id` for re-render and drop the cached layout of `id` and every
    /// ancestor.
    pub fn invalidate(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.render_dirty = true;
        node.layout.validity = LayoutValidity::Nothing;
        for up in self.ancestors(id) {
            if let Some(ancestor) = self.nodes.get_mut(up) {
                ancestor.layout.validity = LayoutValidity::Nothing;
            }
        }
    }

    /// Mark `id` for re-render without touching layout.
    pub fn invalidate_visual(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.render_dirty = true;
        }
    }

    /// A handle that queues invalidations for the next layout pass.
    pub fn invalidator(&self) -> Invalidator {
        self.invalidator.clone()
    }

    /// Apply queued invalidations. Requests for removed nodes are dropped.
    pub fn apply_pending_invalidations(&mut self) -> usize {
        let pending = std::mem::take(&mut *self.invalidator.pending.borrow_mut());
        let count = pending.len();
        for (id, kind) in pending {
            match kind {
                Invalidation::Layout => self.invalidate(id),
                Invalidation::Visual => self.invalidate_visual(id),
            }
        }
        count
    }
}

impl Default for ControlTree {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
