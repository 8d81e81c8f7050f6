//! Control tree: slotmap-backed arena with single-parent ownership.

pub mod control_tree;
pub mod node;

pub use control_tree::{ControlTree, Invalidator, LayoutError};
pub use node::{HorizontalAlignment, LayoutProps, NodeData, NodeId, VerticalAlignment, Visibility};
