//! Measure/arrange layout over the control tree.
//!
//! - [`constraints`]: effective min/max from explicit sizes
//! - [`info`]: cached per-control results
//! - [`pass`]: the measure and arrange passes, alignment and layout clip

pub mod constraints;
pub mod info;
pub mod pass;

pub use constraints::MinMax;
pub use info::{LayoutInfo, LayoutValidity};
pub use pass::{alignment_offset, apply_max_constraints, compute_layout_clip, LayoutContext};
