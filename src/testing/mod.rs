//! Headless testing helpers.
//!
//! Use [`render_to_string`] and related helpers to capture rendered output
//! as plain text for snapshot-style assertions, typically together with
//! [`MemorySurface`](crate::render::MemorySurface).

pub mod snapshot;

pub use snapshot::{buffer_to_string, render_to_string, render_tree_to_string, surface_to_string};
