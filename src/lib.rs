//! # cellframe
//!
//! The core of a character-grid terminal UI toolkit: a retained control tree
//! with WPF-style measure/arrange layout, a property-binding engine that keeps
//! two objects (or two observable lists) in sync, and a differential renderer
//! that writes only the cells that changed.
//!
//! ## Core Systems
//!
//! - **[`geometry`]** — Offset, Size, Region, Spacing primitives and the infinite dimension
//! - **[`binding`]** — Bindable objects, converters, validators, adapters and the `Binding` engine
//! - **[`tree`]** — Slotmap-backed control tree with single-parent attach/detach and invalidation
//! - **[`layout`]** — Measure/arrange passes with alignment, margins, min/max and layout clips
//! - **[`widget`]** — Widget trait: layout hooks and rendering
//! - **[`render`]** — Cell buffers, surfaces (memory and crossterm) and the differential renderer
//! - **[`dispatch`]** — Posted-action queue for handing work to the UI thread
//! - **[`app`]** — Application struct tying tree, renderer, dispatcher and surface together
//! - **[`testing`]** — Plain-text snapshot helpers

// Foundation
pub mod geometry;

// Data binding
pub mod binding;

// Layout
pub mod layout;
pub mod tree;

// Widget system
pub mod widget;

// Rendering
pub mod render;

// Application
pub mod app;
pub mod dispatch;

// Testing
pub mod testing;
