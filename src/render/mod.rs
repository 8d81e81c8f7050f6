//! Rendering pipeline: cells, buffers, surfaces and the differential renderer.

pub mod buffer;
pub mod cell;
pub mod driver;
pub mod renderer;
pub mod surface;

pub use buffer::RenderBuffer;
pub use cell::{Cell, CellStyle};
pub use driver::{parse_color, TerminalSurface};
pub use renderer::{RenderConfig, RenderError, RenderStats, Renderer};
pub use surface::{MemorySurface, Surface, SurfaceError};
