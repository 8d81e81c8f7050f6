//! The physical output contract and an in-memory implementation.

use std::io;

use thiserror::Error;

use crate::geometry::{Region, Size};

use super::buffer::RenderBuffer;
use super::cell::Cell;

/// Errors raised by a [`Surface`].
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("surface I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("surface unavailable: {0}")]
    Unavailable(String),

    #[error("cell ({col}, {row}) is outside the surface")]
    OutOfBounds { row: i32, col: i32 },
}

/// Something cells can be written to: a terminal, or memory in tests.
///
/// Writes may be buffered until [`Surface::flush`] is called with the region
/// they touched.
pub trait Surface {
    fn size(&self) -> Size;

    fn write(&mut self, row: i32, col: i32, cell: &Cell) -> Result<(), SurfaceError>;

    fn flush(&mut self, region: Region) -> Result<(), SurfaceError>;
}

// ---------------------------------------------------------------------------
// MemorySurface
// ---------------------------------------------------------------------------

/// A surface backed by a [`RenderBuffer`], recording what was written.
///
/// It can be switched into a failing state to simulate an unavailable
/// terminal.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    buffer: RenderBuffer,
    writes: usize,
    flushes: Vec<Region>,
    failing: bool,
}

impl MemorySurface {
    /// A blank surface of `size`.
    pub fn new(size: Size) -> Self {
        Self {
            buffer: RenderBuffer::filled(size, Cell::blank()),
            writes: 0,
            flushes: Vec::new(),
            failing: false,
        }
    }

    /// Make every subsequent write and flush fail (or succeed again).
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// Cells written since creation or the last [`reset_counters`](Self::reset_counters).
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Regions passed to `flush`, oldest first.
    pub fn flushed_regions(&self) -> &[Region] {
        &self.flushes
    }

    pub fn reset_counters(&mut self) {
        self.writes = 0;
        self.flushes.clear();
    }

    pub fn buffer(&self) -> &RenderBuffer {
        &self.buffer
    }

    pub fn cell(&self, row: i32, col: i32) -> Option<&Cell> {
        self.buffer.get(col, row)
    }
}

impl Surface for MemorySurface {
    fn size(&self) -> Size {
        self.buffer.size()
    }

    fn write(&mut self, row: i32, col: i32, cell: &Cell) -> Result<(), SurfaceError> {
        if self.failing {
            return Err(SurfaceError::Unavailable("memory surface set to fail".into()));
        }
        if !self.buffer.set(col, row, cell.clone()) {
            return Err(SurfaceError::OutOfBounds { row, col });
        }
        self.writes += 1;
        Ok(())
    }

    fn flush(&mut self, region: Region) -> Result<(), SurfaceError> {
        if self.failing {
            return Err(SurfaceError::Unavailable("memory surface set to fail".into()));
        }
        self.flushes.push(region);
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
