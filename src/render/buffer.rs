//! Off-screen cell grids.
//!
//! A [`RenderBuffer`] is what a widget draws into and what the renderer
//! composes. Cells that were never written are transparent, so a child only
//! covers its parent where it actually drew something.

use crate::geometry::{Offset, Region, Size};

use super::cell::{Cell, CellStyle};

/// A rectangular grid of optional cells, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderBuffer {
    size: Size,
    cells: Vec<Option<Cell>>,
}

impl RenderBuffer {
    /// A fully transparent buffer. Negative dimensions are treated as zero.
    pub fn new(size: Size) -> Self {
        let size = Size::new(size.width.max(0), size.height.max(0));
        Self {
            size,
            cells: vec![None; size.width as usize * size.height as usize],
        }
    }

    /// A buffer with every cell set to `cell`.
    pub fn filled(size: Size, cell: Cell) -> Self {
        let mut buffer = Self::new(size);
        buffer.cells.iter_mut().for_each(|c| *c = Some(cell.clone()));
        buffer
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> i32 {
        self.size.width
    }

    pub fn height(&self) -> i32 {
        self.size.height
    }

    pub fn bounds(&self) -> Region {
        self.size.to_region()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.size.width || y >= self.size.height {
            return None;
        }
        Some(y as usize * self.size.width as usize + x as usize)
    }

    /// The cell at column `x`, row `y`; `None` if transparent or out of bounds.
    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).and_then(|i| self.cells[i].as_ref())
    }

    /// Write one cell. Out-of-bounds writes are dropped; returns whether it landed.
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.cells[i] = Some(cell);
                true
            }
            None => false,
        }
    }

    /// Write `text` left to right starting at (`x`, `y`), clipped to the buffer.
    ///
    /// Returns the number of cells written.
    pub fn put_str(&mut self, x: i32, y: i32, text: &str, style: CellStyle) -> usize {
        let mut written = 0;
        for (i, ch) in text.chars().enumerate() {
            if self.set(x + i as i32, y, Cell::styled(ch, style.clone())) {
                written += 1;
            }
        }
        written
    }

    /// Set every cell of `region` (clipped to the buffer) to `cell`.
    pub fn fill(&mut self, region: Region, cell: &Cell) {
        let area = region.intersection(self.bounds());
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                self.set(x, y, cell.clone());
            }
        }
    }

    /// Make every cell transparent again.
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }

    /// Copy the opaque cells of `src` that lie inside `clip` (in `src`
    /// coordinates) into this buffer, with `src`'s origin placed at `at`.
    pub fn blit(&mut self, src: &RenderBuffer, clip: Region, at: Offset) {
        let area = clip.intersection(src.bounds());
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                if let Some(cell) = src.get(x, y) {
                    self.set(x + at.x, y + at.y, cell.clone());
                }
            }
        }
    }

    /// Row `y` as text, transparent cells rendered as spaces.
    pub fn row_text(&self, y: i32) -> String {
        (0..self.size.width)
            .map(|x| self.get(x, y).map_or(' ', |c| c.ch))
            .collect()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
