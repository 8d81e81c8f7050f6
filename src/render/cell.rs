//! Cells: one glyph plus its visual attributes.

// ---------------------------------------------------------------------------
// CellStyle
// ---------------------------------------------------------------------------

/// Visual attributes of a single terminal cell.
///
/// Colors are stored as optional strings, parsed by the terminal backend as
/// named colors or `#rrggbb` / `#rgb` hex values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CellStyle {
    pub fg: Option<String>,
    pub bg: Option<String>,
    pub bold: bool,
    pub dim: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub reverse: bool,
}

impl CellStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fg(mut self, color: impl Into<String>) -> Self {
        self.fg = Some(color.into());
        self
    }

    pub fn with_bg(mut self, color: impl Into<String>) -> Self {
        self.bg = Some(color.into());
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Whether no attribute is set.
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// A single terminal cell: one character with associated style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: CellStyle,
}

impl Cell {
    /// A cell with the default style.
    pub fn new(ch: char) -> Self {
        Self {
            ch,
            style: CellStyle::default(),
        }
    }

    pub fn styled(ch: char, style: CellStyle) -> Self {
        Self { ch, style }
    }

    /// A blank (space) cell with default style.
    pub fn blank() -> Self {
        Self::new(' ')
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
