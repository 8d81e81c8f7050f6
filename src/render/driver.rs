//! Crossterm terminal surface.
//!
//! [`TerminalSurface`] queues cursor moves and styled prints into a writer
//! and sends them on `flush`. It is generic over the writer so the escape
//! stream can be captured in tests; [`TerminalSurface::stdout`] is the real
//! terminal.

use std::io::{self, BufWriter, Stdout, Write};

use crossterm::{
    cursor, execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};

use tracing::warn;

use crate::geometry::{Region, Size};

use super::cell::{Cell, CellStyle};
use super::surface::{Surface, SurfaceError};

/// A [`Surface`] that emits crossterm commands.
///
/// Full-screen mode (raw mode, alternate screen, hidden cursor) is opt-in via
/// [`enter_fullscreen`](Self::enter_fullscreen) and is undone on drop.
pub struct TerminalSurface<W: Write = BufWriter<Stdout>> {
    writer: W,
    size: Size,
    fullscreen: bool,
}

impl TerminalSurface<BufWriter<Stdout>> {
    /// A surface on stdout sized to the current terminal.
    pub fn stdout() -> Result<Self, SurfaceError> {
        let (cols, rows) = terminal::size()?;
        Ok(Self::with_writer(
            BufWriter::new(io::stdout()),
            Size::new(i32::from(cols), i32::from(rows)),
        ))
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn with_writer(writer: W, size: Size) -> Self {
        Self { writer, size, fullscreen: false }
    }

    /// Update the known size after a terminal resize.
    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Raw mode, alternate screen, cursor hidden.
    pub fn enter_fullscreen(&mut self) -> Result<(), SurfaceError> {
        if self.fullscreen {
            return Ok(());
        }
        terminal::enable_raw_mode()?;
        self.fullscreen = true;
        execute!(self.writer, EnterAlternateScreen, cursor::Hide)?;
        Ok(())
    }

    /// Restores the terminal in reverse order of
    /// [`enter_fullscreen`](Self::enter_fullscreen).
    pub fn leave_fullscreen(&mut self) -> Result<(), SurfaceError> {
        if !self.fullscreen {
            return Ok(());
        }
        self.fullscreen = false;
        let screen = execute!(self.writer, ResetColor, cursor::Show, LeaveAlternateScreen);
        terminal::disable_raw_mode()?;
        screen?;
        Ok(())
    }

    fn queue_style(&mut self, style: &CellStyle) -> io::Result<()> {
        let fg = style.fg.as_deref().and_then(parse_color);
        let bg = style.bg.as_deref().and_then(parse_color);
        if let Some(color) = fg {
            queue!(self.writer, SetForegroundColor(color))?;
        }
        if let Some(color) = bg {
            queue!(self.writer, SetBackgroundColor(color))?;
        }
        let attributes = [
            (style.bold, Attribute::Bold),
            (style.dim, Attribute::Dim),
            (style.italic, Attribute::Italic),
            (style.underline, Attribute::Underlined),
            (style.strikethrough, Attribute::CrossedOut),
            (style.reverse, Attribute::Reverse),
        ];
        for attribute in attributes.into_iter().filter(|(on, _)| *on).map(|(_, a)| a) {
            queue!(self.writer, SetAttribute(attribute))?;
        }
        Ok(())
    }
}

impl<W: Write> Drop for TerminalSurface<W> {
    fn drop(&mut self) {
        if let Err(err) = self.leave_fullscreen() {
            warn!(error = %err, "terminal not restored");
        }
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn size(&self) -> Size {
        self.size
    }

    fn write(&mut self, row: i32, col: i32, cell: &Cell) -> Result<(), SurfaceError> {
        let (Ok(x), Ok(y)) = (u16::try_from(col), u16::try_from(row)) else {
            return Err(SurfaceError::OutOfBounds { row, col });
        };
        if col >= self.size.width || row >= self.size.height {
            return Err(SurfaceError::OutOfBounds { row, col });
        }
        queue!(self.writer, cursor::MoveTo(x, y))?;
        if cell.style.is_plain() {
            queue!(self.writer, Print(cell.ch))?;
        } else {
            self.queue_style(&cell.style)?;
            queue!(self.writer, Print(cell.ch), SetAttribute(Attribute::Reset), ResetColor)?;
        }
        Ok(())
    }

    fn flush(&mut self, _region: Region) -> Result<(), SurfaceError> {
        self.writer.flush()?;
        Ok(())
    }
}

const NAMED_COLORS: [(&str, Color); 16] = [
    ("black", Color::Black),
    ("red", Color::Red),
    ("green", Color::Green),
    ("yellow", Color::Yellow),
    ("blue", Color::Blue),
    ("magenta", Color::Magenta),
    ("cyan", Color::Cyan),
    ("white", Color::White),
    ("grey", Color::Grey),
    ("darkred", Color::DarkRed),
    ("darkgreen", Color::DarkGreen),
    ("darkyellow", Color::DarkYellow),
    ("darkblue", Color::DarkBlue),
    ("darkmagenta", Color::DarkMagenta),
    ("darkcyan", Color::DarkCyan),
    ("darkgrey", Color::DarkGrey),
];

/// Parse a cell colour: `#rrggbb`, `#rgb`, or one of the sixteen terminal
/// names. Names ignore case and underscores, and accept `gray` for `grey`.
pub fn parse_color(text: &str) -> Option<Color> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix('#') {
        return parse_hex_color(hex);
    }
    let name = text
        .chars()
        .filter(|&c| c != '_')
        .collect::<String>()
        .to_ascii_lowercase()
        .replace("gray", "grey");
    NAMED_COLORS.iter().find(|(known, _)| *known == name).map(|&(_, color)| color)
}

fn parse_hex_color(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    match hex.len() {
        6 => Some(Color::Rgb {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        }),
        3 => {
            // 0xA -> 0xAA
            let (r, g, b) = (channel(0..1)?, channel(1..2)?, channel(2..3)?);
            Some(Color::Rgb {
                r: r * 17,
                g: g * 17,
                b: b * 17,
            })
        }
        _ => None,
    }
}
