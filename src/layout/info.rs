//! Per-control layout results.

use crate::geometry::{Offset, Region, Size};

/// How much of a control's cached layout is still valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LayoutValidity {
    #[default]
    Nothing,
    /// Desired size is valid; arrangement is not.
    Measure,
    /// Desired size and arrangement are valid.
    Arrange,
}

/// Results of the last measure and arrange passes of one control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutInfo {
    /// Available size passed to the last measure.
    pub measure_argument: Option<Size>,
    /// Content size after min/max flooring, before max clipping; excludes margin.
    pub unclipped_desired_size: Size,
    /// Size requested from the parent, margin included.
    pub desired_size: Size,
    /// Rect the parent allotted, in the parent's coordinates.
    pub render_slot_rect: Region,
    /// Size the control renders at (its ink size).
    pub render_size: Size,
    /// Position of the control's origin inside the parent.
    pub actual_offset: Offset,
    /// Visible part of the control, in its own coordinates.
    pub layout_clip: Region,
    pub validity: LayoutValidity,
}

impl LayoutInfo {
    /// Whether two infos place and clip a control identically.
    pub fn same_geometry(&self, other: &LayoutInfo) -> bool {
        self.render_slot_rect == other.render_slot_rect
            && self.render_size == other.render_size
            && self.actual_offset == other.actual_offset
            && self.layout_clip == other.layout_clip
    }
}
