//! Cell geometry shared by layout and rendering.
//!
//! All coordinates are terminal cells. Layout works with unconstrained
//! dimensions too, so [`INFINITE`] marks "no upper bound" and the helper
//! functions [`sub_dim`] and [`add_dim`] keep it intact through margin
//! arithmetic.

use std::ops::{Add, Neg, Sub};

/// An unconstrained dimension, e.g. the available width inside a scroller.
pub const INFINITE: i32 = i32::MAX;

/// `dim - delta`, keeping [`INFINITE`] infinite.
#[inline]
pub const fn sub_dim(dim: i32, delta: i32) -> i32 {
    if dim == INFINITE {
        INFINITE
    } else {
        dim.saturating_sub(delta)
    }
}

/// `dim + delta`, keeping [`INFINITE`] infinite.
#[inline]
pub const fn add_dim(dim: i32, delta: i32) -> i32 {
    if dim == INFINITE {
        INFINITE
    } else {
        dim.saturating_add(delta)
    }
}

/// A 2D displacement in terminal cells. Used for a node's actual offset
/// inside its parent.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Offset {
    pub x: i32,
    pub y: i32,
}

impl Offset {
    /// The zero displacement.
    pub const ZERO: Offset = Offset { x: 0, y: 0 };

    /// Create a new offset.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Offset {
    type Output = Offset;
    #[inline]
    fn add(self, rhs: Offset) -> Self::Output {
        Offset::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Offset {
    type Output = Offset;
    #[inline]
    fn sub(self, rhs: Offset) -> Self::Output {
        Offset::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Offset {
    type Output = Offset;
    #[inline]
    fn neg(self) -> Offset {
        Offset::new(-self.x, -self.y)
    }
}

/// Width and height in cells. Layout may carry [`INFINITE`] in either.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const ZERO: Size = Size { width: 0, height: 0 };

    /// Both dimensions unconstrained.
    pub const INFINITE: Size = Size { width: INFINITE, height: INFINITE };

    /// Create a new size.
    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero (or negative).
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Whether both dimensions are non-negative.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.width >= 0 && self.height >= 0
    }

    /// This size as a region anchored at `(0, 0)`.
    #[inline]
    pub const fn to_region(self) -> Region {
        Region::new(0, 0, self.width, self.height)
    }
}

/// A rectangle in terminal cells defined by position and size.
///
/// Render slots, layout clips and flush areas are all regions. A region with
/// a non-positive width or height is empty.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub const EMPTY: Region = Region { x: 0, y: 0, width: 0, height: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Build from exclusive edges; collapses to [`Region::EMPTY`] when the
    /// edges are crossed.
    fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        if right <= left || bottom <= top {
            Region::EMPTY
        } else {
            Region::new(left, top, right - left, bottom - top)
        }
    }

    /// Exclusive right edge.
    #[inline]
    pub const fn right(self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[inline]
    pub const fn bottom(self) -> i32 {
        self.y + self.height
    }

    #[inline]
    pub const fn offset(self) -> Offset {
        Offset::new(self.x, self.y)
    }

    #[inline]
    pub const fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Whether the region covers no cells.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Whether cell `(x, y)` is inside.
    #[inline]
    pub const fn contains(self, x: i32, y: i32) -> bool {
        self.x <= x && x < self.right() && self.y <= y && y < self.bottom()
    }

    /// The overlapping area, or [`Region::EMPTY`].
    pub fn intersection(self, other: Region) -> Region {
        Region::from_edges(
            self.x.max(other.x),
            self.y.max(other.y),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        )
    }

    /// Bounding box of both regions. Empty regions do not contribute, so
    /// folding dirty areas from [`Region::EMPTY`] yields their bounds.
    pub fn union(self, other: Region) -> Region {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => other,
            (_, true) => self,
            _ => Region::from_edges(
                self.x.min(other.x),
                self.y.min(other.y),
                self.right().max(other.right()),
                self.bottom().max(other.bottom()),
            ),
        }
    }

    /// Move the region; size is unchanged.
    #[inline]
    pub fn translate(self, by: Offset) -> Region {
        Region { x: self.x + by.x, y: self.y + by.y, ..self }
    }
}

/// Thickness around the four sides of a rectangle; used for margins.
///
/// Sides may be negative, which lets a node bleed outside its slot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Spacing {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Spacing {
    pub const ZERO: Spacing = Spacing { left: 0, top: 0, right: 0, bottom: 0 };

    /// Create spacing in left, top, right, bottom order.
    #[inline]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    #[inline]
    pub const fn all(value: i32) -> Self {
        Self { left: value, top: value, right: value, bottom: value }
    }

    /// Horizontal thickness.
    #[inline]
    pub const fn width(self) -> i32 {
        self.left + self.right
    }

    /// Vertical thickness.
    #[inline]
    pub const fn height(self) -> i32 {
        self.top + self.bottom
    }
}
