//! Effective min/max resolution.

use crate::geometry::INFINITE;
use crate::tree::LayoutProps;

/// Effective size bounds of a control, combining explicit Width/Height with
/// Min/Max. An explicit size pins both bounds; `min` wins every conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinMax {
    pub min_width: i32,
    pub max_width: i32,
    pub min_height: i32,
    pub max_height: i32,
}

impl MinMax {
    pub fn new(props: &LayoutProps) -> Self {
        let (min_width, max_width) = resolve(props.width, props.min_width, props.max_width);
        let (min_height, max_height) = resolve(props.height, props.min_height, props.max_height);
        Self { min_width, max_width, min_height, max_height }
    }
}

fn resolve(explicit: Option<i32>, min: i32, max: Option<i32>) -> (i32, i32) {
    let max = max.unwrap_or(INFINITE);
    let max = explicit.unwrap_or(INFINITE).min(max).max(min);
    let min = max.min(explicit.unwrap_or(0)).max(min);
    (min, max)
}
