//! Node types: NodeId, alignment, visibility, LayoutProps, NodeData.

use slotmap::new_key_type;

use crate::geometry::Spacing;
use crate::layout::LayoutInfo;
use crate::widget::{Panel, Widget};

new_key_type! {
    /// Unique identifier for a control in the tree. Copy, lightweight (u64).
    pub struct NodeId;
}

// ---------------------------------------------------------------------------
// Alignment / visibility
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlignment {
    #[default]
    Top,
    Center,
    Bottom,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Visible,
    /// Takes space but is not drawn.
    Hidden,
    /// Takes no space and is not drawn.
    Collapsed,
}

// ---------------------------------------------------------------------------
// LayoutProps
// ---------------------------------------------------------------------------

/// Layout-affecting properties of a control. Changing any of them through
/// [`ControlTree::update_props`](super::ControlTree::update_props)
/// invalidates the control's layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutProps {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub min_width: i32,
    pub min_height: i32,
    pub max_width: Option<i32>,
    pub max_height: Option<i32>,
    pub margin: Spacing,
    pub horizontal_alignment: HorizontalAlignment,
    pub vertical_alignment: VerticalAlignment,
    pub visibility: Visibility,
}

impl LayoutProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_width(mut self, width: i32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_height(mut self, height: i32) -> Self {
        self.height = Some(height);
        self
    }

    /// Explicit width and height.
    pub fn with_size(self, width: i32, height: i32) -> Self {
        self.with_width(width).with_height(height)
    }

    pub fn with_min_width(mut self, min_width: i32) -> Self {
        self.min_width = min_width;
        self
    }

    pub fn with_min_height(mut self, min_height: i32) -> Self {
        self.min_height = min_height;
        self
    }

    pub fn with_max_width(mut self, max_width: i32) -> Self {
        self.max_width = Some(max_width);
        self
    }

    pub fn with_max_height(mut self, max_height: i32) -> Self {
        self.max_height = Some(max_height);
        self
    }

    pub fn with_margin(mut self, margin: Spacing) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_alignment(mut self, horizontal: HorizontalAlignment, vertical: VerticalAlignment) -> Self {
        self.horizontal_alignment = horizontal;
        self.vertical_alignment = vertical;
        self
    }

    /// Stretch in both directions.
    pub fn stretched(self) -> Self {
        self.with_alignment(HorizontalAlignment::Stretch, VerticalAlignment::Stretch)
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

// ---------------------------------------------------------------------------
// NodeData
// ---------------------------------------------------------------------------

/// Everything stored per control.
pub struct NodeData {
    /// Optional name, for diagnostics.
    pub name: Option<String>,
    pub(crate) props: LayoutProps,
    /// Taken out while the widget's own layout hooks run.
    pub(crate) widget: Option<Box<dyn Widget>>,
    pub(crate) layout: LayoutInfo,
    /// Own content must be re-rendered.
    pub(crate) render_dirty: bool,
}

impl std::fmt::Debug for NodeData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeData")
            .field("name", &self.name)
            .field("props", &self.props)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl NodeData {
    /// A control backed by the given widget.
    pub fn new(widget: impl Widget + 'static) -> Self {
        Self {
            name: None,
            props: LayoutProps::default(),
            widget: Some(Box::new(widget)),
            layout: LayoutInfo::default(),
            render_dirty: true,
        }
    }

    /// A plain container control.
    pub fn panel() -> Self {
        Self::new(Panel)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_props(mut self, props: LayoutProps) -> Self {
        self.props = props;
        self
    }

    pub fn props(&self) -> &LayoutProps {
        &self.props
    }

    pub fn layout(&self) -> &LayoutInfo {
        &self.layout
    }

    pub fn widget(&self) -> Option<&dyn Widget> {
        self.widget.as_deref()
    }
}
