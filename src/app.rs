//! App struct: one control tree, its renderer, a surface and a posted-action
//! queue, advanced one frame at a time.
//!
//! [`App::run_frame`] drains posted actions, re-runs layout and renders the
//! differences. Any [`Surface`] works; [`MemorySurface`](crate::render::MemorySurface)
//! allows testing without a real terminal.

use tracing::debug;

use crate::dispatch::{DispatchHandle, Dispatcher};
use crate::geometry::Region;
use crate::render::{Cell, RenderConfig, RenderError, RenderStats, Renderer, Surface, SurfaceError, TerminalSurface};
use crate::tree::ControlTree;

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Configuration for the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Rect the root control is arranged into. Defaults to the whole surface.
    pub root_rect: Option<Region>,
    /// Upper bound on posted actions run per frame; `None` runs all.
    pub max_actions_per_frame: Option<usize>,
    pub render: RenderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root_rect: None,
            max_actions_per_frame: Some(256),
            render: RenderConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root_rect(mut self, rect: Region) -> Self {
        self.root_rect = Some(rect);
        self
    }

    pub fn with_max_actions_per_frame(mut self, max: Option<usize>) -> Self {
        self.max_actions_per_frame = max;
        self
    }

    pub fn with_background(mut self, background: Cell) -> Self {
        self.render = self.render.with_background(background);
        self
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// What one call to [`App::run_frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    pub actions_run: usize,
    /// Whether there was a root to lay out.
    pub laid_out: bool,
    pub render: RenderStats,
}

/// The main application struct.
pub struct App<S: Surface> {
    /// The control tree. Mutate it directly on the UI thread, or post
    /// actions from elsewhere via [`App::handle`].
    pub tree: ControlTree,
    renderer: Renderer,
    dispatcher: Dispatcher<ControlTree>,
    surface: S,
    config: AppConfig,
}

impl App<TerminalSurface> {
    /// A full-screen app on stdout, sized to the current terminal. The
    /// terminal is restored when the app is dropped.
    pub fn stdout(config: AppConfig) -> Result<Self, SurfaceError> {
        let mut surface = TerminalSurface::stdout()?;
        surface.enter_fullscreen()?;
        Ok(Self::new(config, surface))
    }
}

impl<S: Surface> App<S> {
    pub fn new(config: AppConfig, surface: S) -> Self {
        Self {
            tree: ControlTree::new(),
            renderer: Renderer::new(config.render.clone()),
            dispatcher: Dispatcher::new(),
            surface,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// A `Send` handle for posting tree mutations from other threads.
    pub fn handle(&self) -> DispatchHandle<ControlTree> {
        self.dispatcher.handle()
    }

    /// Rect the root is laid out in this frame.
    pub fn root_rect(&self) -> Region {
        self.config
            .root_rect
            .unwrap_or_else(|| self.surface.size().to_region())
    }

    /// Run posted actions, lay out and render one frame.
    ///
    /// A render error leaves the tree and its layout intact; the next
    /// successful frame catches the surface up.
    pub fn run_frame(&mut self) -> Result<FrameReport, RenderError> {
        let actions_run = self
            .dispatcher
            .drain(&mut self.tree, self.config.max_actions_per_frame);
        let laid_out = self.tree.update_layout(self.root_rect());
        let render = self.renderer.render(&mut self.tree, &mut self.surface)?;
        debug!(actions_run, laid_out, cells_written = render.cells_written, "frame");
        Ok(FrameReport {
            actions_run,
            laid_out,
            render,
        })
    }

    /// Force the next frame to rewrite every cell, e.g. after the terminal
    /// was cleared or resized.
    pub fn redraw_all(&mut self) {
        self.renderer.invalidate_presented();
        if let Some(root) = self.tree.root() {
            self.tree.invalidate(root);
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
