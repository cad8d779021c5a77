//! In-process host collaborators
//!
//! A viewport with a show-flag surface and a slot holding the active one.
//! Hosts with their own renderer implement [`RenderFlagSurface`] and
//! [`RenderTargetProvider`] directly instead.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::cvar::{ConsoleVariables, BUFFER_VISUALIZATION_TARGET};
use crate::flags::{
    RenderFlagSurface, RenderTargetProvider, ShowFlags, VertexColorViewMode, ViewModeIndex,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ViewportState {
    show_flags: ShowFlags,
    view_mode: ViewModeIndex,
    vertex_color_mode: VertexColorViewMode,
}

/// Game viewport show-flag state
#[derive(Debug, Default)]
pub struct Viewport {
    state: RwLock<ViewportState>,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Snapshot of the show flags
    pub fn show_flags(&self) -> ShowFlags {
        self.state.read().show_flags
    }

    /// Whether a flag is currently set
    pub fn is_enabled(&self, flag: ShowFlags) -> bool {
        self.state.read().show_flags.contains(flag)
    }

    pub fn view_mode(&self) -> ViewModeIndex {
        self.state.read().view_mode
    }

    pub fn vertex_color_mode(&self) -> VertexColorViewMode {
        self.state.read().vertex_color_mode
    }
}

impl RenderFlagSurface for Viewport {
    fn set_flag(&self, flag: ShowFlags, enabled: bool) {
        self.state.write().show_flags.set(flag, enabled);
    }

    fn set_view_mode_index(&self, index: ViewModeIndex) {
        let mut state = self.state.write();
        state.view_mode = index;
        state.show_flags.apply_view_mode(index);
    }

    fn set_vertex_color_view_mode(&self, mode: VertexColorViewMode) {
        self.state.write().vertex_color_mode = mode;
    }
}

/// Slot holding the active viewport, if any
#[derive(Default)]
pub struct GameViewport {
    active: RwLock<Option<Arc<Viewport>>>,
}

impl GameViewport {
    /// Empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot with an active viewport
    pub fn with_viewport(viewport: Arc<Viewport>) -> Self {
        Self {
            active: RwLock::new(Some(viewport)),
        }
    }

    /// Replace the active viewport, returning the previous one
    pub fn set_active(&self, viewport: Option<Arc<Viewport>>) -> Option<Arc<Viewport>> {
        std::mem::replace(&mut *self.active.write(), viewport)
    }

    pub fn active(&self) -> Option<Arc<Viewport>> {
        self.active.read().clone()
    }
}

impl RenderTargetProvider for GameViewport {
    fn active_target(&self) -> Option<Arc<dyn RenderFlagSurface>> {
        self.active
            .read()
            .clone()
            .map(|viewport| viewport as Arc<dyn RenderFlagSurface>)
    }
}

/// Register the buffer visualization target variable under `name`
pub fn register_buffer_visualization(cvars: &ConsoleVariables, name: &str) {
    cvars.register(
        name,
        "",
        "Buffer visualization target shown when the VisualizeBuffer show flag is set",
    );
}

/// Registry preloaded with the default buffer visualization variable
pub fn default_console_variables() -> Arc<ConsoleVariables> {
    let cvars = ConsoleVariables::shared();
    register_buffer_visualization(&cvars, BUFFER_VISUALIZATION_TARGET);
    cvars
}
