//! # Void View Mode
//!
//! Command-driven visualization mode switching for Void Engine viewports:
//! - `lit`, `unlit`: standard shading with or without materials
//! - `depth`, `normal`: buffer visualization of scene depth / world normals
//! - `object`: flat vertex colors, no lighting or post-processing
//!
//! ## Architecture
//!
//! ```text
//! "setmode depth" ──► CommandRegistry ──► ModeController ──► ModeRegistry
//!                                              │
//!                     ┌────────────────────────┴──────────────┐
//!                     ▼                                       ▼
//!            RenderFlagSurface                     ThreadAffineScheduler
//!            (show flags)                          (state-owning thread)
//!                                                             │
//!                                                             ▼
//!                                                   NamedVariableRegistry
//! ```
//!
//! The renderer, its viewport and its console variables belong to the host;
//! this crate consumes them through the traits in [`flags`], [`cvar`] and
//! [`scheduler`]. [`host`] has in-process implementations.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use void_viewmode::host::{default_console_variables, GameViewport, Viewport};
//! use void_viewmode::scheduler::StateThread;
//! use void_viewmode::{Mode, ModeController};
//!
//! let state_thread = StateThread::spawn("state-owner").unwrap();
//! let viewport = Viewport::shared();
//! let controller = ModeController::new(
//!     Arc::new(GameViewport::with_viewport(viewport)),
//!     Arc::new(state_thread.scheduler()),
//!     default_console_variables(),
//! );
//!
//! controller.set_mode(&["Depth"]).unwrap();
//! assert_eq!(controller.get_mode(), Mode::Depth);
//! ```

pub mod command;
pub mod config;
pub mod controller;
pub mod cvar;
pub mod flags;
pub mod host;
pub mod mode;
pub mod scheduler;

pub use command::{
    register_view_mode_commands, Command, CommandError, CommandHandler, CommandRegistry,
    CommandResult,
};
pub use config::{ConfigError, ConsistencyPolicy, ViewModeConfig};
pub use controller::ModeController;
pub use cvar::{ConsoleVariables, CvarError, NamedVariableRegistry, SetBy};
pub use flags::{RenderFlagSurface, RenderTargetProvider, ShowFlags};
pub use mode::{FlagMutation, Mode, ModeHandler, ModeRegistry, Recipe};
pub use scheduler::{Completion, SchedulerError, StateThread, Task, TaskQueue, ThreadAffineScheduler};

use thiserror::Error;

/// View mode errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewModeError {
    #[error("Arguments to SetMode are incorrect: expected 1, got {0}")]
    InvalidArguments(usize),

    #[error("Can not set view mode to '{name}' (valid modes: {valid})")]
    UnknownMode { name: String, valid: String },

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}
