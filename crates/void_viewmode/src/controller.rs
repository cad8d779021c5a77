//! Mode controller
//!
//! Owns the current mode and the dispatch path for switching it:
//!
//! ```text
//! set_mode(args) ──► validate ──► ModeRegistry ──► Recipe
//!                                                    │
//!                               one task on the state-owning thread
//!                                                    │
//!            ┌───────────────────────────────────────┤
//!            ▼                                       ▼
//!   show flags / view mode                visualization target write
//!   (render target surface)               (console variable)
//!            │                                       │
//!            └──────────────► commit ◄───────────────┘
//! ```
//!
//! Setters are serialized so concurrent `set_mode` calls never lose an update
//! and commit in submission order. Readers never wait on a setter.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::{BufferVisualizationSection, ConsistencyPolicy, ViewModeConfig};
use crate::cvar::{CvarError, NamedVariableRegistry, SetBy};
use crate::flags::{RenderFlagSurface, RenderTargetProvider};
use crate::mode::{FlagMutation, Mode, ModeRegistry, Recipe};
use crate::scheduler::ThreadAffineScheduler;
use crate::ViewModeError;

/// View mode state machine and dispatcher
pub struct ModeController {
    registry: ModeRegistry,
    current: RwLock<Mode>,
    /// Serializes apply + commit
    apply_lock: Mutex<()>,
    targets: Arc<dyn RenderTargetProvider>,
    scheduler: Arc<dyn ThreadAffineScheduler>,
    variables: Arc<dyn NamedVariableRegistry>,
    buffer_visualization: BufferVisualizationSection,
    policy: ConsistencyPolicy,
}

impl ModeController {
    /// Create a controller with default configuration
    pub fn new(
        targets: Arc<dyn RenderTargetProvider>,
        scheduler: Arc<dyn ThreadAffineScheduler>,
        variables: Arc<dyn NamedVariableRegistry>,
    ) -> Self {
        let defaults = ViewModeConfig::default();
        Self {
            registry: ModeRegistry::new(),
            current: RwLock::new(defaults.mode.initial),
            apply_lock: Mutex::new(()),
            targets,
            scheduler,
            variables,
            buffer_visualization: defaults.buffer_visualization,
            policy: defaults.mode.policy,
        }
    }

    /// Apply configuration. The initial mode is recorded as-is; no handler
    /// runs for it.
    pub fn with_config(mut self, config: &ViewModeConfig) -> Self {
        *self.current.get_mut() = config.mode.initial;
        self.buffer_visualization = config.buffer_visualization.clone();
        self.policy = config.mode.policy;
        self
    }

    pub fn with_policy(mut self, policy: ConsistencyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ConsistencyPolicy {
        self.policy
    }

    pub fn registry(&self) -> &ModeRegistry {
        &self.registry
    }

    /// Switch mode from raw command arguments.
    ///
    /// Exactly one argument naming a mode (any case) is accepted. On error the
    /// current mode is unchanged.
    pub fn set_mode<S: AsRef<str>>(&self, args: &[S]) -> Result<Mode, ViewModeError> {
        let [name] = args else {
            log::warn!("SetMode expects 1 argument, got {}", args.len());
            return Err(ViewModeError::InvalidArguments(args.len()));
        };
        let name = name.as_ref();
        log::debug!("Run SetMode {}", name);

        let mode = self.registry.resolve(name).ok_or_else(|| {
            log::warn!("Unrecognized view mode {}", name);
            ViewModeError::UnknownMode {
                name: name.to_string(),
                valid: self.registry.names_joined(),
            }
        })?;

        self.apply(mode)?;
        Ok(mode)
    }

    /// Apply a mode's recipe and commit it.
    ///
    /// The target and recipe are resolved on the calling thread; the recipe
    /// itself runs as one task on the state-owning thread. Under
    /// [`ConsistencyPolicy::AwaitApplied`] the commit waits for that task.
    ///
    /// Setters hold an internal lock while waiting. A task already running on
    /// the state-owning thread must not call `apply` on this controller while
    /// another thread is waiting on it, or both block forever.
    ///
    /// # Panics
    ///
    /// Panics if the render target provider has no active target.
    pub fn apply(&self, mode: Mode) -> Result<(), ViewModeError> {
        let _guard = self.apply_lock.lock();

        let Some(target) = self.targets.active_target() else {
            panic!("view mode '{}' dispatched with no active render target", mode);
        };
        let recipe = self.registry.recipe(mode);
        let variable = recipe.visualization_target_write().map(|buffer| {
            (
                self.buffer_visualization.variable.clone(),
                self.buffer_visualization.identifier(buffer).to_string(),
            )
        });
        let variables = Arc::clone(&self.variables);

        // Nothing is touched if the state-owning thread is gone
        let completion = self.scheduler.schedule(Box::new(move || {
            apply_recipe(target.as_ref(), &recipe);
            if let Some((name, value)) = variable {
                write_visualization_target(variables.as_ref(), &name, &value);
            }
        }))?;

        match self.policy {
            ConsistencyPolicy::AwaitApplied => completion.wait()?,
            ConsistencyPolicy::FireAndForget => drop(completion),
        }

        *self.current.write() = mode;
        log::info!("View mode set to {}", mode);
        Ok(())
    }

    /// Currently active mode
    pub fn get_mode(&self) -> Mode {
        let mode = *self.current.read();
        log::debug!("Run GetMode, the mode is {}", mode);
        mode
    }

    /// Canonical name of the active mode
    pub fn mode_name(&self) -> &'static str {
        self.get_mode().name()
    }
}

/// Run a recipe's surface mutations in order. State-owning thread only.
fn apply_recipe(target: &dyn RenderFlagSurface, recipe: &Recipe) {
    for mutation in recipe.mutations() {
        match *mutation {
            FlagMutation::ViewMode(index) => target.set_view_mode_index(index),
            FlagMutation::Flag(flag, enabled) => target.set_flag(flag, enabled),
            FlagMutation::VertexColorMode(channel) => target.set_vertex_color_view_mode(channel),
            FlagMutation::VisualizationTarget(_) => {}
        }
    }
}

fn write_visualization_target(variables: &dyn NamedVariableRegistry, name: &str, value: &str) {
    match variables.set_variable(name, value, SetBy::Code) {
        Ok(()) => {}
        Err(CvarError::NotFound(_)) => {
            log::warn!("The buffer visualization is not correctly configured: '{}' is not registered", name);
        }
        Err(e) => log::warn!("Failed to set buffer visualization target: {}", e),
    }
}
