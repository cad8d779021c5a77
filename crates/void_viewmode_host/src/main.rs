//! Headless view mode host
//!
//! Boots a state-owning thread and an in-process viewport, then dispatches
//! one command per stdin line:
//!
//! ```text
//! $ printf 'setmode depth\ngetmode\n' | viewmode --config viewmode.toml
//! OK
//! OK depth
//! ```
//!
//! Run with: cargo run -p void_viewmode_host -- [--config <path>]

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use void_viewmode::host::{register_buffer_visualization, GameViewport, Viewport};
use void_viewmode::{
    register_view_mode_commands, CommandRegistry, ConsoleVariables, ModeController, StateThread,
    ViewModeConfig,
};

fn main() -> Result<(), Box<dyn Error>> {
    let config = load_config()?;

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.host.log_filter.as_str()),
    )
    .init();

    log::info!(
        "View mode host starting (initial mode: {}, policy: {})",
        config.mode.initial,
        config.mode.policy
    );

    let state_thread = StateThread::spawn(config.host.state_thread_name.clone())?;

    let cvars = ConsoleVariables::shared();
    register_buffer_visualization(&cvars, &config.buffer_visualization.variable);
    cvars.bind_owner(state_thread.thread_id());

    let viewport = Viewport::shared();
    let controller = Arc::new(
        ModeController::new(
            Arc::new(GameViewport::with_viewport(Arc::clone(&viewport))),
            Arc::new(state_thread.scheduler()),
            cvars.clone(),
        )
        .with_config(&config),
    );

    let mut registry = CommandRegistry::new();
    register_view_mode_commands(&mut registry, controller);
    for (alias, target) in &config.commands.aliases {
        registry.add_alias(alias, target);
    }
    for name in registry.command_names() {
        if let Some(handler) = registry.get_handler(name) {
            log::info!("  {:10} - {} ({})", name, handler.description(), handler.usage());
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let result = registry.dispatch(&line);
        match (result.is_success(), result.message()) {
            (true, Some(message)) => writeln!(stdout, "OK {}", message)?,
            (true, None) => writeln!(stdout, "OK")?,
            (false, message) => writeln!(stdout, "ERROR {}", message.unwrap_or("command failed"))?,
        }
        stdout.flush()?;
    }

    state_thread.flush()?;
    log::info!(
        "Final state: flags [{}], {} = {:?}",
        viewport.show_flags(),
        config.buffer_visualization.variable,
        cvars.get(&config.buffer_visualization.variable).unwrap_or_default()
    );
    state_thread.shutdown();
    Ok(())
}

/// Resolve config from `--config <path>`, then `VIEWMODE_CONFIG`, then defaults
fn load_config() -> Result<ViewModeConfig, Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let mut path = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                path = Some(args.next().ok_or("--config requires a path")?);
            }
            other => return Err(format!("Unknown argument: {}", other).into()),
        }
    }

    let path = path.or_else(|| std::env::var("VIEWMODE_CONFIG").ok());
    let mut config = match path {
        Some(path) => ViewModeConfig::load(path)?,
        None => ViewModeConfig::default(),
    };
    config.apply_env();
    Ok(config)
}
