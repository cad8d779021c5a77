//! Command surface
//!
//! Named commands a host console (or network command channel) dispatches
//! into: `setmode <name>` and `getmode`. Results are plain values so the
//! caller can render them without translation.

use std::collections::HashMap;
use std::sync::Arc;

use crate::controller::ModeController;
use crate::ViewModeError;

/// Command error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Unclosed quote")]
    UnclosedQuote,

    #[error(transparent)]
    ViewMode(#[from] ViewModeError),
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name
    pub name: String,
    /// Positional arguments
    pub args: Vec<String>,
}

impl Command {
    /// Create a new command
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Add a positional argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Split a line into name and arguments. Whitespace separates words;
    /// double quotes group them. Returns `Ok(None)` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut words = Vec::new();
        let mut chars = line.trim().chars().peekable();

        while let Some(&c) = chars.peek() {
            match c {
                ' ' | '\t' => {
                    chars.next();
                }
                '"' => {
                    chars.next();
                    let mut word = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '"' {
                            closed = true;
                            break;
                        }
                        word.push(c);
                    }
                    if !closed {
                        return Err(CommandError::UnclosedQuote);
                    }
                    words.push(word);
                }
                _ => {
                    let mut word = String::new();
                    while let Some(&c) = chars.peek() {
                        if c == ' ' || c == '\t' || c == '"' {
                            break;
                        }
                        word.push(c);
                        chars.next();
                    }
                    words.push(word);
                }
            }
        }

        let mut words = words.into_iter();
        Ok(words.next().map(|name| Self {
            name,
            args: words.collect(),
        }))
    }
}

/// Result of command execution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandResult {
    success: bool,
    message: Option<String>,
    data: Option<serde_json::Value>,
}

impl CommandResult {
    /// Create a successful result
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
            data: None,
        }
    }

    /// Create a failure result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Create result with message
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Set structured data
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }
}

/// Command handler trait
pub trait CommandHandler: Send + Sync {
    /// Get the command name
    fn name(&self) -> &str;

    /// Get command description
    fn description(&self) -> &str;

    /// Get usage string
    fn usage(&self) -> &str {
        self.name()
    }

    /// Execute the command
    fn execute(&self, cmd: &Command) -> Result<CommandResult, CommandError>;

    /// Get completions for the first argument
    fn complete(&self, _partial: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Name → handler dispatch table
#[derive(Default)]
pub struct CommandRegistry {
    /// Registered command handlers, keyed by lowercase name
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
    /// Command aliases
    aliases: HashMap<String, String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command handler
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) {
        self.handlers.insert(handler.name().to_lowercase(), handler);
    }

    /// Unregister a command handler
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.remove(&name.to_lowercase())
    }

    /// Add an alias
    pub fn add_alias(&mut self, alias: &str, target: &str) {
        self.aliases.insert(alias.to_lowercase(), target.to_lowercase());
    }

    /// Get handler for a command, resolving aliases
    pub fn get_handler(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        let name = name.to_lowercase();
        let resolved = self.aliases.get(&name).unwrap_or(&name);
        self.handlers.get(resolved).cloned()
    }

    /// Execute a command
    pub fn execute(&self, cmd: &Command) -> Result<CommandResult, CommandError> {
        let handler = self
            .get_handler(&cmd.name)
            .ok_or_else(|| CommandError::UnknownCommand(cmd.name.clone()))?;
        handler.execute(cmd)
    }

    /// Parse and execute a line, folding errors into a failed result
    pub fn dispatch(&self, line: &str) -> CommandResult {
        let result = Command::parse(line).and_then(|cmd| match cmd {
            Some(cmd) => self.execute(&cmd),
            None => Ok(CommandResult::success()),
        });

        result.unwrap_or_else(|e| CommandResult::failure(e.to_string()))
    }

    /// Get completions for partial input: command names for the first word,
    /// handler completions after it
    pub fn complete(&self, partial: &str) -> Vec<String> {
        let mut completions: Vec<String> = match partial.split_once(' ') {
            Some((name, rest)) => match self.get_handler(name) {
                Some(handler) => handler
                    .complete(rest.trim_start())
                    .into_iter()
                    .map(|arg| format!("{} {}", name, arg))
                    .collect(),
                None => Vec::new(),
            },
            None => {
                let partial_lower = partial.to_lowercase();
                self.handlers
                    .keys()
                    .chain(self.aliases.keys())
                    .filter(|name| name.starts_with(&partial_lower))
                    .cloned()
                    .collect()
            }
        };

        completions.sort();
        completions.dedup();
        completions
    }

    /// Get all command names
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}

/// `setmode <name>` - switch view mode
pub struct SetModeCommand {
    controller: Arc<ModeController>,
}

impl SetModeCommand {
    pub fn new(controller: Arc<ModeController>) -> Self {
        Self { controller }
    }
}

impl CommandHandler for SetModeCommand {
    fn name(&self) -> &str {
        "setmode"
    }

    fn description(&self) -> &str {
        "Set the view mode"
    }

    fn usage(&self) -> &str {
        "setmode <lit|unlit|depth|normal|object>"
    }

    fn execute(&self, cmd: &Command) -> Result<CommandResult, CommandError> {
        self.controller.set_mode(cmd.args.as_slice())?;
        Ok(CommandResult::success())
    }

    fn complete(&self, partial: &str) -> Vec<String> {
        let partial = partial.to_lowercase();
        self.controller
            .registry()
            .names()
            .filter(|name| name.starts_with(&partial))
            .map(String::from)
            .collect()
    }
}

/// `getmode` - report the active view mode
pub struct GetModeCommand {
    controller: Arc<ModeController>,
}

impl GetModeCommand {
    pub fn new(controller: Arc<ModeController>) -> Self {
        Self { controller }
    }
}

impl CommandHandler for GetModeCommand {
    fn name(&self) -> &str {
        "getmode"
    }

    fn description(&self) -> &str {
        "Show the current view mode"
    }

    fn execute(&self, cmd: &Command) -> Result<CommandResult, CommandError> {
        if !cmd.args.is_empty() {
            return Err(CommandError::InvalidArguments(format!(
                "getmode takes no arguments, got {}",
                cmd.args.len()
            )));
        }
        let mode = self.controller.mode_name();
        Ok(CommandResult::with_message(mode).with_data(serde_json::json!(mode)))
    }
}

/// Register `setmode` and `getmode` against a controller
pub fn register_view_mode_commands(registry: &mut CommandRegistry, controller: Arc<ModeController>) {
    registry.register(Arc::new(SetModeCommand::new(Arc::clone(&controller))));
    registry.register(Arc::new(GetModeCommand::new(controller)));
}
