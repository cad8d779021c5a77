//! View Mode Configuration
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variable: `VIEWMODE_POLICY=fire_and_forget`
//! 2. Config file passed by the host (`--config <path>` or `VIEWMODE_CONFIG`)
//! 3. Built-in defaults
//!
//! # Example Config File
//!
//! ```toml
//! [mode]
//! initial = "lit"
//! policy = "await_applied"   # await_applied, fire_and_forget
//!
//! [buffer_visualization]
//! variable = "r.BufferVisualizationTarget"
//! depth_target = "SceneDepth"
//! normal_target = "WorldNormal"
//!
//! [host]
//! state_thread_name = "state-owner"
//! log_filter = "info"
//!
//! [commands.aliases]
//! vm = "setmode"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cvar::BUFFER_VISUALIZATION_TARGET;
use crate::flags::BufferTarget;
use crate::mode::Mode;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// When a mode switch counts as done relative to the state-owning thread
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyPolicy {
    /// Block the caller until the state-owning thread has applied the
    /// variable write, then commit
    #[default]
    AwaitApplied,

    /// Hand the write off and commit immediately; the write lands later
    FireAndForget,
}

impl fmt::Display for ConsistencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitApplied => write!(f, "await_applied"),
            Self::FireAndForget => write!(f, "fire_and_forget"),
        }
    }
}

impl FromStr for ConsistencyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "await_applied" | "await" | "sync" => Ok(Self::AwaitApplied),
            "fire_and_forget" | "async" => Ok(Self::FireAndForget),
            _ => Err(format!("Unknown consistency policy: {}", s)),
        }
    }
}

/// Mode state configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeSection {
    /// Mode reported before any switch
    pub initial: Mode,
    /// Consistency policy for state-owning thread handoff
    pub policy: ConsistencyPolicy,
}

impl Default for ModeSection {
    fn default() -> Self {
        Self {
            initial: Mode::Lit,
            policy: ConsistencyPolicy::AwaitApplied,
        }
    }
}

/// Buffer visualization variable and target identifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferVisualizationSection {
    /// Console variable selecting the visualized buffer
    pub variable: String,
    pub depth_target: String,
    pub normal_target: String,
}

impl Default for BufferVisualizationSection {
    fn default() -> Self {
        Self {
            variable: BUFFER_VISUALIZATION_TARGET.to_string(),
            depth_target: "SceneDepth".to_string(),
            normal_target: "WorldNormal".to_string(),
        }
    }
}

impl BufferVisualizationSection {
    /// Identifier written for a target
    pub fn identifier(&self, target: BufferTarget) -> &str {
        match target {
            BufferTarget::SceneDepth => &self.depth_target,
            BufferTarget::WorldNormal => &self.normal_target,
        }
    }
}

/// Host process settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSection {
    pub state_thread_name: String,
    /// `env_logger` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            state_thread_name: "state-owner".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

/// Command surface settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsSection {
    /// alias -> command name
    pub aliases: BTreeMap<String, String>,
}

/// Complete view mode configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewModeConfig {
    pub mode: ModeSection,
    pub buffer_visualization: BufferVisualizationSection,
    pub host: HostSection,
    pub commands: CommandsSection,
}

impl ViewModeConfig {
    /// Parse from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded view mode config from {}", path.display());
        Ok(config)
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(policy) = std::env::var("VIEWMODE_POLICY") {
            match policy.parse() {
                Ok(p) => {
                    self.mode.policy = p;
                    log::info!("Consistency policy from env: {}", self.mode.policy);
                }
                Err(e) => log::warn!("Ignoring VIEWMODE_POLICY: {}", e),
            }
        }
    }

    /// Check for values that would make the controller misbehave
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bv = &self.buffer_visualization;
        if bv.variable.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "buffer_visualization.variable must not be empty".to_string(),
            ));
        }
        if bv.depth_target.is_empty() || bv.normal_target.is_empty() {
            return Err(ConfigError::Invalid(
                "buffer visualization targets must not be empty".to_string(),
            ));
        }
        if self.host.state_thread_name.is_empty() {
            return Err(ConfigError::Invalid(
                "host.state_thread_name must not be empty".to_string(),
            ));
        }
        for (alias, target) in &self.commands.aliases {
            if alias.split_whitespace().count() != 1 || target.split_whitespace().count() != 1 {
                return Err(ConfigError::Invalid(format!(
                    "alias '{}' -> '{}' must be single words",
                    alias, target
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewModeConfig::default();
        assert_eq!(config.mode.initial, Mode::Lit);
        assert_eq!(config.mode.policy, ConsistencyPolicy::AwaitApplied);
        assert_eq!(config.buffer_visualization.variable, "r.BufferVisualizationTarget");
        assert_eq!(
            config.buffer_visualization.identifier(BufferTarget::SceneDepth),
            "SceneDepth"
        );
        assert_eq!(
            config.buffer_visualization.identifier(BufferTarget::WorldNormal),
            "WorldNormal"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full() {
        let config = ViewModeConfig::from_toml_str(
            r#"
            [mode]
            initial = "object"
            policy = "fire_and_forget"

            [buffer_visualization]
            variable = "r.VisTarget"
            depth_target = "Depth"

            [host]
            state_thread_name = "game"

            [commands.aliases]
            vm = "setmode"
            "#,
        )
        .unwrap();

        assert_eq!(config.mode.initial, Mode::Object);
        assert_eq!(config.mode.policy, ConsistencyPolicy::FireAndForget);
        assert_eq!(config.buffer_visualization.variable, "r.VisTarget");
        assert_eq!(config.buffer_visualization.depth_target, "Depth");
        assert_eq!(config.buffer_visualization.normal_target, "WorldNormal");
        assert_eq!(config.host.state_thread_name, "game");
        assert_eq!(config.host.log_filter, "info");
        assert_eq!(config.commands.aliases.get("vm").map(String::as_str), Some("setmode"));
    }

    #[test]
    fn test_parse_empty() {
        let config = ViewModeConfig::from_toml_str("").unwrap();
        assert_eq!(config.mode.initial, Mode::Lit);
    }

    #[test]
    fn test_parse_rejects_unknown_mode() {
        let result = ViewModeConfig::from_toml_str("[mode]\ninitial = \"wireframe\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_rejects_empty_variable() {
        let result = ViewModeConfig::from_toml_str("[buffer_visualization]\nvariable = \"\"\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("sync".parse::<ConsistencyPolicy>(), Ok(ConsistencyPolicy::AwaitApplied));
        assert_eq!("Fire_And_Forget".parse::<ConsistencyPolicy>(), Ok(ConsistencyPolicy::FireAndForget));
        assert!("later".parse::<ConsistencyPolicy>().is_err());
        assert_eq!(ConsistencyPolicy::FireAndForget.to_string(), "fire_and_forget");
    }

    #[test]
    fn test_load_missing_file() {
        let result = ViewModeConfig::load("/nonexistent/viewmode.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
