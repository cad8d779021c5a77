//! Console Variables
//!
//! A global name → string-value registry. Each variable remembers who set it
//! last ([`SetBy`]) so that lower-priority writers cannot clobber a value set
//! by a higher-priority one.
//!
//! A registry can be bound to the state-owning thread. Once bound, writes from
//! any other thread are rejected; this is where thread affinity is enforced.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::RwLock;

/// Name of the buffer visualization target variable
pub const BUFFER_VISUALIZATION_TARGET: &str = "r.BufferVisualizationTarget";

/// Console variable errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CvarError {
    #[error("Console variable not found: {0}")]
    NotFound(String),

    #[error("Console variable '{0}' may only be written on the state-owning thread")]
    WrongThread(String),

    #[error("Console variable '{name}' was set by {current:?}, ignoring write by {attempted:?}")]
    Rejected {
        name: String,
        current: SetBy,
        attempted: SetBy,
    },
}

/// Who performed a write, lowest priority first
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SetBy {
    Constructor,
    Scalability,
    ProjectSetting,
    Code,
    Console,
}

/// A registered variable
#[derive(Debug, Clone)]
pub struct ConsoleVariable {
    value: String,
    help: String,
    set_by: SetBy,
}

impl ConsoleVariable {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn set_by(&self) -> SetBy {
        self.set_by
    }
}

/// String-keyed variable lookup consumed by the controller
pub trait NamedVariableRegistry: Send + Sync {
    /// Look up a variable
    fn find(&self, name: &str) -> Option<ConsoleVariable>;

    /// Write a variable
    fn set_variable(&self, name: &str, value: &str, set_by: SetBy) -> Result<(), CvarError>;
}

/// Console variable registry
#[derive(Default)]
pub struct ConsoleVariables {
    variables: RwLock<HashMap<String, ConsoleVariable>>,
    owner: RwLock<Option<ThreadId>>,
}

impl ConsoleVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared registry
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a variable with its default value. Re-registering keeps the
    /// existing value.
    pub fn register(&self, name: impl Into<String>, default: impl Into<String>, help: impl Into<String>) {
        let name = name.into();
        let mut variables = self.variables.write();
        if variables.contains_key(&name) {
            log::debug!("Console variable '{}' already registered", name);
            return;
        }
        variables.insert(
            name,
            ConsoleVariable {
                value: default.into(),
                help: help.into(),
                set_by: SetBy::Constructor,
            },
        );
    }

    /// Restrict writes to the given thread
    pub fn bind_owner(&self, owner: ThreadId) {
        *self.owner.write() = Some(owner);
    }

    /// Thread writes are restricted to, if bound
    pub fn owner(&self) -> Option<ThreadId> {
        *self.owner.read()
    }

    /// Current value of a variable
    pub fn get(&self, name: &str) -> Option<String> {
        self.variables.read().get(name).map(|v| v.value.clone())
    }

    pub fn len(&self) -> usize {
        self.variables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.read().is_empty()
    }
}

impl NamedVariableRegistry for ConsoleVariables {
    fn find(&self, name: &str) -> Option<ConsoleVariable> {
        self.variables.read().get(name).cloned()
    }

    fn set_variable(&self, name: &str, value: &str, set_by: SetBy) -> Result<(), CvarError> {
        if let Some(owner) = self.owner() {
            if thread::current().id() != owner {
                log::error!(
                    "Rejected write of '{}' from {:?}: not the state-owning thread",
                    name,
                    thread::current().name().unwrap_or("<unnamed>")
                );
                return Err(CvarError::WrongThread(name.to_string()));
            }
        }

        let mut variables = self.variables.write();
        let variable = variables
            .get_mut(name)
            .ok_or_else(|| CvarError::NotFound(name.to_string()))?;

        if set_by < variable.set_by {
            log::warn!(
                "Ignoring write of '{}' = '{}' by {:?}, last set by {:?}",
                name,
                value,
                set_by,
                variable.set_by
            );
            return Err(CvarError::Rejected {
                name: name.to_string(),
                current: variable.set_by,
                attempted: set_by,
            });
        }

        variable.value = value.to_string();
        variable.set_by = set_by;
        log::debug!("{} = {} ({:?})", name, value, set_by);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_set() {
        let cvars = ConsoleVariables::new();
        cvars.register(BUFFER_VISUALIZATION_TARGET, "", "Buffer to visualize");

        assert_eq!(cvars.get(BUFFER_VISUALIZATION_TARGET).as_deref(), Some(""));
        cvars
            .set_variable(BUFFER_VISUALIZATION_TARGET, "SceneDepth", SetBy::Code)
            .unwrap();

        let var = cvars.find(BUFFER_VISUALIZATION_TARGET).unwrap();
        assert_eq!(var.value(), "SceneDepth");
        assert_eq!(var.set_by(), SetBy::Code);
        assert_eq!(var.help(), "Buffer to visualize");
    }

    #[test]
    fn test_missing_variable() {
        let cvars = ConsoleVariables::new();
        let result = cvars.set_variable("r.Missing", "1", SetBy::Code);
        assert_eq!(result, Err(CvarError::NotFound("r.Missing".to_string())));
    }

    #[test]
    fn test_lower_priority_write_ignored() {
        let cvars = ConsoleVariables::new();
        cvars.register("r.Test", "a", "");
        cvars.set_variable("r.Test", "b", SetBy::Console).unwrap();

        let result = cvars.set_variable("r.Test", "c", SetBy::Code);
        assert!(matches!(result, Err(CvarError::Rejected { .. })));
        assert_eq!(cvars.get("r.Test").as_deref(), Some("b"));

        // Equal priority overwrites
        cvars.set_variable("r.Test", "d", SetBy::Console).unwrap();
        assert_eq!(cvars.get("r.Test").as_deref(), Some("d"));
    }

    #[test]
    fn test_reregister_keeps_value() {
        let cvars = ConsoleVariables::new();
        cvars.register("r.Test", "a", "");
        cvars.set_variable("r.Test", "b", SetBy::Code).unwrap();
        cvars.register("r.Test", "a", "");
        assert_eq!(cvars.get("r.Test").as_deref(), Some("b"));
        assert_eq!(cvars.len(), 1);
    }

    #[test]
    fn test_wrong_thread_rejected() {
        let cvars = ConsoleVariables::shared();
        cvars.register("r.Test", "a", "");
        cvars.bind_owner(thread::current().id());

        let remote = Arc::clone(&cvars);
        let result = thread::spawn(move || remote.set_variable("r.Test", "b", SetBy::Code))
            .join()
            .unwrap();

        assert_eq!(result, Err(CvarError::WrongThread("r.Test".to_string())));
        assert_eq!(cvars.get("r.Test").as_deref(), Some("a"));

        // Owner thread may write
        cvars.set_variable("r.Test", "b", SetBy::Code).unwrap();
        assert_eq!(cvars.get("r.Test").as_deref(), Some("b"));
    }
}
