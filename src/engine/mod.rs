//! Automation engine boundary
//!
//! The engine is the component that actually connects to hosts. The relay
//! hands it a flat [`EngineConfig`] and gets back an [`EngineResult`] or an
//! [`EngineError`] carrying a human-readable message.

pub mod command;
pub mod report;
pub mod results;

pub use command::CommandEngine;

use crate::core::cancel::CancelToken;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Configuration keys understood by engines
pub mod keys {
    pub const HOST_LIST: &str = "host_list";
    pub const MODULE_PATH: &str = "module_path";
    pub const MODULE_NAME: &str = "module_name";
    pub const MODULE_ARGS: &str = "module_args";
    pub const FORKS: &str = "forks";
    pub const TIMEOUT: &str = "timeout";
    pub const PATTERN: &str = "pattern";
    pub const REMOTE_USER: &str = "remote_user";
    pub const REMOTE_PASS: &str = "remote_pass";
    pub const REMOTE_PORT: &str = "remote_port";
    pub const PRIVATE_KEY_FILE: &str = "private_key_file";
    pub const SU: &str = "su";
    pub const BECOME: &str = "become";
    pub const BECOME_USER: &str = "become_user";
    pub const BECOME_PASS: &str = "become_pass";
    pub const SHOW_COLORS: &str = "show_colors";
    pub const PLAYBOOK: &str = "playbook";
    pub const TRANSPORT: &str = "transport";
    pub const EXTRA_VARS: &str = "extra_vars";
    pub const ONLY_TAGS: &str = "only_tags";
    pub const SKIP_TAGS: &str = "skip_tags";
    pub const SUBSET: &str = "subset";
    pub const INVENTORY: &str = "inventory";
    pub const CHECK: &str = "check";
    pub const DIFF: &str = "diff";
    pub const ANY_ERRORS_FATAL: &str = "any_errors_fatal";
    pub const VAULT_PASSWORD: &str = "vault_password";
    pub const FORCE_HANDLERS: &str = "force_handlers";
    pub const SHOW_FACTS: &str = "show_facts";
}

/// A single configuration value
#[derive(Clone, PartialEq, Eq)]
pub enum EngineValue {
    /// Explicitly absent
    Unset,
    Flag(bool),
    Int(u64),
    Text(String),
    List(Vec<String>),
    /// Sensitive payload; never printed
    Secret(Vec<u8>),
}

impl fmt::Debug for EngineValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("Unset"),
            Self::Flag(value) => write!(f, "Flag({value})"),
            Self::Int(value) => write!(f, "Int({value})"),
            Self::Text(value) => write!(f, "Text({value:?})"),
            Self::List(values) => write!(f, "List({values:?})"),
            Self::Secret(_) => f.write_str("Secret(<redacted>)"),
        }
    }
}

impl From<bool> for EngineValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<u64> for EngineValue {
    fn from(value: u64) -> Self {
        Self::Int(value)
    }
}

impl From<String> for EngineValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for EngineValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<String>> for EngineValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl<T: Into<Self>> From<Option<T>> for EngineValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unset, Into::into)
    }
}

/// Flat mapping handed to [`Engine::run`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    entries: BTreeMap<&'static str, EngineValue>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: &'static str, value: impl Into<EngineValue>) -> Self {
        self.entries.insert(key, value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&EngineValue> {
        self.entries.get(key)
    }

    /// Whether `key` is present with a value other than [`EngineValue::Unset`]
    pub fn is_set(&self, key: &str) -> bool {
        !matches!(self.get(key), None | Some(EngineValue::Unset))
    }

    /// Text or integer value rendered as a string
    pub fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            EngineValue::Text(value) => Some(value.clone()),
            EngineValue::Int(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Flag value; anything but `Flag(true)` is false
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Some(EngineValue::Flag(true)))
    }

    pub fn list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(EngineValue::List(values)) => values.clone(),
            Some(EngineValue::Text(value)) => vec![value.clone()],
            _ => Vec::new(),
        }
    }

    pub fn secret(&self, key: &str) -> Option<&[u8]> {
        match self.get(key)? {
            EngineValue::Secret(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Successful engine run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineResult {
    /// Engine process exit code; non-zero when some hosts failed
    pub exit_code: i32,
    /// Report to show the user
    pub output: String,
}

/// Engine failure
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{message}")]
    Failed { message: String },

    #[error("User interrupted execution")]
    Cancelled,

    #[error("Unable to run {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: crate::error::RelayError,
    },
}

impl EngineError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// The automation engine
pub trait Engine: Send + Sync {
    /// Version label shown next to the relay's own version, e.g. `ansible 2.9.27`
    fn version(&self) -> String;

    /// Run to completion, honoring `cancel`
    fn run(&self, config: &EngineConfig, cancel: &CancelToken) -> Result<EngineResult, EngineError>;
}
