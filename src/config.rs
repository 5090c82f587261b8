//! Engine defaults
//!
//! Every flag left unset on the command line falls back to a value from
//! [`Defaults`]. The binaries build it from the environment; tests build it
//! directly.

use crate::utils::env::EnvUtils;
use std::path::{Path, PathBuf};

/// Inventory used when nothing else is configured
pub const SYSTEM_INVENTORY: &str = "/etc/ansible/hosts";

/// Host pattern matching every host
pub const MATCH_ALL_PATTERN: &str = "all";

/// Environment variable enabling debug logging
pub const DEBUG_ENV: &str = "ANSIBLE_RELAY_DEBUG";

/// Fallback values for unset flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    /// Detected inventory, if any
    pub inventory: Option<PathBuf>,
    /// Module search path
    pub module_path: Option<PathBuf>,
    /// Ad-hoc module
    pub module_name: String,
    /// Ad-hoc module arguments
    pub module_args: String,
    /// Connection timeout in seconds
    pub timeout: u64,
    /// Parallel host connections
    pub forks: u32,
    /// Remote SSH port
    pub remote_port: u16,
    /// Remote login user
    pub remote_user: String,
    /// Privilege escalation target user
    pub become_user: String,
    /// SSH private key
    pub private_key: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            inventory: None,
            module_path: None,
            module_name: "command".to_string(),
            module_args: String::new(),
            timeout: 10,
            forks: 5,
            remote_port: 22,
            remote_user: "root".to_string(),
            become_user: "root".to_string(),
            private_key: None,
        }
    }
}

impl Defaults {
    /// Defaults with the usual `ANSIBLE_*` environment overrides applied
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            inventory: detect_inventory(Path::new(SYSTEM_INVENTORY)),
            module_path: EnvUtils::get_var("ANSIBLE_LIBRARY").map(PathBuf::from),
            module_name: EnvUtils::get_var_or_default("ANSIBLE_MODULE_NAME", &base.module_name),
            module_args: EnvUtils::get_var_or_default("ANSIBLE_MODULE_ARGS", &base.module_args),
            timeout: EnvUtils::get_var_parsed("ANSIBLE_TIMEOUT").unwrap_or(base.timeout),
            forks: EnvUtils::get_var_parsed("ANSIBLE_FORKS").unwrap_or(base.forks),
            remote_port: EnvUtils::get_var_parsed("ANSIBLE_REMOTE_PORT").unwrap_or(base.remote_port),
            remote_user: EnvUtils::first_var(&["ANSIBLE_REMOTE_USER", "USER", "LOGNAME"])
                .unwrap_or(base.remote_user),
            become_user: EnvUtils::get_var_or_default("ANSIBLE_BECOME_USER", &base.become_user),
            private_key: EnvUtils::get_var("ANSIBLE_PRIVATE_KEY_FILE").map(PathBuf::from),
        }
    }
}

/// Whether debug logging was requested
pub fn debug_requested() -> bool {
    EnvUtils::is_enabled(DEBUG_ENV)
}

/// Inventory from `ANSIBLE_INVENTORY`/`ANSIBLE_HOSTS`, else `system` if it exists
pub fn detect_inventory(system: &Path) -> Option<PathBuf> {
    EnvUtils::first_var(&["ANSIBLE_INVENTORY", "ANSIBLE_HOSTS"])
        .map(PathBuf::from)
        .or_else(|| system.exists().then(|| system.to_path_buf()))
}
