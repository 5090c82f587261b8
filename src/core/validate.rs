//! Argument validation
//!
//! [`validate`] runs the ordered, fail-fast checks that turn parsed
//! arguments into a [`ValidatedConfig`]. It is the only way to obtain one.

use crate::cli::args::Mode;
use crate::config::Defaults;
use crate::core::inventory::Inventory;
use crate::error::{RelayError, Result};
use crate::utils::{fs::absolute_path, prompt::Prompter, vault::read_secret};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

const REMOTE_PASSWORD_PROMPT: &str = "Enter remote user password: ";
const BECOME_PASSWORD_PROMPT: &str = "Enter become password: ";

/// How remote commands gain privileges
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivilegeMode {
    None,
    Su { user: String },
    Become { user: String },
}

impl PrivilegeMode {
    /// Resolve from the toggles; `become` wins over `su`
    pub fn resolve(become_: bool, su: bool, user: &str) -> Self {
        if become_ {
            Self::Become {
                user: user.to_string(),
            }
        } else if su {
            Self::Su {
                user: user.to_string(),
            }
        } else {
            Self::None
        }
    }

    /// Prefix shown before the command, e.g. `"become root "`
    pub fn display_prefix(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Su { user } => format!("su {user} "),
            Self::Become { user } => format!("become {user} "),
        }
    }
}

/// Interactively entered passwords
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub remote_password: Option<String>,
    pub become_password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("remote_password", &self.remote_password.as_ref().map(|_| "<redacted>"))
            .field("become_password", &self.become_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Vault password, read once during validation
#[derive(Clone, Default, PartialEq, Eq)]
pub enum VaultSecret {
    #[default]
    Disabled,
    Secret(Vec<u8>),
}

impl fmt::Debug for VaultSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::Secret(_) => f.write_str("Secret(<redacted>)"),
        }
    }
}

/// Output options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayOptions {
    pub colors: bool,
    pub show_facts: bool,
}

/// Mode-specific part of a [`ValidatedConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeSettings {
    AdHoc {
        module_name: String,
        module_args: String,
        patterns: Vec<String>,
    },
    Playbook {
        playbook: PathBuf,
        module_args: String,
    },
}

/// Fully resolved invocation parameters
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    /// Absolute inventory path, or an inline host list as given
    pub inventory: PathBuf,
    pub module_path: Option<PathBuf>,
    pub timeout: u64,
    pub forks: u32,
    pub remote_user: String,
    pub remote_port: u16,
    pub private_key: Option<PathBuf>,
    pub privilege: PrivilegeMode,
    pub credentials: Credentials,
    pub vault: VaultSecret,
    pub display: DisplayOptions,
    pub mode: ModeSettings,
    _sealed: (),
}

/// Run every check in order and build the configuration
///
/// The `--version` short-circuit happens before this is called.
#[instrument(skip_all)]
pub fn validate<M: Mode>(
    args: &M,
    defaults: &Defaults,
    prompter: &dyn Prompter,
) -> Result<ValidatedConfig> {
    args.check_usage()?;

    let common = args.common();
    let inventory = common
        .inventory
        .clone()
        .or_else(|| defaults.inventory.clone())
        .ok_or_else(|| RelayError::validation("Could not detect default inventory path"))?;
    debug!("Using inventory: {}", inventory.display());

    if let Some(patterns) = args.host_patterns() {
        let hosts = Inventory::load(&inventory)?.list_hosts(patterns);
        if hosts.is_empty() {
            return Err(RelayError::validation("No hosts matched"));
        }
        debug!("Matched {} host(s): {:?}", hosts.len(), hosts);
    }

    let credentials = Credentials {
        remote_password: ask(prompter, common.ask_pass, REMOTE_PASSWORD_PROMPT)?,
        become_password: ask(prompter, common.ask_become_pass, BECOME_PASSWORD_PROMPT)?,
    };

    let become_user = common
        .become_user
        .clone()
        .unwrap_or_else(|| defaults.become_user.clone());
    let privilege = PrivilegeMode::resolve(common.become_, common.su, &become_user);
    if privilege != PrivilegeMode::None {
        info!("Privilege escalation: {}", privilege.display_prefix().trim_end());
    }

    let vault = match args.vault_password_file() {
        Some(path) => VaultSecret::Secret(read_secret(path)?),
        None => VaultSecret::Disabled,
    };

    Ok(ValidatedConfig {
        inventory: if inventory.exists() {
            absolute_path(&inventory)
        } else {
            inventory
        },
        module_path: common
            .module_path
            .clone()
            .or_else(|| defaults.module_path.clone()),
        timeout: common.timeout.unwrap_or(defaults.timeout),
        forks: common.forks.unwrap_or(defaults.forks),
        remote_user: common
            .user
            .clone()
            .unwrap_or_else(|| defaults.remote_user.clone()),
        remote_port: common.port.unwrap_or(defaults.remote_port),
        private_key: common
            .private_key
            .clone()
            .or_else(|| defaults.private_key.clone()),
        privilege,
        credentials,
        vault,
        display: DisplayOptions {
            colors: common.colors,
            show_facts: args.show_facts(),
        },
        mode: args.settings(defaults),
        _sealed: (),
    })
}

fn ask(prompter: &dyn Prompter, requested: bool, prompt: &str) -> Result<Option<String>> {
    if !requested {
        return Ok(None);
    }
    prompter
        .prompt_password(prompt)
        .map(Some)
        .map_err(|source| RelayError::Prompt { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::{AdHocArgs, PlaybookArgs};
    use clap::Parser;
    use std::cell::RefCell;
    use std::io;
    use tempfile::TempDir;

    #[derive(Default)]
    struct ScriptedPrompter {
        asked: RefCell<Vec<String>>,
        fail: bool,
    }

    impl Prompter for ScriptedPrompter {
        fn prompt_password(&self, prompt: &str) -> io::Result<String> {
            self.asked.borrow_mut().push(prompt.to_string());
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "closed"));
            }
            Ok(format!("pw{}", self.asked.borrow().len()))
        }
    }

    fn inventory_file(dir: &TempDir, content: &str) -> String {
        let path = dir.path().join("hosts");
        std::fs::write(&path, content).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_privilege_resolution() {
        assert_eq!(
            PrivilegeMode::resolve(true, true, "admin"),
            PrivilegeMode::Become {
                user: "admin".to_string()
            }
        );
        assert_eq!(
            PrivilegeMode::resolve(false, true, "admin"),
            PrivilegeMode::Su {
                user: "admin".to_string()
            }
        );
        assert_eq!(PrivilegeMode::resolve(false, false, "admin"), PrivilegeMode::None);

        assert_eq!(PrivilegeMode::resolve(true, false, "root").display_prefix(), "become root ");
        assert_eq!(PrivilegeMode::resolve(false, true, "root").display_prefix(), "su root ");
        assert_eq!(PrivilegeMode::None.display_prefix(), "");
    }

    #[test]
    fn test_missing_inventory_stops_before_prompting() {
        let prompter = ScriptedPrompter::default();
        let args = AdHocArgs::try_parse_from(["relay", "-k", "web"]).unwrap();

        let err = validate(&args, &Defaults::default(), &prompter).unwrap_err();
        assert_eq!(err.to_string(), "Could not detect default inventory path");
        assert!(prompter.asked.borrow().is_empty());
    }

    #[test]
    fn test_unmatched_pattern() {
        let temp_dir = TempDir::new().unwrap();
        let inventory = inventory_file(&temp_dir, "a\nb\n");
        let args = AdHocArgs::try_parse_from(["relay", "-i", &inventory, "c"]).unwrap();

        let err = validate(&args, &Defaults::default(), &ScriptedPrompter::default()).unwrap_err();
        assert!(matches!(err, RelayError::Validation { .. }));
        assert_eq!(err.to_string(), "No hosts matched");
    }

    #[test]
    fn test_adhoc_config() {
        let temp_dir = TempDir::new().unwrap();
        let inventory = inventory_file(&temp_dir, "[web]\nweb1\nweb2\n");
        let prompter = ScriptedPrompter::default();
        let args = AdHocArgs::try_parse_from([
            "relay", "-i", &inventory, "-K", "-S", "-s", "-U", "deploy", "-f", "8", "web",
        ])
        .unwrap();

        let config = validate(&args, &Defaults::default(), &prompter).unwrap();
        assert!(config.inventory.is_absolute());
        assert_eq!(config.forks, 8);
        assert_eq!(config.timeout, 10);
        assert_eq!(
            config.privilege,
            PrivilegeMode::Become {
                user: "deploy".to_string()
            }
        );
        assert_eq!(config.credentials.remote_password, None);
        assert_eq!(config.credentials.become_password.as_deref(), Some("pw1"));
        assert_eq!(*prompter.asked.borrow(), vec![BECOME_PASSWORD_PROMPT]);
        assert_eq!(config.vault, VaultSecret::Disabled);
        assert_eq!(
            config.mode,
            ModeSettings::AdHoc {
                module_name: "command".to_string(),
                module_args: String::new(),
                patterns: vec!["web".to_string()],
            }
        );
    }

    #[test]
    fn test_prompt_failure_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let inventory = inventory_file(&temp_dir, "a\n");
        let prompter = ScriptedPrompter {
            fail: true,
            ..Default::default()
        };
        let args = AdHocArgs::try_parse_from(["relay", "-i", &inventory, "-k"]).unwrap();

        let err = validate(&args, &Defaults::default(), &prompter).unwrap_err();
        assert!(matches!(err, RelayError::Prompt { .. }));
    }

    #[test]
    fn test_playbook_skips_pattern_check_and_reads_vault() {
        let temp_dir = TempDir::new().unwrap();
        let vault = temp_dir.path().join("vault-pass");
        std::fs::write(&vault, "s3cret\n").unwrap();
        let vault = vault.display().to_string();
        let args = PlaybookArgs::try_parse_from([
            "relay-playbook",
            "-i",
            "missing-host,",
            "--vault-password-file",
            &vault,
            "--show-facts",
            "site.yml",
        ])
        .unwrap();

        let config = validate(&args, &Defaults::default(), &ScriptedPrompter::default()).unwrap();
        assert_eq!(config.inventory, PathBuf::from("missing-host,"));
        assert_eq!(config.vault, VaultSecret::Secret(b"s3cret".to_vec()));
        assert!(config.display.show_facts);
        assert_eq!(
            config.mode,
            ModeSettings::Playbook {
                playbook: PathBuf::from("site.yml"),
                module_args: String::new(),
            }
        );
    }

    #[test]
    fn test_missing_playbook_checked_before_inventory() {
        let args = PlaybookArgs::try_parse_from(["relay-playbook"]).unwrap();
        let err = validate(&args, &Defaults::default(), &ScriptedPrompter::default()).unwrap_err();
        assert!(matches!(err, RelayError::Usage { .. }));
        assert_eq!(err.to_string(), "No playbook provided");
    }

    #[test]
    fn test_secrets_are_redacted() {
        let credentials = Credentials {
            remote_password: Some("hunter2".to_string()),
            become_password: None,
        };
        assert!(!format!("{credentials:?}").contains("hunter2"));
        assert!(!format!("{:?}", VaultSecret::Secret(b"hunter2".to_vec())).contains("hunter2"));
    }
}
