//! Command-line argument declarations for both modes

use crate::config::{Defaults, MATCH_ALL_PATTERN};
use crate::core::validate::ModeSettings;
use crate::error::{RelayError, Result};
use clap::Parser;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Flags shared by ad-hoc and playbook mode
#[derive(clap::Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Show version
    #[arg(long)]
    pub version: bool,

    /// Inventory path
    #[arg(short = 'i', long)]
    pub inventory: Option<PathBuf>,

    /// Ansible module path
    #[arg(short = 'M', long = "module-path")]
    pub module_path: Option<PathBuf>,

    /// Response timeout
    #[arg(short = 'T', long)]
    pub timeout: Option<u64>,

    /// Remote user
    #[arg(short = 'u', long)]
    pub user: Option<String>,

    /// Become user
    #[arg(short = 'U', long = "become-user")]
    pub become_user: Option<String>,

    /// Private key file
    #[arg(long = "private-key")]
    pub private_key: Option<PathBuf>,

    /// Ansible concurrency
    #[arg(short = 'f', long)]
    pub forks: Option<u32>,

    /// Remote port
    #[arg(long)]
    pub port: Option<u16>,

    /// Run operations with su
    #[arg(short = 'S', long)]
    pub su: bool,

    /// Run operations with become (nopasswd)
    #[arg(short = 's', long = "become")]
    pub become_: bool,

    /// Ask for SSH password
    #[arg(short = 'k', long = "ask-pass")]
    pub ask_pass: bool,

    /// Ask for become password
    #[arg(short = 'K', long = "ask-become-pass")]
    pub ask_become_pass: bool,

    /// Show output with colors
    #[arg(short = 'c', long)]
    pub colors: bool,
}

/// Run a single ansible module against matching hosts
#[derive(Parser, Debug, Clone)]
#[command(name = "relay", about, disable_version_flag = true)]
pub struct AdHocArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Ansible module name
    #[arg(short = 'm', long)]
    pub module: Option<String>,

    /// Module arguments
    #[arg(short = 'a', long = "args")]
    pub module_args: Option<String>,

    /// Ansible host pattern
    #[arg(value_name = "PATTERN", default_value = MATCH_ALL_PATTERN)]
    pub pattern: Vec<String>,
}

/// Run an ansible playbook
#[derive(Parser, Debug, Clone)]
#[command(name = "relay-playbook", about, disable_version_flag = true)]
pub struct PlaybookArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Module arguments
    #[arg(short = 'a', long = "args")]
    pub module_args: Option<String>,

    /// Show ansible facts in results
    #[arg(long = "show-facts")]
    pub show_facts: bool,

    /// Vault password path
    #[arg(long = "vault-password-file")]
    pub vault_password_file: Option<PathBuf>,

    /// Ansible playbook path
    #[arg(value_name = "PLAYBOOK")]
    pub playbook: Option<PathBuf>,
}

/// One way of invoking the engine
///
/// The clap schema comes from [`Parser`]; the rest tells the validation
/// pipeline which mode-specific checks apply and what the adapter needs.
pub trait Mode: Parser + fmt::Debug {
    /// Flags every mode has
    fn common(&self) -> &CommonArgs;

    /// Patterns that must match at least one inventory host
    fn host_patterns(&self) -> Option<&[String]> {
        None
    }

    /// Vault password file to read
    fn vault_password_file(&self) -> Option<&Path> {
        None
    }

    /// Whether fact-gathering results stay in the report
    fn show_facts(&self) -> bool {
        false
    }

    /// Mode-specific argument checks, run before any inventory check
    fn check_usage(&self) -> Result<()> {
        Ok(())
    }

    /// Mode-specific part of the validated configuration
    fn settings(&self, defaults: &Defaults) -> ModeSettings;
}

impl Mode for AdHocArgs {
    fn common(&self) -> &CommonArgs {
        &self.common
    }

    fn host_patterns(&self) -> Option<&[String]> {
        Some(&self.pattern)
    }

    fn settings(&self, defaults: &Defaults) -> ModeSettings {
        ModeSettings::AdHoc {
            module_name: self
                .module
                .clone()
                .unwrap_or_else(|| defaults.module_name.clone()),
            module_args: self
                .module_args
                .clone()
                .unwrap_or_else(|| defaults.module_args.clone()),
            patterns: if self.pattern.is_empty() {
                vec![MATCH_ALL_PATTERN.to_string()]
            } else {
                self.pattern.clone()
            },
        }
    }
}

impl Mode for PlaybookArgs {
    fn common(&self) -> &CommonArgs {
        &self.common
    }

    fn vault_password_file(&self) -> Option<&Path> {
        self.vault_password_file.as_deref()
    }

    fn show_facts(&self) -> bool {
        self.show_facts
    }

    fn check_usage(&self) -> Result<()> {
        match &self.playbook {
            Some(playbook) if !playbook.as_os_str().is_empty() => Ok(()),
            _ => Err(RelayError::usage("No playbook provided")),
        }
    }

    fn settings(&self, defaults: &Defaults) -> ModeSettings {
        ModeSettings::Playbook {
            playbook: self.playbook.clone().unwrap_or_default(),
            module_args: self
                .module_args
                .clone()
                .unwrap_or_else(|| defaults.module_args.clone()),
        }
    }
}

/// Whether `--version` appears before any `--` terminator
///
/// Checked on raw argv so the version is shown even when other flags
/// would fail to parse.
pub fn requests_version<I, T>(argv: I) -> bool
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    argv.into_iter()
        .skip(1)
        .map(Into::into)
        .take_while(|arg| arg != "--")
        .any(|arg| arg == "--version")
}
