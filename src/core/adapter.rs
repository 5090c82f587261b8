//! Mapping validated configuration onto the engine
//!
//! Each adapter flattens a [`ValidatedConfig`] into the [`EngineConfig`]
//! shape its mode needs and runs the engine with the shared
//! [`RunnerHandle`] marked as running.

use crate::core::cancel::RunnerHandle;
use crate::core::validate::{ModeSettings, PrivilegeMode, ValidatedConfig, VaultSecret};
use crate::engine::{Engine, EngineConfig, EngineResult, EngineValue, keys};
use crate::error::{RelayError, Result};
use std::path::PathBuf;
use tracing::{debug, info, instrument};

/// Connection plugin used for playbook runs
const PLAYBOOK_TRANSPORT: &str = "smart";

/// Runs one validated invocation against an engine
pub trait RunnerAdapter {
    /// Short name used in logs
    fn label(&self) -> &'static str;

    /// Flat engine configuration for this invocation
    fn engine_config(&self) -> EngineConfig;

    /// Run the engine to completion
    ///
    /// The handle is in the running state exactly for the duration of the
    /// engine call. Every engine failure, cancellation included, comes back
    /// as [`RelayError::Runner`].
    #[instrument(skip_all, fields(mode = self.label()))]
    fn run(&self, engine: &dyn Engine, handle: &RunnerHandle) -> Result<EngineResult> {
        let config = self.engine_config();

        let outcome = {
            let guard = handle.register();
            engine.run(&config, guard.token())
        };

        outcome.map_err(|e| {
            debug!("{} run failed: {}", self.label(), e);
            RelayError::runner(e.to_string())
        })
    }
}

/// Options every mode passes to the engine
fn shared_config(config: &ValidatedConfig) -> EngineConfig {
    let (su, become_, become_user) = match &config.privilege {
        PrivilegeMode::None => (false, false, None),
        PrivilegeMode::Su { user } => (true, false, Some(user.clone())),
        PrivilegeMode::Become { user } => (false, true, Some(user.clone())),
    };

    EngineConfig::new()
        .with(
            keys::MODULE_PATH,
            config
                .module_path
                .as_ref()
                .map(|path| path.display().to_string()),
        )
        .with(keys::TIMEOUT, config.timeout)
        .with(keys::REMOTE_USER, config.remote_user.as_str())
        .with(keys::REMOTE_PASS, secret(config.credentials.remote_password.as_deref()))
        .with(keys::REMOTE_PORT, u64::from(config.remote_port))
        .with(
            keys::PRIVATE_KEY_FILE,
            config
                .private_key
                .as_ref()
                .map(|path| path.display().to_string()),
        )
        .with(keys::SU, su)
        .with(keys::BECOME, become_)
        .with(keys::BECOME_USER, become_user)
        .with(keys::BECOME_PASS, secret(config.credentials.become_password.as_deref()))
        .with(keys::SHOW_COLORS, config.display.colors)
}

fn secret(value: Option<&str>) -> EngineValue {
    value.map_or(EngineValue::Unset, |value| {
        EngineValue::Secret(value.as_bytes().to_vec())
    })
}

/// Runs a single module against a host pattern
#[derive(Debug)]
pub struct AdHocAdapter {
    config: ValidatedConfig,
    module_name: String,
    module_args: String,
    patterns: Vec<String>,
}

impl RunnerAdapter for AdHocAdapter {
    fn label(&self) -> &'static str {
        "ad-hoc"
    }

    fn engine_config(&self) -> EngineConfig {
        info!(
            "{}{} {} on {}",
            self.config.privilege.display_prefix(),
            self.module_name,
            self.module_args,
            self.patterns.join(":")
        );

        shared_config(&self.config)
            .with(keys::HOST_LIST, self.config.inventory.display().to_string())
            .with(keys::FORKS, self.config.forks.to_string())
            .with(keys::MODULE_NAME, self.module_name.as_str())
            .with(keys::MODULE_ARGS, self.module_args.as_str())
            .with(keys::PATTERN, self.patterns.clone())
    }
}

/// Runs a playbook
#[derive(Debug)]
pub struct PlaybookAdapter {
    config: ValidatedConfig,
    playbook: PathBuf,
    module_args: String,
}

impl RunnerAdapter for PlaybookAdapter {
    fn label(&self) -> &'static str {
        "playbook"
    }

    fn engine_config(&self) -> EngineConfig {
        info!("{}{}", self.config.privilege.display_prefix(), self.playbook.display());

        let vault = match &self.config.vault {
            VaultSecret::Disabled => EngineValue::Flag(false),
            VaultSecret::Secret(bytes) => EngineValue::Secret(bytes.clone()),
        };

        shared_config(&self.config)
            .with(keys::HOST_LIST, self.config.inventory.display().to_string())
            .with(keys::PLAYBOOK, self.playbook.display().to_string())
            .with(keys::MODULE_ARGS, self.module_args.as_str())
            .with(keys::FORKS, self.config.forks.to_string())
            .with(keys::TRANSPORT, PLAYBOOK_TRANSPORT)
            .with(keys::EXTRA_VARS, EngineValue::Unset)
            .with(keys::ONLY_TAGS, EngineValue::Unset)
            .with(keys::SKIP_TAGS, EngineValue::Unset)
            .with(keys::SUBSET, EngineValue::Unset)
            .with(keys::INVENTORY, EngineValue::Unset)
            .with(keys::CHECK, false)
            .with(keys::DIFF, false)
            .with(keys::ANY_ERRORS_FATAL, false)
            .with(keys::FORCE_HANDLERS, false)
            .with(keys::VAULT_PASSWORD, vault)
            .with(keys::SHOW_FACTS, self.config.display.show_facts)
    }
}

/// Adapter matching the configuration's mode
pub fn adapter_for(config: ValidatedConfig) -> Box<dyn RunnerAdapter> {
    match config.mode.clone() {
        ModeSettings::AdHoc {
            module_name,
            module_args,
            patterns,
        } => Box::new(AdHocAdapter {
            config,
            module_name,
            module_args,
            patterns,
        }),
        ModeSettings::Playbook {
            playbook,
            module_args,
        } => Box::new(PlaybookAdapter {
            config,
            playbook,
            module_args,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::{AdHocArgs, PlaybookArgs};
    use crate::config::Defaults;
    use crate::core::cancel::CancelToken;
    use crate::core::validate::validate;
    use crate::engine::EngineError;
    use crate::utils::prompt::Prompter;
    use clap::Parser;
    use std::io;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FixedPrompter;

    impl Prompter for FixedPrompter {
        fn prompt_password(&self, _prompt: &str) -> io::Result<String> {
            Ok("pw".to_string())
        }
    }

    /// Records what it was called with and replies with a fixed outcome
    struct StubEngine {
        seen: Mutex<Option<(EngineConfig, bool)>>,
        fail: bool,
        handle: RunnerHandle,
    }

    impl StubEngine {
        fn new(handle: RunnerHandle, fail: bool) -> Self {
            Self {
                seen: Mutex::new(None),
                fail,
                handle,
            }
        }
    }

    impl Engine for StubEngine {
        fn version(&self) -> String {
            "ansible 0.0.0".to_string()
        }

        fn run(&self, config: &EngineConfig, _cancel: &CancelToken) -> std::result::Result<EngineResult, EngineError> {
            *self.seen.lock().unwrap() = Some((config.clone(), self.handle.is_running()));
            if self.fail {
                Err(EngineError::failed("host unreachable"))
            } else {
                Ok(EngineResult::default())
            }
        }
    }

    fn adhoc_config(extra: &[&str]) -> (TempDir, ValidatedConfig) {
        let temp_dir = TempDir::new().unwrap();
        let inventory = temp_dir.path().join("hosts");
        std::fs::write(&inventory, "a\nb\n").unwrap();
        let mut argv = vec!["relay".to_string(), "-i".to_string(), inventory.display().to_string()];
        argv.extend(extra.iter().map(|arg| arg.to_string()));
        let args = AdHocArgs::try_parse_from(argv).unwrap();
        let config = validate(&args, &Defaults::default(), &FixedPrompter).unwrap();
        (temp_dir, config)
    }

    #[test]
    fn test_adhoc_engine_config() {
        let (_dir, config) = adhoc_config(&["-m", "ping", "-f", "12", "-S", "-U", "ops", "a"]);
        let engine_config = adapter_for(config).engine_config();

        assert_eq!(engine_config.get(keys::FORKS), Some(&EngineValue::Text("12".to_string())));
        assert_eq!(engine_config.text(keys::MODULE_NAME).as_deref(), Some("ping"));
        assert_eq!(engine_config.list(keys::PATTERN), vec!["a"]);
        assert!(engine_config.flag(keys::SU));
        assert!(!engine_config.flag(keys::BECOME));
        assert_eq!(engine_config.text(keys::BECOME_USER).as_deref(), Some("ops"));
        assert_eq!(engine_config.get(keys::REMOTE_PASS), Some(&EngineValue::Unset));
        assert_eq!(engine_config.get(keys::BECOME_PASS), Some(&EngineValue::Unset));
        assert!(!engine_config.is_set(keys::PLAYBOOK));
    }

    #[test]
    fn test_adhoc_passwords_are_secrets() {
        let (_dir, config) = adhoc_config(&["-k", "-K"]);
        let engine_config = adapter_for(config).engine_config();

        assert_eq!(engine_config.secret(keys::REMOTE_PASS), Some(&b"pw"[..]));
        assert_eq!(engine_config.secret(keys::BECOME_PASS), Some(&b"pw"[..]));
    }

    #[test]
    fn test_playbook_engine_config_disables_unexposed_options() {
        let args = PlaybookArgs::try_parse_from(["relay-playbook", "-i", "a,b", "site.yml"]).unwrap();
        let config = validate(&args, &Defaults::default(), &FixedPrompter).unwrap();
        let adapter = adapter_for(config);
        assert_eq!(adapter.label(), "playbook");

        let engine_config = adapter.engine_config();
        assert_eq!(engine_config.text(keys::PLAYBOOK).as_deref(), Some("site.yml"));
        assert_eq!(engine_config.text(keys::TRANSPORT).as_deref(), Some("smart"));
        assert_eq!(engine_config.get(keys::FORKS), Some(&EngineValue::Text("5".to_string())));
        for key in [keys::EXTRA_VARS, keys::ONLY_TAGS, keys::SKIP_TAGS, keys::SUBSET] {
            assert_eq!(engine_config.get(key), Some(&EngineValue::Unset), "{key}");
        }
        for key in [keys::CHECK, keys::DIFF, keys::ANY_ERRORS_FATAL, keys::FORCE_HANDLERS] {
            assert_eq!(engine_config.get(key), Some(&EngineValue::Flag(false)), "{key}");
        }
        assert_eq!(engine_config.get(keys::VAULT_PASSWORD), Some(&EngineValue::Flag(false)));
    }

    #[test]
    fn test_run_registers_and_clears_handle() {
        let handle = RunnerHandle::new();
        let engine = StubEngine::new(handle.clone(), false);
        let (_dir, config) = adhoc_config(&[]);

        adapter_for(config).run(&engine, &handle).unwrap();

        let (_, was_running) = engine.seen.lock().unwrap().take().unwrap();
        assert!(was_running);
        assert!(!handle.is_running());
    }

    #[test]
    fn test_engine_failure_becomes_runner_error() {
        let handle = RunnerHandle::new();
        let engine = StubEngine::new(handle.clone(), true);
        let (_dir, config) = adhoc_config(&[]);

        let err = adapter_for(config).run(&engine, &handle).unwrap_err();
        assert!(matches!(err, RelayError::Runner { .. }));
        assert_eq!(err.to_string(), "host unreachable");
        assert!(!handle.is_running());
    }
}
