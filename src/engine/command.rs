//! Engine backed by the `ansible` and `ansible-playbook` command-line tools

use super::{Engine, EngineConfig, EngineError, EngineResult, keys, results};
use crate::core::cancel::CancelToken;
use crate::error::{RelayError, Result};
use crate::utils::{fs::create_directory, process::ProcessRunner};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};

/// Exit codes that still carry a run report: some hosts failed or were unreachable
const REPORTING_EXIT_CODES: &[i32] = &[0, 2, 3];

/// Exit code the tools use after a keyboard interrupt
const INTERRUPTED_EXIT_CODE: i32 = 99;

/// Command line, environment and scratch files for one run
#[derive(Debug)]
struct Invocation {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    // Removed when the invocation is dropped
    _scratch: Option<TempDir>,
}

/// Engine that shells out to the ansible tools
#[derive(Debug)]
pub struct CommandEngine {
    adhoc_program: String,
    playbook_program: String,
    scratch_root: PathBuf,
    runner: ProcessRunner,
}

impl CommandEngine {
    /// Engine using `ansible`/`ansible-playbook` from `PATH`
    #[must_use]
    pub fn new(debug: bool) -> Self {
        Self {
            adhoc_program: "ansible".to_string(),
            playbook_program: "ansible-playbook".to_string(),
            scratch_root: std::env::temp_dir().join("ansible-relay"),
            runner: ProcessRunner::new(debug),
        }
    }

    /// Use different executables
    #[must_use]
    pub fn with_programs(mut self, adhoc: impl Into<String>, playbook: impl Into<String>) -> Self {
        self.adhoc_program = adhoc.into();
        self.playbook_program = playbook.into();
        self
    }

    /// Directory under which per-run scratch directories are created
    #[must_use]
    pub fn with_scratch_root(mut self, scratch_root: impl Into<PathBuf>) -> Self {
        self.scratch_root = scratch_root.into();
        self
    }

    /// Translate the flat configuration into a command line
    fn build_invocation(&self, config: &EngineConfig) -> Result<Invocation> {
        let playbook = config.text(keys::PLAYBOOK);
        let program = if playbook.is_some() {
            self.playbook_program.clone()
        } else {
            self.adhoc_program.clone()
        };

        let mut args = Vec::new();
        let mut env = vec![
            ("ANSIBLE_STDOUT_CALLBACK".to_string(), "json".to_string()),
            ("ANSIBLE_LOAD_CALLBACK_PLUGINS".to_string(), "1".to_string()),
        ];

        push_option(&mut args, "-i", config.text(keys::HOST_LIST));
        push_option(&mut args, "-i", config.text(keys::INVENTORY));
        push_option(&mut args, "-M", config.text(keys::MODULE_PATH));
        push_option(&mut args, "-f", config.text(keys::FORKS));
        push_option(&mut args, "-T", config.text(keys::TIMEOUT));
        push_option(&mut args, "-u", config.text(keys::REMOTE_USER));
        push_option(&mut args, "--private-key", config.text(keys::PRIVATE_KEY_FILE));
        push_option(&mut args, "-c", config.text(keys::TRANSPORT));

        if config.flag(keys::BECOME) {
            args.push("--become".to_string());
        } else if config.flag(keys::SU) {
            args.extend(["--become".to_string(), "--become-method".to_string(), "su".to_string()]);
        }
        if config.flag(keys::BECOME) || config.flag(keys::SU) {
            push_option(&mut args, "--become-user", config.text(keys::BECOME_USER));
        }

        if let Some(port) = config.text(keys::REMOTE_PORT) {
            env.push(("ANSIBLE_REMOTE_PORT".to_string(), port));
        }
        if config.flag(keys::SHOW_COLORS) {
            env.push(("ANSIBLE_FORCE_COLOR".to_string(), "1".to_string()));
        } else {
            env.push(("ANSIBLE_NOCOLOR".to_string(), "1".to_string()));
        }

        let mut scratch = None;
        let credentials = credential_vars(config);
        if !credentials.is_empty() {
            let dir = self.scratch_dir(&mut scratch)?;
            let path = dir.join("credentials.json");
            let body = serde_json::to_vec(&credentials).map_err(|e| {
                RelayError::process(program.clone(), None, format!("Failed to encode credentials: {e}"))
            })?;
            write_private(&path, &body)?;
            args.push("-e".to_string());
            args.push(format!("@{}", path.display()));
        }

        if let Some(vault) = config.secret(keys::VAULT_PASSWORD) {
            let dir = self.scratch_dir(&mut scratch)?;
            let path = dir.join("vault-pass");
            write_private(&path, vault)?;
            args.push("--vault-password-file".to_string());
            args.push(path.display().to_string());
        }

        match playbook {
            Some(playbook) => {
                push_option(&mut args, "-e", config.text(keys::EXTRA_VARS));
                push_joined(&mut args, "--tags", &config.list(keys::ONLY_TAGS));
                push_joined(&mut args, "--skip-tags", &config.list(keys::SKIP_TAGS));
                push_option(&mut args, "--limit", config.text(keys::SUBSET));
                if config.flag(keys::CHECK) {
                    args.push("--check".to_string());
                }
                if config.flag(keys::DIFF) {
                    args.push("--diff".to_string());
                }
                if config.flag(keys::FORCE_HANDLERS) {
                    args.push("--force-handlers".to_string());
                }
                if config.flag(keys::ANY_ERRORS_FATAL) {
                    env.push(("ANSIBLE_ANY_ERRORS_FATAL".to_string(), "True".to_string()));
                }
                args.push(playbook);
            }
            None => {
                push_option(&mut args, "-m", config.text(keys::MODULE_NAME));
                push_option(
                    &mut args,
                    "-a",
                    config.text(keys::MODULE_ARGS).filter(|module_args| !module_args.is_empty()),
                );
                let patterns = config.list(keys::PATTERN);
                args.push(if patterns.is_empty() {
                    "all".to_string()
                } else {
                    patterns.join(":")
                });
            }
        }

        Ok(Invocation {
            program,
            args,
            env,
            _scratch: scratch,
        })
    }

    /// Per-run private directory, created on first use
    fn scratch_dir(&self, scratch: &mut Option<TempDir>) -> Result<PathBuf> {
        if let Some(dir) = scratch {
            return Ok(dir.path().to_path_buf());
        }

        create_directory(&self.scratch_root)?;
        let dir = tempfile::Builder::new()
            .prefix("run-")
            .tempdir_in(&self.scratch_root)
            .map_err(|e| RelayError::directory(&self.scratch_root, e))?;
        debug!("Created scratch directory: {}", dir.path().display());

        let path = dir.path().to_path_buf();
        *scratch = Some(dir);
        Ok(path)
    }
}

impl Default for CommandEngine {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Engine for CommandEngine {
    fn version(&self) -> String {
        let label = self
            .runner
            .run_command_with_output(&self.adhoc_program, &["--version"])
            .ok()
            .and_then(|result| parse_version(&result.stdout));

        match label {
            Some(version) => format!("ansible {version}"),
            None => {
                warn!("Could not determine {} version", self.adhoc_program);
                "ansible unknown".to_string()
            }
        }
    }

    #[instrument(skip(self, config, cancel))]
    fn run(&self, config: &EngineConfig, cancel: &CancelToken) -> std::result::Result<EngineResult, EngineError> {
        let invocation = self.build_invocation(config).map_err(|e| EngineError::failed(e.to_string()))?;
        info!("Starting {}", invocation.program);

        let result = self
            .runner
            .run_supervised(&invocation.program, &invocation.args, &invocation.env, cancel)
            .map_err(|source| EngineError::Launch {
                program: invocation.program.clone(),
                source,
            })?;

        if result.interrupted || cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        match result.exit_code {
            Some(code) if REPORTING_EXIT_CODES.contains(&code) => {
                debug!("{} finished with exit code {}", invocation.program, code);
                // Only playbook runs hide fact gathering
                let show_facts = config.text(keys::PLAYBOOK).is_none() || config.flag(keys::SHOW_FACTS);
                Ok(EngineResult {
                    exit_code: code,
                    output: results::render_output(&result.stdout, show_facts),
                })
            }
            Some(INTERRUPTED_EXIT_CODE) => Err(EngineError::Cancelled),
            Some(code) => Err(EngineError::failed(failure_message(
                &result.stderr,
                &result.stdout,
                || format!("{} exited with code {}", invocation.program, code),
            ))),
            None => Err(EngineError::failed(format!(
                "{} was terminated by a signal",
                invocation.program
            ))),
        }
    }
}

fn push_option(args: &mut Vec<String>, flag: &str, value: Option<String>) {
    if let Some(value) = value {
        args.push(flag.to_string());
        args.push(value);
    }
}

fn push_joined(args: &mut Vec<String>, flag: &str, values: &[String]) {
    if !values.is_empty() {
        args.push(flag.to_string());
        args.push(values.join(","));
    }
}

/// Connection and privilege passwords as extra variables
fn credential_vars(config: &EngineConfig) -> serde_json::Map<String, serde_json::Value> {
    let mut vars = serde_json::Map::new();
    for (key, var) in [
        (keys::REMOTE_PASS, "ansible_password"),
        (keys::BECOME_PASS, "ansible_become_password"),
    ] {
        if let Some(secret) = config.secret(key) {
            vars.insert(
                var.to_string(),
                serde_json::Value::String(String::from_utf8_lossy(secret).to_string()),
            );
        }
    }
    vars
}

/// Write a file only the current user can read
fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    use std::io::Write;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .map_err(|e| RelayError::process("write", None, format!("{}: {e}", path.display())))?;
    file.write_all(contents)
        .map_err(|e| RelayError::process("write", None, format!("{}: {e}", path.display())))
}

/// Last meaningful line the tool printed about its failure
fn failure_message(stderr: &str, stdout: &str, fallback: impl FnOnce() -> String) -> String {
    stderr
        .lines()
        .chain(stdout.lines())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find(|line| line.starts_with("ERROR!"))
        .or_else(|| stderr.lines().map(str::trim).rfind(|line| !line.is_empty()))
        .map_or_else(fallback, ToString::to_string)
}

/// Version number from the first line of `--version` output
fn parse_version(output: &str) -> Option<String> {
    let re = Regex::new(r"^\S+\s+\[?(?:core\s+)?([0-9][^\s\]]*)").ok()?;
    let first = output.lines().next()?.trim();
    re.captures(first)
        .and_then(|cap| cap.get(1))
        .map(|version| version.as_str().to_string())
}
