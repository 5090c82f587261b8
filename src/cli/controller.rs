//! Top-level orchestration: parse, validate, dispatch, report

use crate::cli::args::{Mode, requests_version};
use crate::config::Defaults;
use crate::core::adapter::adapter_for;
use crate::core::cancel::RunnerHandle;
use crate::core::validate::validate;
use crate::engine::{Engine, EngineResult};
use crate::error::{RelayError, Result};
use crate::utils::prompt::Prompter;
use std::ffi::OsString;
use tracing::{Dispatch, debug, info, instrument};

/// What a successful invocation produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `--version` output
    Version(String),
    /// Help text rendered by the argument parser
    Displayed(String),
    /// The engine ran
    Completed(EngineResult),
}

/// Runs one invocation of a [`Mode`] against an engine
pub struct ScriptController<E, P> {
    engine: E,
    prompter: P,
    handle: RunnerHandle,
    logging: Dispatch,
    defaults: Defaults,
}

impl<E: Engine, P: Prompter> ScriptController<E, P> {
    pub fn new(engine: E, prompter: P, handle: RunnerHandle, logging: Dispatch) -> Self {
        Self {
            engine,
            prompter,
            handle,
            logging,
            defaults: Defaults::default(),
        }
    }

    /// Replace the fallback values for unset flags
    #[must_use]
    pub fn with_defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Version line, e.g. `0.1.0 (ansible 2.9.27)`
    pub fn version(&self) -> String {
        format!("{} ({})", env!("CARGO_PKG_VERSION"), self.engine.version())
    }

    /// Run the full pipeline without printing anything
    #[instrument(skip_all)]
    pub fn dispatch<M, I, T>(&self, argv: I) -> Result<Outcome>
    where
        M: Mode,
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();

        if requests_version(argv.iter().cloned()) {
            return Ok(Outcome::Version(self.version()));
        }

        let args = match M::try_parse_from(&argv) {
            Ok(args) => args,
            Err(e) if !e.use_stderr() => return Ok(Outcome::Displayed(e.render().to_string())),
            Err(e) => return Err(RelayError::usage(e.render().to_string().trim_end())),
        };
        debug!("Parsed arguments: {:?}", args);

        let config = validate(&args, &self.defaults, &self.prompter)?;
        let adapter = adapter_for(config);
        info!("Dispatching {} run", adapter.label());

        adapter
            .run(&self.engine, &self.handle)
            .map(Outcome::Completed)
    }

    /// Run the pipeline, print the result and return the exit code
    pub fn execute<M, I, T>(&self, argv: I) -> i32
    where
        M: Mode,
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        tracing::dispatcher::with_default(&self.logging, || match self.dispatch::<M, _, _>(argv) {
            Ok(Outcome::Version(version)) => {
                println!("{version}");
                0
            }
            Ok(Outcome::Displayed(text)) => {
                print!("{text}");
                0
            }
            Ok(Outcome::Completed(result)) => {
                if !result.output.is_empty() {
                    println!("{}", result.output);
                }
                0
            }
            Err(e) => {
                debug!(kind = ?e.kind(), "Invocation failed: {}", e);
                eprintln!("{e}");
                e.exit_code()
            }
        })
    }
}
