//! # Ansible Relay
//!
//! A command-line front end that validates execution parameters and hands
//! them to ansible, either as a single ad-hoc module run against a host
//! pattern or as a playbook run against an inventory.
//!
//! ## Features
//!
//! - Ordered, fail-fast argument validation
//! - Inventory host-pattern matching before anything is executed
//! - Interactive passwords and vault secrets resolved once, up front
//! - Interrupts exit immediately when idle and cancel the engine when running
//!
//! ## Example
//!
//! ```no_run
//! use ansible_relay::cli::AdHocArgs;
//!
//! let code = ansible_relay::run::<AdHocArgs>()?;
//! std::process::exit(code);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod utils;

use anyhow::{Context, Result};
use crate::cli::{Mode, ScriptController};
use crate::core::{CancellationHandler, RunnerHandle};
use crate::engine::CommandEngine;
use crate::utils::TerminalPrompter;
use tracing::Dispatch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt};

/// Build the logging handle with appropriate verbosity
pub fn setup_logging(debug: bool) -> Result<Dispatch> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(filter);

    Ok(Dispatch::new(subscriber))
}

/// Wire the real collaborators together and run one invocation of `M`
pub fn run<M: Mode>() -> Result<i32> {
    let debug = config::debug_requested();
    let logging = setup_logging(debug)?;

    let handle = RunnerHandle::new();
    CancellationHandler::install(handle.clone())
        .context("Failed to install interrupt handler")?;

    let controller = ScriptController::new(
        CommandEngine::new(debug),
        TerminalPrompter::new(handle.clone()),
        handle,
        logging,
    )
    .with_defaults(config::Defaults::from_env());

    Ok(controller.execute::<M, _, _>(std::env::args_os()))
}
