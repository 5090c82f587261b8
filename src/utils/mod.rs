//! Utility modules for common functionality
//!
//! Provides reusable utilities for file operations, process execution,
//! environment handling, password prompts and vault secrets.

pub mod env;
pub mod fs;
pub mod process;
pub mod prompt;
pub mod vault;

pub use env::EnvUtils;
pub use process::ProcessRunner;
pub use prompt::{Prompter, TerminalPrompter};
