//! Command-line interface module
//!
//! Provides argument parsing for both modes and the controller that runs them.

pub mod args;
pub mod controller;

pub use args::{AdHocArgs, CommonArgs, Mode, PlaybookArgs};
pub use controller::{Outcome, ScriptController};
