//! Interactive password prompts

use crate::core::cancel::RunnerHandle;
use std::io;

/// Source of interactively entered secrets
pub trait Prompter {
    /// Ask for a password without echoing it
    fn prompt_password(&self, prompt: &str) -> io::Result<String>;
}

/// Prompts on the controlling terminal
///
/// Terminal attributes are snapshotted in the shared [`RunnerHandle`] for
/// the duration of the prompt, so an interrupt that exits the process
/// still turns echo back on.
#[derive(Debug, Clone)]
pub struct TerminalPrompter {
    handle: RunnerHandle,
}

impl TerminalPrompter {
    pub const fn new(handle: RunnerHandle) -> Self {
        Self { handle }
    }
}

impl Prompter for TerminalPrompter {
    fn prompt_password(&self, prompt: &str) -> io::Result<String> {
        let _terminal = self.handle.guard_terminal();
        rpassword::prompt_password(prompt)
    }
}
