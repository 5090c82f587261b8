//! Error types for the relay
//!
//! Every failure that can end an invocation is a [`RelayError`]. All of them
//! terminate the process with exit code 1; [`RelayError::kind`] tells which
//! family a failure belongs to.

use std::path::PathBuf;
use thiserror::Error;

/// Broad failure families, used for exit-code mapping and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing argument
    Usage,
    /// Inventory or host pattern checks failed
    Validation,
    /// The engine reported a failure, including cancellation
    Runner,
    /// A directory could not be created
    Directory,
    /// Unrecoverable I/O while preparing the invocation
    Fatal,
}

/// Main error type for the relay
#[derive(Error, Debug)]
pub enum RelayError {
    /// Bad or missing command-line argument
    #[error("{message}")]
    Usage { message: String },

    /// Undetectable inventory, unmatched host pattern
    #[error("{message}")]
    Validation { message: String },

    /// The inventory source exists but could not be read or parsed
    #[error("Error loading inventory {}: {message}", path.display())]
    Inventory { message: String, path: PathBuf },

    /// Normalized engine failure
    #[error("{message}")]
    Runner { message: String },

    /// Directory creation failed
    #[error("Error creating directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading an interactive password failed
    #[error("Failed to read password: {source}")]
    Prompt {
        #[source]
        source: std::io::Error,
    },

    /// Reading the vault secret failed
    #[error("Error reading vault password file {}: {message}", path.display())]
    Secret {
        message: String,
        path: PathBuf,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Writing a result report failed
    #[error("Error writing report {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// External command execution errors
    #[error("Process error: {command} failed")]
    Process {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

impl RelayError {
    /// Create a new usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new inventory loading error
    pub fn inventory<P: Into<PathBuf>>(message: impl Into<String>, path: P) -> Self {
        Self::Inventory {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Create a new runner error
    pub fn runner(message: impl Into<String>) -> Self {
        Self::Runner {
            message: message.into(),
        }
    }

    /// Create a new directory creation error
    pub fn directory<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Directory {
            path: path.into(),
            source,
        }
    }

    /// Create a new vault secret error
    pub fn secret<P: Into<PathBuf>>(
        message: impl Into<String>,
        path: P,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Secret {
            message: message.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a new report writing error
    pub fn report<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Report {
            path: path.into(),
            source,
        }
    }

    /// Create a new process error
    pub fn process(
        command: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Process {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Failure family of this error
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Usage { .. } => ErrorKind::Usage,
            Self::Validation { .. } | Self::Inventory { .. } => ErrorKind::Validation,
            Self::Runner { .. } => ErrorKind::Runner,
            Self::Directory { .. } => ErrorKind::Directory,
            Self::Prompt { .. } | Self::Secret { .. } | Self::Report { .. } | Self::Process { .. } => {
                ErrorKind::Fatal
            }
        }
    }

    /// Process exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Usage
            | ErrorKind::Validation
            | ErrorKind::Runner
            | ErrorKind::Directory
            | ErrorKind::Fatal => 1,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RelayError>;
