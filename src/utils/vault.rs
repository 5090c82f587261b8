//! Vault password file reading

use crate::error::{RelayError, Result};
use crate::utils::{fs::is_executable, process::ProcessRunner};
use std::fs;
use std::path::Path;
use tracing::{debug, instrument};

/// Read the vault secret from `path`
///
/// An executable file is run and its standard output is the secret;
/// any other file is read as-is. Surrounding whitespace is stripped.
#[instrument]
pub fn read_secret(path: &Path) -> Result<Vec<u8>> {
    let raw = if is_executable(path) {
        debug!("Running vault password script: {}", path.display());
        let program = path.to_string_lossy();
        let result = ProcessRunner::default()
            .run_command_with_output(&program, &[])
            .map_err(|e| {
                RelayError::secret("password script failed", path, Some(Box::new(e)))
            })?;
        result.stdout.into_bytes()
    } else {
        fs::read(path).map_err(|e| RelayError::secret(e.to_string(), path, Some(Box::new(e))))?
    };

    Ok(trim_bytes(&raw).to_vec())
}

fn trim_bytes(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    bytes.get(start..end).unwrap_or_default()
}
