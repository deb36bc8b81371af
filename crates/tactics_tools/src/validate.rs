//! Data validation utilities.

use std::path::{Path, PathBuf};

use tactics_client::prelude::ClientConfig;
use tracing::{debug, info};

use crate::error::{Result, ToolError};
use crate::replay::Recording;

/// Load and check a client configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid RON, or holds
/// inconsistent values such as a fast-forward profile slower than the
/// profiles it replaces.
pub fn validate_config(path: &Path) -> Result<ClientConfig> {
    let config = ClientConfig::load(path)?;
    debug!(path = %path.display(), "Config is valid");
    Ok(config)
}

/// Validate every `.ron` configuration file in a directory.
///
/// Returns the number of files checked.
///
/// # Errors
///
/// Returns the first file that fails validation.
pub fn validate_config_directory(path: &Path) -> Result<usize> {
    let files = ron_files(path)?;
    for file in &files {
        validate_config(file)?;
    }
    info!(path = %path.display(), files = files.len(), "Configs are valid");
    Ok(files.len())
}

/// Check that every recorded action is accepted by the rules.
///
/// Returns the number of responses a spectator would receive.
///
/// # Errors
///
/// Returns an error if the recording cannot be loaded or an action is
/// rejected.
pub fn validate_recording(path: &Path) -> Result<usize> {
    let responses = Recording::load(path)?.responses(None)?;
    debug!(path = %path.display(), responses = responses.len(), "Recording is valid");
    Ok(responses.len())
}

fn ron_files(path: &Path) -> Result<Vec<PathBuf>> {
    let io = |source: std::io::Error| ToolError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(path).map_err(io)? {
        let file = entry.map_err(io)?.path();
        if file.extension().is_some_and(|extension| extension == "ron") {
            files.push(file);
        }
    }
    files.sort();
    Ok(files)
}
