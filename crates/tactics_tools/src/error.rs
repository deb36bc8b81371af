//! Tool error types.

use std::path::PathBuf;

use tactics_client::error::ClientError;
use tactics_rules::error::RulesError;
use thiserror::Error;

/// Result type for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors raised by the development tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// The file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A replay file is not valid RON.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// The file.
        path: PathBuf,
        /// Underlying error.
        source: ron::error::SpannedError,
    },

    /// A recorded action was rejected by the rules.
    #[error("Action {index} ({action}) was rejected: {source}")]
    Rejected {
        /// Position in the recording.
        index: usize,
        /// Kind of the action.
        action: String,
        /// Underlying error.
        source: RulesError,
    },

    /// The client reported an error.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The session stopped making progress.
    #[error("Replay stalled after {responses} responses")]
    Stalled {
        /// Responses committed before the stall.
        responses: usize,
    },
}
