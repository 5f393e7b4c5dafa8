//! Error types for Keepsake

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for Keepsake operations
pub type Result<T> = std::result::Result<T, KeepsakeError>;

/// Errors that can occur in Keepsake
#[derive(Debug, Error)]
pub enum KeepsakeError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upward search exhausted every ancestor without a match
    #[error("Path not found: {} (searched {} locations)", .path.display(), .searched.len())]
    PathResolution {
        /// The relative path that was searched for
        path: PathBuf,
        /// Every candidate that was tried, child to root
        searched: Vec<PathBuf>,
    },

    /// Freshly produced data differs from the stored recording
    #[error(
        "Recording mismatch at {}:\n--- recording ---\n{recording_data}\n--- new data ---\n{mismatch_data}",
        .recording_path.display()
    )]
    Mismatch {
        /// Content of the stored recording
        recording_data: String,
        /// The data that failed the comparison
        mismatch_data: String,
        /// Where the recording is stored
        recording_path: PathBuf,
        /// Copy of the mismatching payload, when artifacts were written
        mismatch_path: Option<PathBuf>,
        /// Rendered HTML diff, when a template was available
        diff_path: Option<PathBuf>,
    },

    /// Mismatch artifact directory could not be created
    #[error("Could not allocate mismatch directory {}: {reason}", .path.display())]
    DirAllocation {
        /// The directory that could not be created
        path: PathBuf,
        /// Why creation failed
        reason: String,
    },

    /// Diff template is missing a required slot or has no usable name
    #[error("Invalid diff template: {0}")]
    Template(String),

    /// JSON payload could not be parsed or serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
