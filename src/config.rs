//! Configuration types for Keepsake

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::recording::{validate_filename, DIFF_TEMPLATE_RELATIVE};
use crate::{KeepsakeError, Result};

/// Recorder configuration, typically loaded from a TOML file committed
/// next to the test suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Directory for recording files. Relative paths are resolved by
    /// upward search from the working directory.
    pub recording_dir: PathBuf,
    /// Recording filename; derived from the test identity if omitted.
    #[serde(default)]
    pub recording_filename: Option<String>,
    /// Relative path probed for the diff-visualization template.
    #[serde(default = "default_diff_template")]
    pub diff_template: PathBuf,
}

fn default_diff_template() -> PathBuf {
    PathBuf::from(DIFF_TEMPLATE_RELATIVE)
}

impl RecorderConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`KeepsakeError::Config`] if the file cannot be read,
    /// parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| KeepsakeError::Config(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| KeepsakeError::Config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns [`KeepsakeError::Config`] if any field is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.recording_dir.as_os_str().is_empty() {
            return Err(KeepsakeError::Config(
                "recording_dir must not be empty".to_string(),
            ));
        }

        if let Some(filename) = &self.recording_filename {
            validate_filename(filename)?;
        }

        if self.diff_template.as_os_str().is_empty() {
            return Err(KeepsakeError::Config(
                "diff_template must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
