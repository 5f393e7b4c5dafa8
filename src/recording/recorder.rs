//! Recorder state machine and record-or-compare protocol

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::config::RecorderConfig;
use crate::mismatch::{self, Mismatch, MismatchHandler};
use crate::resolve;
use crate::{KeepsakeError, Result};

use super::{DERIVED_EXTENSION, DIFF_TEMPLATE_RELATIVE};

/// Identity of the currently running test, supplied by the host framework.
///
/// Used only to derive a default recording filename when none is set
/// explicitly.
#[derive(Debug, Clone)]
pub struct TestIdentity {
    /// Suite (fixture) name
    pub suite: String,
    /// Case name
    pub case: String,
}

impl TestIdentity {
    /// Create a test identity from suite and case names.
    pub fn new(suite: impl Into<String>, case: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            case: case.into(),
        }
    }
}

/// How mismatches are reported.
///
/// Resolution from `Unresolved` runs at most once per recorder, on the
/// first `record` call.
enum HandlerSlot {
    /// No handler chosen yet
    Unresolved,
    /// Caller-supplied handler
    Custom(MismatchHandler),
    /// Diff template found by upward search
    Diff(PathBuf),
    /// No template available; report data variants only
    Plain,
}

impl std::fmt::Debug for HandlerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerSlot::Unresolved => f.write_str("Unresolved"),
            HandlerSlot::Custom(_) => f.write_str("Custom(..)"),
            HandlerSlot::Diff(template) => f.debug_tuple("Diff").field(template).finish(),
            HandlerSlot::Plain => f.write_str("Plain"),
        }
    }
}

/// Records data and checks it against the last-known-good recording.
///
/// On the first `record` call for a given recording file the data is
/// persisted verbatim; later calls compare against the stored content and
/// fail with a structured mismatch error when they differ. The recording
/// file itself is never overwritten by a mismatch.
///
/// Example:
///
/// ```no_run
/// use keepsake::recording::Recorder;
///
/// let mut recorder = Recorder::new();
/// recorder.set_recording_dir("test/recordings")?;
/// recorder.set_test_identity("suite", "case");
/// recorder.record("test data")?;
/// # Ok::<(), keepsake::KeepsakeError>(())
/// ```
#[derive(Debug)]
pub struct Recorder {
    recording_dir: Option<PathBuf>,
    recording_filename: Option<String>,
    handler: HandlerSlot,
    identity: Option<TestIdentity>,
    diff_template: PathBuf,
    mismatch_root: Option<PathBuf>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    /// Create an unconfigured recorder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            recording_dir: None,
            recording_filename: None,
            handler: HandlerSlot::Unresolved,
            identity: None,
            diff_template: PathBuf::from(DIFF_TEMPLATE_RELATIVE),
            mismatch_root: None,
        }
    }

    /// Create a recorder from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`KeepsakeError::Config`] if the configuration is invalid or
    /// [`KeepsakeError::PathResolution`] if the recording directory cannot
    /// be located.
    pub fn from_config(config: &RecorderConfig) -> Result<Self> {
        config.validate()?;

        let mut recorder = Self::new();
        recorder.set_recording_dir(&config.recording_dir)?;
        if let Some(filename) = &config.recording_filename {
            recorder.set_recording_filename(filename)?;
        }
        recorder.diff_template.clone_from(&config.diff_template);

        Ok(recorder)
    }

    /// Set the directory where recordings are stored. Required before any
    /// `record` call.
    ///
    /// An absolute path is used as-is. A relative path is resolved by
    /// searching the working directory and every ancestor up to the
    /// filesystem root, so a test invoked from any subdirectory of a
    /// project can locate a project-relative directory like
    /// `test/recordings`.
    ///
    /// # Errors
    ///
    /// Returns [`KeepsakeError::Config`] if the path is empty or not an
    /// existing directory, or [`KeepsakeError::PathResolution`] if a
    /// relative path is not found in any ancestor.
    pub fn set_recording_dir(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        if dir.as_os_str().is_empty() {
            return Err(KeepsakeError::Config(
                "recording directory must not be empty".to_string(),
            ));
        }

        let resolved = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            resolve::find_upward(dir)?
        };

        if !resolved.is_dir() {
            return Err(KeepsakeError::Config(format!(
                "recording directory does not exist: {}",
                resolved.display()
            )));
        }

        self.recording_dir = Some(resolved);
        Ok(())
    }

    /// Set the recording filename explicitly.
    ///
    /// If omitted, the filename is derived from the test identity on the
    /// first `record` call.
    ///
    /// # Errors
    ///
    /// Returns [`KeepsakeError::Config`] if the name is empty or has no
    /// extension.
    pub fn set_recording_filename(&mut self, filename: impl Into<String>) -> Result<()> {
        let filename = filename.into();
        validate_filename(&filename)?;
        self.recording_filename = Some(filename);
        Ok(())
    }

    /// Register a custom mismatch handler.
    ///
    /// The handler is invoked at most once per failing `record` call and
    /// its returned error becomes the call's failure.
    pub fn on_mismatch(&mut self, handler: impl Fn(Mismatch) -> KeepsakeError + 'static) {
        self.handler = HandlerSlot::Custom(Box::new(handler));
    }

    /// Supply the identity of the currently running test.
    pub fn set_test_identity(&mut self, suite: impl Into<String>, case: impl Into<String>) {
        self.identity = Some(TestIdentity::new(suite, case));
    }

    /// Override the relative path probed for the diff template.
    ///
    /// An absolute path bypasses the upward search.
    pub fn set_diff_template(&mut self, template: impl Into<PathBuf>) {
        self.diff_template = template.into();
    }

    /// Override the directory mismatch artifact directories are created
    /// under. Defaults to the system temp directory.
    pub fn set_mismatch_root(&mut self, root: impl Into<PathBuf>) {
        self.mismatch_root = Some(root.into());
    }

    /// Derive a recording filename from the test identity.
    ///
    /// Produces `<suite>_<case>.data`.
    ///
    /// # Errors
    ///
    /// Returns [`KeepsakeError::Config`] if the identity is unset or either
    /// name is empty.
    pub fn testname_as_filename(&self) -> Result<String> {
        let identity = self
            .identity
            .as_ref()
            .ok_or_else(|| KeepsakeError::Config("test identity is not set".to_string()))?;

        if identity.suite.is_empty() || identity.case.is_empty() {
            return Err(KeepsakeError::Config(
                "test identity must have non-empty suite and case names".to_string(),
            ));
        }

        Ok(format!(
            "{}_{}{DERIVED_EXTENSION}",
            identity.suite, identity.case
        ))
    }

    /// Record `data`, or compare it against the stored recording.
    ///
    /// If no recording file exists yet, `data` is written verbatim and the
    /// call succeeds (first-run semantics: absence of a baseline is not a
    /// failure). Otherwise the file is read back and compared by exact
    /// string equality; on inequality a mismatch directory is allocated,
    /// the configured handler runs once, and its error is returned. The
    /// success path never creates a mismatch directory.
    ///
    /// # Errors
    ///
    /// Returns [`KeepsakeError::Config`] if the recording directory is not
    /// set, [`KeepsakeError::Io`] on read/write failure, or the handler's
    /// error on a genuine mismatch.
    pub fn record(&mut self, data: &str) -> Result<()> {
        let recording_dir = self
            .recording_dir
            .clone()
            .ok_or_else(|| KeepsakeError::Config("recording directory is not set".to_string()))?;

        let filename = self.resolve_filename()?;
        self.resolve_handler();

        let recording_path = recording_dir.join(&filename);

        if recording_path.exists() {
            debug!("Recording file already exists: {}", recording_path.display());
            let recording_data = fs::read_to_string(&recording_path)?;
            self.compare(data, &recording_data, &recording_path)
        } else {
            debug!("Recording file does not exist: {}", recording_path.display());
            fs::write(&recording_path, data)?;
            Ok(())
        }
    }

    /// Record an ordered sequence of lines.
    ///
    /// Each element gets a trailing newline, including the last.
    ///
    /// # Errors
    ///
    /// Same as [`Recorder::record`].
    pub fn record_lines<I, S>(&mut self, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut data = String::new();
        for line in lines {
            data.push_str(line.as_ref());
            data.push('\n');
        }
        self.record(&data)
    }

    /// Serialize `value` to minimal JSON and record the result.
    ///
    /// The serialized form matches what
    /// [`JsonFilter::to_str`](crate::redact::JsonFilter::to_str) produces,
    /// so redacted payloads compare deterministically.
    ///
    /// # Errors
    ///
    /// Returns [`KeepsakeError::Json`] if serialization fails, otherwise
    /// the same as [`Recorder::record`].
    pub fn record_json<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let data = serde_json::to_string(value)?;
        self.record(&data)
    }

    /// Memoize the recording filename, deriving it from the test identity
    /// when not set explicitly.
    fn resolve_filename(&mut self) -> Result<String> {
        if let Some(filename) = &self.recording_filename {
            return Ok(filename.clone());
        }

        let filename = self.testname_as_filename()?;
        debug!("Recording filename not set, derived: {filename}");
        self.recording_filename = Some(filename.clone());
        Ok(filename)
    }

    /// Choose the default mismatch handler, at most once per recorder.
    ///
    /// Prefers the diff handler when the template is found upward from the
    /// working directory, otherwise falls back to the plain handler.
    fn resolve_handler(&mut self) {
        if !matches!(self.handler, HandlerSlot::Unresolved) {
            return;
        }

        self.handler = match resolve::find_upward(&self.diff_template) {
            Ok(template) => {
                debug!("Using diff visualizer: {}", template.display());
                HandlerSlot::Diff(template)
            }
            Err(e) => {
                debug!("Using default mismatch handler: {e}");
                HandlerSlot::Plain
            }
        };
    }

    fn compare(&self, data: &str, recording_data: &str, recording_path: &Path) -> Result<()> {
        if data == recording_data {
            debug!("No mismatch found");
            return Ok(());
        }

        debug!("Mismatch found");

        let mismatch_root = match &self.mismatch_root {
            Some(root) => root.clone(),
            None => env::temp_dir(),
        };
        let mismatch_dir = mismatch::allocate_in(&mismatch_root)?;

        let mismatch = Mismatch {
            recording_data: recording_data.to_string(),
            mismatch_data: data.to_string(),
            mismatch_dir,
            recording_path: recording_path.to_path_buf(),
        };

        Err(self.dispatch(mismatch))
    }

    fn dispatch(&self, mismatch: Mismatch) -> KeepsakeError {
        debug!(
            "Dispatching mismatch, artifacts in {}",
            mismatch.mismatch_dir.display()
        );

        match &self.handler {
            HandlerSlot::Custom(handler) => handler(mismatch),
            HandlerSlot::Diff(template) => mismatch::diff_handler(template, mismatch),
            HandlerSlot::Plain => mismatch::plain_handler(mismatch),
            // resolve_handler has run by the time a comparison dispatches
            HandlerSlot::Unresolved => unreachable!("mismatch handler not resolved"),
        }
    }
}

/// A filename is valid when it contains a dot with at least one character
/// after the last one (`.x` is valid, `data` and `data.` are not).
pub(crate) fn validate_filename(filename: &str) -> Result<()> {
    if filename.is_empty() {
        return Err(KeepsakeError::Config(
            "recording filename must not be empty".to_string(),
        ));
    }

    match filename.rfind('.') {
        Some(dot) if dot + 1 < filename.len() => Ok(()),
        _ => Err(KeepsakeError::Config(format!(
            "recording filename needs an extension: {filename}"
        ))),
    }
}
