//! Record-or-compare engine for golden-file tests

mod recorder;

pub use recorder::{Recorder, TestIdentity};

pub(crate) use recorder::validate_filename;

/// Extension appended to filenames derived from the test identity.
pub const DERIVED_EXTENSION: &str = ".data";

/// Relative path probed (upward from the working directory) for the
/// diff-visualization template.
pub const DIFF_TEMPLATE_RELATIVE: &str = "visualizer/recording_diff.html";
