//! HTML diff rendering for failed comparisons
//!
//! The template is treated as a structured contract: it must contain two
//! assignment slots, ``const oldText = `...`;`` and ``const newText =
//! `...`;``. The renderer replaces the backtick-block contents with the
//! recording and mismatch data and leaves the markers untouched. A
//! template missing either slot is rejected.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use super::Mismatch;
use crate::{KeepsakeError, Result};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{[^}]+\}").unwrap());

static OLD_TEXT_SLOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(const\s+oldText\s*=\s*`)([^`]*)(`;)").unwrap());

static NEW_TEXT_SLOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(const\s+newText\s*=\s*`)([^`]*)(`;)").unwrap());

/// Escape `${...}` placeholders with a backslash.
///
/// The data ends up inside a JavaScript template literal, where an
/// unescaped placeholder would be interpolated instead of displayed.
fn escape_placeholders(input: &str) -> String {
    PLACEHOLDER.replace_all(input, r"\${0}").into_owned()
}

/// Replace the backtick-block contents of one slot, keeping the markers.
fn fill_slot(content: &str, slot: &Regex, name: &str, data: &str) -> Result<String> {
    if !slot.is_match(content) {
        return Err(KeepsakeError::Template(format!("missing `{name}` slot")));
    }

    Ok(slot
        .replace_all(content, |caps: &Captures<'_>| {
            format!("{}{}{}", &caps[1], data, &caps[3])
        })
        .into_owned())
}

/// Render the diff template with both data variants embedded.
///
/// Writes the rendered HTML to `mismatch_dir/<template_filename>` and the
/// raw mismatch data to `mismatch_dir/<recording_filename>`, so the
/// payload is recoverable without opening the HTML. Returns the rendered
/// path.
///
/// # Errors
///
/// Returns [`KeepsakeError::Template`] if either slot is missing or a
/// filename cannot be derived, or [`KeepsakeError::Io`] if the template
/// cannot be read or an artifact cannot be written.
pub fn render(template_path: &Path, mismatch: &Mismatch) -> Result<PathBuf> {
    let content = fs::read_to_string(template_path)?;

    let old_text = escape_placeholders(&mismatch.recording_data);
    let new_text = escape_placeholders(&mismatch.mismatch_data);

    let content = fill_slot(&content, &OLD_TEXT_SLOT, "oldText", &old_text)?;
    let content = fill_slot(&content, &NEW_TEXT_SLOT, "newText", &new_text)?;

    let template_name = template_path.file_name().ok_or_else(|| {
        KeepsakeError::Template(format!("template has no filename: {}", template_path.display()))
    })?;

    let diff_path = mismatch.mismatch_dir.join(template_name);
    fs::write(&diff_path, content)?;

    let recording_name = mismatch.recording_path.file_name().ok_or_else(|| {
        KeepsakeError::Template(format!(
            "recording path has no filename: {}",
            mismatch.recording_path.display()
        ))
    })?;

    let payload_path = mismatch.mismatch_dir.join(recording_name);
    fs::write(&payload_path, &mismatch.mismatch_data)?;

    debug!("Rendered diff to {}", diff_path.display());

    Ok(diff_path)
}

/// Mismatch handler used when a diff template was found.
///
/// Renders the template and reports the recording path, the mismatch
/// payload path and the rendered diff path alongside both data variants.
/// A render failure propagates as its own error so "comparison failed"
/// stays distinguishable from "artifacts could not be written".
pub fn diff_handler(template_path: &Path, mismatch: Mismatch) -> KeepsakeError {
    match render(template_path, &mismatch) {
        Ok(diff_path) => {
            let mismatch_path = mismatch
                .recording_path
                .file_name()
                .map(|name| mismatch.mismatch_dir.join(name));

            KeepsakeError::Mismatch {
                recording_data: mismatch.recording_data,
                mismatch_data: mismatch.mismatch_data,
                recording_path: mismatch.recording_path,
                mismatch_path,
                diff_path: Some(diff_path),
            }
        }
        Err(e) => e,
    }
}
