//! Keepsake - Golden-file record-or-compare helper for deterministic tests
//!
//! A test hands freshly produced data to a [`recording::Recorder`]. On the
//! first run the data is persisted as the recording; on later runs it is
//! compared byte-for-byte against the stored recording and a structured
//! mismatch error is returned if they differ. Volatile JSON fields can be
//! stabilized beforehand with [`redact::JsonFilter`].

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::multiple_crate_versions
)]

pub mod config;
pub mod error;
pub mod mismatch;
pub mod recording;
pub mod redact;
pub mod resolve;

pub use error::{KeepsakeError, Result};
