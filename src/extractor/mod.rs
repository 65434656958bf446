//! The opaque extraction capability.
//!
//! Everything that actually understands video sites — page/API parsing,
//! stream selection, muxing, network transport — lives behind the
//! [`Extractor`] trait. The production backend shells out to the external
//! `yt-dlp` binary; tests substitute scripted stubs.

use thiserror::Error;

use crate::download::DownloadOptions;

mod ytdlp;

pub use ytdlp::YtDlpExtractor;

/// Error raised by an extraction backend.
///
/// Carries the raw error text verbatim: downstream classification is
/// substring matching over this message (see
/// [`crate::download::classify_error`]).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ExtractError {
    /// The raw error text reported by the backend.
    pub message: String,
}

impl ExtractError {
    /// Creates an error from raw backend output.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A single progress report from an in-flight download.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Completion percentage, 0.0 to 100.0.
    pub percent: f32,
    /// Short human-readable phase description.
    pub status: String,
}

/// A backend that resolves a video URL to media streams and downloads them.
///
/// Implementations block until the download completes or fails; the progress
/// callback is invoked synchronously on the calling thread.
pub trait Extractor {
    /// Downloads the media behind `url` according to `options`.
    ///
    /// Returns the media title on success.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] carrying the backend's raw error text on any
    /// failure (unreachable binary, extraction failure, non-zero exit).
    fn extract_and_download(
        &self,
        url: &str,
        options: &DownloadOptions,
        progress: &mut dyn FnMut(ProgressUpdate),
    ) -> Result<String, ExtractError>;
}
