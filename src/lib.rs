//! Vidfetch Core Library
//!
//! This library backs the `vidfetch` binary, an interactive front-end for the
//! external `yt-dlp` extraction tool. It owns everything *around* the
//! extraction: the prompt loop, OS-dependent destination paths, the ordered
//! fallback policy applied to known failure signatures, and the best-effort
//! self-update of the extraction dependency at startup.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`app`] - Interactive prompt loop and dispatch
//! - [`platform`] - Platform profile (destination paths, muxer discovery)
//! - [`extractor`] - The opaque extraction capability and its yt-dlp backend
//! - [`download`] - Per-attempt options, fallback policy, and the engine
//! - [`refresh`] - Startup upgrade of the extraction dependency
//!
//! Site extraction, stream selection/muxing, and network transport all live
//! inside `yt-dlp` (and `ffmpeg`), consumed as opaque external binaries.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod download;
pub mod extractor;
pub mod platform;
pub mod progress;
pub mod refresh;

// Re-export commonly used types
pub use download::{
    DownloadEngine, DownloadOptions, DownloadReport, EngineError, ErrorCategory, classify_error,
};
pub use extractor::{ExtractError, Extractor, ProgressUpdate, YtDlpExtractor};
pub use platform::{OsKind, PlatformProfile};
