//! Per-attempt download configuration, fallback policy, and the engine that
//! drives them.

mod engine;
mod options;
mod policy;

pub use engine::{DownloadEngine, DownloadReport, EngineError};
pub use options::{
    DEFAULT_FRAGMENT_RETRIES, DEFAULT_RETRIES, DownloadOptions, FALLBACK_REFERER,
    FALLBACK_USER_AGENT, GENERIC_FORMAT, MERGED_FORMAT, OUTPUT_TEMPLATE, PROGRESSIVE_FORMAT,
};
pub use policy::{ErrorCategory, FORBIDDEN_REMEDIATION, classify_error};
