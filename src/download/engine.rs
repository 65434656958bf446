//! The download engine: base attempt plus ordered fallback retries.
//!
//! The engine owns no I/O of its own. It builds a fresh options record per
//! attempt, hands it to the injected [`Extractor`], classifies failures, and
//! walks the fallback table until success or exhaustion.

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::download::policy::{FALLBACK_RULES, FORBIDDEN_REMEDIATION};
use crate::download::{DownloadOptions, ErrorCategory, classify_error};
use crate::extractor::{Extractor, ProgressUpdate};
use crate::platform::PlatformProfile;

/// Outcome of a successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// Media title reported by the extractor.
    pub title: String,
    /// Total attempts made, including the successful one.
    pub attempts: u32,
}

/// Final failure after the fallback chain is exhausted.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Access stayed forbidden even with the fallback identity; manual
    /// remediation steps apply.
    #[error("access forbidden: {message}")]
    Forbidden {
        /// Raw error text from the last attempt.
        message: String,
    },

    /// Unrecovered extraction failure (unknown signature, or a fallback that
    /// failed with a different category).
    #[error("{message}")]
    Extraction {
        /// Raw error text from the last attempt.
        message: String,
    },
}

impl EngineError {
    /// Manual remediation steps for this failure, when any exist.
    #[must_use]
    pub fn remediation(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::Forbidden { .. } => Some(&FORBIDDEN_REMEDIATION),
            Self::Extraction { .. } => None,
        }
    }
}

/// Drives one URL through the base attempt and the fallback table.
pub struct DownloadEngine<'a, E: Extractor> {
    extractor: &'a E,
    profile: &'a PlatformProfile,
}

impl<'a, E: Extractor> DownloadEngine<'a, E> {
    /// Creates an engine over an extractor and a platform profile.
    #[must_use]
    pub fn new(extractor: &'a E, profile: &'a PlatformProfile) -> Self {
        Self { extractor, profile }
    }

    /// Downloads `url`, applying fallback configurations on known failure
    /// signatures. Each fallback rule fires at most once, so a relaxed-format
    /// retry that then hits a 403 can still fall through to the forbidden
    /// fallback.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Forbidden`] when access stays forbidden after
    /// the identity-substitution fallback, and [`EngineError::Extraction`]
    /// for any other unrecovered failure.
    #[instrument(skip(self, progress))]
    pub fn download(
        &self,
        url: &str,
        progress: &mut dyn FnMut(ProgressUpdate),
    ) -> Result<DownloadReport, EngineError> {
        let mut options = DownloadOptions::base(self.profile);
        let mut fired = [false; FALLBACK_RULES.len()];
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            info!(attempt = attempts, format = %options.format, "Starting extraction attempt");

            let error = match self.extractor.extract_and_download(url, &options, progress) {
                Ok(title) => {
                    info!(%title, attempts, "Download succeeded");
                    return Ok(DownloadReport { title, attempts });
                }
                Err(error) => error,
            };

            let category = classify_error(&error.message);
            warn!(attempt = attempts, ?category, error = %error, "Extraction attempt failed");

            let next = FALLBACK_RULES
                .iter()
                .enumerate()
                .find(|(index, rule)| !fired[*index] && rule.trigger == category);

            let Some((index, rule)) = next else {
                return Err(match category {
                    ErrorCategory::Forbidden => EngineError::Forbidden {
                        message: error.message,
                    },
                    ErrorCategory::FormatUnavailable | ErrorCategory::Other => {
                        EngineError::Extraction {
                            message: error.message,
                        }
                    }
                });
            };

            fired[index] = true;
            info!(fallback = rule.label, "Retrying with fallback configuration");
            options = (rule.build)(self.profile);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::download::{FALLBACK_USER_AGENT, GENERIC_FORMAT, MERGED_FORMAT};
    use crate::extractor::ExtractError;
    use crate::platform::OsKind;
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};
    use std::path::PathBuf;

    /// Extractor stub that replays a fixed script of outcomes and records the
    /// options each attempt received.
    struct ScriptedExtractor {
        script: RefCell<VecDeque<Result<String, ExtractError>>>,
        seen: RefCell<Vec<DownloadOptions>>,
    }

    impl ScriptedExtractor {
        fn new(script: Vec<Result<String, ExtractError>>) -> Self {
            Self {
                script: RefCell::new(script.into()),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<DownloadOptions> {
            self.seen.borrow().clone()
        }
    }

    impl Extractor for ScriptedExtractor {
        fn extract_and_download(
            &self,
            _url: &str,
            options: &DownloadOptions,
            _progress: &mut dyn FnMut(ProgressUpdate),
        ) -> Result<String, ExtractError> {
            self.seen.borrow_mut().push(options.clone());
            self.script
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(ExtractError::new("script exhausted")))
        }
    }

    fn profile() -> PlatformProfile {
        PlatformProfile::with_environment(
            OsKind::Unix,
            Some(PathBuf::from("/home/kim")),
            HashMap::new(),
        )
    }

    fn ok(title: &str) -> Result<String, ExtractError> {
        Ok(title.to_string())
    }

    fn fail(message: &str) -> Result<String, ExtractError> {
        Err(ExtractError::new(message))
    }

    fn sink() -> impl FnMut(ProgressUpdate) {
        |_update| {}
    }

    #[test]
    fn test_success_on_first_attempt() {
        let profile = profile();
        let extractor = ScriptedExtractor::new(vec![ok("My Clip")]);
        let engine = DownloadEngine::new(&extractor, &profile);

        let report = engine.download("https://example.com", &mut sink()).unwrap();
        assert_eq!(report.title, "My Clip");
        assert_eq!(report.attempts, 1);
        assert_eq!(extractor.seen()[0].format, MERGED_FORMAT);
    }

    #[test]
    fn test_format_unavailable_retries_once_with_relaxed_selector() {
        let profile = profile();
        let extractor = ScriptedExtractor::new(vec![
            fail("ERROR: Requested format is not available"),
            ok("My Clip"),
        ]);
        let engine = DownloadEngine::new(&extractor, &profile);

        let report = engine.download("https://example.com", &mut sink()).unwrap();
        assert_eq!(report.attempts, 2);

        let seen = extractor.seen();
        assert_eq!(seen.len(), 2, "exactly two attempts");
        assert_eq!(seen[1].format, GENERIC_FORMAT);
        assert!(seen[1].user_agent.is_none(), "relaxed retry keeps identity");
    }

    #[test]
    fn test_forbidden_retries_with_fallback_identity() {
        let profile = profile();
        let extractor = ScriptedExtractor::new(vec![
            fail("ERROR: unable to download video data: HTTP Error 403: Forbidden"),
            ok("My Clip"),
        ]);
        let engine = DownloadEngine::new(&extractor, &profile);

        let report = engine.download("https://example.com", &mut sink()).unwrap();
        assert_eq!(report.attempts, 2);

        let seen = extractor.seen();
        assert_eq!(
            seen[1].user_agent.as_deref(),
            Some(FALLBACK_USER_AGENT),
            "fallback attempt carries the alternate identity"
        );
        assert!(seen[1].ignore_errors);
        assert!(!seen[1].check_certificates);
    }

    #[test]
    fn test_persistent_forbidden_reports_remediation_hints() {
        let profile = profile();
        let extractor = ScriptedExtractor::new(vec![
            fail("HTTP Error 403: Forbidden"),
            fail("HTTP Error 403: Forbidden"),
        ]);
        let engine = DownloadEngine::new(&extractor, &profile);

        let err = engine
            .download("https://example.com", &mut sink())
            .unwrap_err();
        assert!(matches!(err, EngineError::Forbidden { .. }));
        assert_eq!(err.remediation().unwrap().len(), 3);
        assert_eq!(extractor.seen().len(), 2, "forbidden rule fires only once");
    }

    #[test]
    fn test_unknown_failure_is_not_retried() {
        let profile = profile();
        let extractor =
            ScriptedExtractor::new(vec![fail("ERROR: [youtube] abc: Video unavailable")]);
        let engine = DownloadEngine::new(&extractor, &profile);

        let err = engine
            .download("https://example.com", &mut sink())
            .unwrap_err();
        assert!(matches!(err, EngineError::Extraction { .. }));
        assert!(err.remediation().is_none());
        assert_eq!(extractor.seen().len(), 1);
    }

    #[test]
    fn test_relaxed_retry_can_still_fall_through_to_forbidden_fallback() {
        let profile = profile();
        let extractor = ScriptedExtractor::new(vec![
            fail("ERROR: Requested format is not available"),
            fail("HTTP Error 403: Forbidden"),
            ok("My Clip"),
        ]);
        let engine = DownloadEngine::new(&extractor, &profile);

        let report = engine.download("https://example.com", &mut sink()).unwrap();
        assert_eq!(report.attempts, 3);
        assert_eq!(
            extractor.seen()[2].user_agent.as_deref(),
            Some(FALLBACK_USER_AGENT)
        );
    }

    #[test]
    fn test_format_rule_does_not_fire_twice() {
        let profile = profile();
        let extractor = ScriptedExtractor::new(vec![
            fail("ERROR: Requested format is not available"),
            fail("ERROR: Requested format is not available"),
        ]);
        let engine = DownloadEngine::new(&extractor, &profile);

        let err = engine
            .download("https://example.com", &mut sink())
            .unwrap_err();
        assert!(matches!(err, EngineError::Extraction { .. }));
        assert_eq!(extractor.seen().len(), 2);
    }
}
