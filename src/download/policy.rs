//! Failure classification and the ordered fallback table.
//!
//! The extraction capability is an external binary, so there is no structured
//! error channel: classification is substring matching over the raw error
//! text. The matched signatures are a compatibility shim tied to the wording
//! yt-dlp uses today; they are concentrated here so a wording change is a
//! one-file fix.

use crate::download::DownloadOptions;
use crate::platform::PlatformProfile;

/// Failure taxonomy for one extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The requested format selector matched nothing; recovered by selector
    /// relaxation.
    FormatUnavailable,
    /// The site refused access (HTTP 403); recovered by identity/retry-policy
    /// substitution.
    Forbidden,
    /// Everything else; surfaced without retry.
    Other,
}

/// Classifies raw extractor error text into a failure category.
#[must_use]
pub fn classify_error(message: &str) -> ErrorCategory {
    if message.contains("Requested format is not available") {
        ErrorCategory::FormatUnavailable
    } else if message.contains("HTTP Error 403") || message.contains("Forbidden") {
        ErrorCategory::Forbidden
    } else {
        ErrorCategory::Other
    }
}

/// One entry in the fallback table: when `trigger` matches a failed attempt's
/// category, retry once with the configuration `build` produces.
pub struct FallbackRule {
    /// Short name used in logs.
    pub label: &'static str,
    /// Failure category this rule recovers from.
    pub trigger: ErrorCategory,
    /// Fallback configuration for the retry.
    pub build: fn(&PlatformProfile) -> DownloadOptions,
}

/// The ordered fallback policy. Each rule fires at most once per URL.
pub(crate) const FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule {
        label: "relaxed-format",
        trigger: ErrorCategory::FormatUnavailable,
        build: DownloadOptions::relaxed_format,
    },
    FallbackRule {
        label: "forbidden-fallback",
        trigger: ErrorCategory::Forbidden,
        build: DownloadOptions::forbidden_fallback,
    },
];

/// Manual remediation steps surfaced when the forbidden-access fallback also
/// fails.
pub const FORBIDDEN_REMEDIATION: [&str; 3] = [
    "Update yt-dlp to the latest release and try again.",
    "Try a different network or a VPN; the site may be blocking this address.",
    "Wait a while before retrying; the site may be rate-limiting requests.",
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_format_unavailable() {
        assert_eq!(
            classify_error("ERROR: [youtube] abc: Requested format is not available"),
            ErrorCategory::FormatUnavailable
        );
    }

    #[test]
    fn test_classify_forbidden_by_status_line() {
        assert_eq!(
            classify_error("ERROR: unable to download video data: HTTP Error 403: Forbidden"),
            ErrorCategory::Forbidden
        );
    }

    #[test]
    fn test_classify_forbidden_by_word_alone() {
        assert_eq!(
            classify_error("ERROR: fragment not found: Forbidden"),
            ErrorCategory::Forbidden
        );
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(
            classify_error("ERROR: [youtube] abc: Video unavailable"),
            ErrorCategory::Other
        );
    }

    #[test]
    fn test_fallback_table_order_matches_execution_policy() {
        assert_eq!(FALLBACK_RULES[0].trigger, ErrorCategory::FormatUnavailable);
        assert_eq!(FALLBACK_RULES[1].trigger, ErrorCategory::Forbidden);
        // No rule recovers from Other.
        assert!(
            FALLBACK_RULES
                .iter()
                .all(|rule| rule.trigger != ErrorCategory::Other)
        );
    }
}
