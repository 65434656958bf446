//! The transient configuration record for one download attempt.
//!
//! Constructed fresh per attempt from the platform profile, never persisted.
//! The three constructors mirror the execution policy: a base attempt, a
//! relaxed-format retry, and the forbidden-access fallback.

use std::path::PathBuf;

use crate::platform::{OsKind, PlatformProfile};

/// Best separate video and audio streams, merged by the muxing binary.
pub const MERGED_FORMAT: &str = "bestvideo*+bestaudio/best";

/// Best single stream that already contains both audio and video.
///
/// Used when no muxing binary is discoverable on Windows: the selector must
/// never contain the `+` merge operator, since the merge step cannot run.
pub const PROGRESSIVE_FORMAT: &str = "best[vcodec!=none][acodec!=none]/best";

/// Generic best-effort selector used by the fallback attempts.
pub const GENERIC_FORMAT: &str = "best";

/// Output file naming: title and extension as supplied by the extractor.
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Retry count passed to the extractor on the base attempt.
pub const DEFAULT_RETRIES: u32 = 3;

/// Fragment retry count passed to the extractor on the base attempt.
pub const DEFAULT_FRAGMENT_RETRIES: u32 = 3;

/// Raised retry counts for the forbidden-access fallback.
const FALLBACK_RETRIES: u32 = 10;
const FALLBACK_FRAGMENT_RETRIES: u32 = 10;

/// Alternate browser identity used by the forbidden-access fallback.
pub const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Referer sent alongside the alternate identity.
pub const FALLBACK_REFERER: &str = "https://www.youtube.com/";

/// Configuration for a single extraction attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOptions {
    /// Directory downloads are written to (OS-dependent).
    pub destination: PathBuf,
    /// Output file naming template.
    pub output_template: String,
    /// Format-selection expression.
    pub format: String,
    /// User-Agent override; `None` keeps the extractor's default identity.
    pub user_agent: Option<String>,
    /// Referer override.
    pub referer: Option<String>,
    /// Whole-download retry count handed to the extractor.
    pub retries: u32,
    /// Per-fragment retry count handed to the extractor.
    pub fragment_retries: u32,
    /// Whether TLS certificates are verified.
    pub check_certificates: bool,
    /// Whether per-item errors are ignored instead of aborting.
    pub ignore_errors: bool,
    /// Discovered muxing binary, when one exists.
    pub muxer_path: Option<PathBuf>,
}

impl DownloadOptions {
    /// Base configuration: best combined video+audio, default identity.
    ///
    /// On Windows without a discoverable muxing binary the selector is
    /// restricted to progressive formats so no merge step is required.
    #[must_use]
    pub fn base(profile: &PlatformProfile) -> Self {
        let muxer_path = profile.find_muxer();
        let format = if requires_progressive(profile, muxer_path.as_ref()) {
            PROGRESSIVE_FORMAT
        } else {
            MERGED_FORMAT
        };

        Self {
            destination: profile.destination_dir(),
            output_template: OUTPUT_TEMPLATE.to_string(),
            format: format.to_string(),
            user_agent: None,
            referer: None,
            retries: DEFAULT_RETRIES,
            fragment_retries: DEFAULT_FRAGMENT_RETRIES,
            check_certificates: true,
            ignore_errors: false,
            muxer_path,
        }
    }

    /// Relaxed-format retry: generic best-effort selector, everything else
    /// as the base attempt.
    #[must_use]
    pub fn relaxed_format(profile: &PlatformProfile) -> Self {
        let mut options = Self::base(profile);
        options.format = generic_format(profile, options.muxer_path.as_ref()).to_string();
        options
    }

    /// Forbidden-access fallback: generic selector, alternate identity,
    /// raised retry counts, certificate checks off, per-item errors ignored.
    #[must_use]
    pub fn forbidden_fallback(profile: &PlatformProfile) -> Self {
        let mut options = Self::relaxed_format(profile);
        options.user_agent = Some(FALLBACK_USER_AGENT.to_string());
        options.referer = Some(FALLBACK_REFERER.to_string());
        options.retries = FALLBACK_RETRIES;
        options.fragment_retries = FALLBACK_FRAGMENT_RETRIES;
        options.check_certificates = false;
        options.ignore_errors = true;
        options
    }
}

/// A merge-free selector is required on Windows when no muxing binary exists.
fn requires_progressive(profile: &PlatformProfile, muxer: Option<&PathBuf>) -> bool {
    profile.os() == OsKind::Windows && muxer.is_none()
}

/// The relaxed selector, narrowed to progressive formats where merging is
/// impossible.
fn generic_format(profile: &PlatformProfile, muxer: Option<&PathBuf>) -> &'static str {
    if requires_progressive(profile, muxer) {
        PROGRESSIVE_FORMAT
    } else {
        GENERIC_FORMAT
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn unix_profile() -> PlatformProfile {
        PlatformProfile::with_environment(
            OsKind::Unix,
            Some(PathBuf::from("/home/kim")),
            HashMap::new(),
        )
    }

    /// Windows with empty environment: no muxer is discoverable.
    fn muxerless_windows_profile() -> PlatformProfile {
        PlatformProfile::with_environment(
            OsKind::Windows,
            Some(PathBuf::from("/tmp/vidfetch-no-such-home")),
            HashMap::new(),
        )
    }

    #[test]
    fn test_base_options_request_merged_streams() {
        let options = DownloadOptions::base(&unix_profile());
        assert_eq!(options.format, MERGED_FORMAT);
        assert_eq!(options.destination, PathBuf::from("/home/kim/Videos"));
        assert_eq!(options.output_template, OUTPUT_TEMPLATE);
        assert!(options.user_agent.is_none());
        assert!(options.check_certificates);
        assert!(!options.ignore_errors);
    }

    #[test]
    fn test_windows_without_muxer_never_uses_merge_operator() {
        let profile = muxerless_windows_profile();
        for options in [
            DownloadOptions::base(&profile),
            DownloadOptions::relaxed_format(&profile),
            DownloadOptions::forbidden_fallback(&profile),
        ] {
            assert!(
                !options.format.contains('+'),
                "selector {:?} contains a merge operator",
                options.format
            );
        }
    }

    #[test]
    fn test_relaxed_format_is_generic_best() {
        let options = DownloadOptions::relaxed_format(&unix_profile());
        assert_eq!(options.format, GENERIC_FORMAT);
        assert!(options.user_agent.is_none(), "relaxed retry keeps identity");
    }

    #[test]
    fn test_forbidden_fallback_substitutes_identity_and_relaxes_policy() {
        let options = DownloadOptions::forbidden_fallback(&unix_profile());
        assert_eq!(options.format, GENERIC_FORMAT);
        assert_eq!(options.user_agent.as_deref(), Some(FALLBACK_USER_AGENT));
        assert_eq!(options.referer.as_deref(), Some(FALLBACK_REFERER));
        assert!(options.retries > DEFAULT_RETRIES);
        assert!(options.fragment_retries > DEFAULT_FRAGMENT_RETRIES);
        assert!(!options.check_certificates);
        assert!(options.ignore_errors);
    }
}
