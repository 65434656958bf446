//! Progress reporting for in-flight downloads.
//!
//! Renders an indicatif percentage bar when stderr is a terminal; otherwise
//! prints plain percentage lines so piped output stays readable.

use std::io::{self, IsTerminal};

use indicatif::{ProgressBar, ProgressStyle};

use crate::extractor::ProgressUpdate;

/// Sink for the extractor's synchronous progress callback.
pub struct ProgressReporter {
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    /// Reporter for the current process: bar on a terminal, plain lines
    /// otherwise.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_bar(io::stderr().is_terminal())
    }

    /// Reporter with the bar explicitly enabled or disabled.
    #[must_use]
    pub fn with_bar(enabled: bool) -> Self {
        if !enabled {
            return Self { bar: None };
        }
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar: Some(bar) }
    }

    /// Handles one progress update from the extractor.
    pub fn update(&self, update: &ProgressUpdate) {
        match &self.bar {
            Some(bar) => {
                bar.set_position(position_for_percent(update.percent));
                bar.set_message(update.status.clone());
            }
            None => println!("Download progress: {:.1}%", update.percent),
        }
    }

    /// Clears the bar once the download settles.
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

/// Clamps a reported percentage into the bar's 0..=100 range.
// Truncation is intentional and bounded by the clamp.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn position_for_percent(percent: f32) -> u64 {
    if percent.is_nan() || percent <= 0.0 {
        0
    } else if percent >= 100.0 {
        100
    } else {
        percent as u64
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_position_clamps_to_bar_range() {
        assert_eq!(position_for_percent(-5.0), 0);
        assert_eq!(position_for_percent(0.0), 0);
        assert_eq!(position_for_percent(42.9), 42);
        assert_eq!(position_for_percent(100.0), 100);
        assert_eq!(position_for_percent(250.0), 100);
        assert_eq!(position_for_percent(f32::NAN), 0);
    }

    #[test]
    fn test_disabled_reporter_has_no_bar() {
        let reporter = ProgressReporter::with_bar(false);
        assert!(reporter.bar.is_none());
        // finish() on a bar-less reporter is a no-op.
        reporter.finish();
    }

    #[test]
    fn test_enabled_reporter_tracks_updates() {
        let reporter = ProgressReporter::with_bar(true);
        reporter.update(&ProgressUpdate {
            percent: 37.5,
            status: "downloading".to_string(),
        });
        assert_eq!(reporter.bar.as_ref().unwrap().position(), 37);
        reporter.finish();
    }
}
