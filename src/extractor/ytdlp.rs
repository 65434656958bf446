//! `yt-dlp` extraction backend.
//!
//! Spawns the external `yt-dlp` binary with arguments derived from a
//! [`DownloadOptions`] record, streams its stdout line by line to surface
//! progress, and collects stderr in full so failures can be classified by
//! their error text.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::thread;

use regex::Regex;
use tracing::{debug, instrument, trace};

use crate::download::DownloadOptions;
use crate::extractor::{ExtractError, Extractor, ProgressUpdate};
use crate::platform::{OsKind, PlatformProfile};

/// Progress line, e.g. `[download]  42.3% of 10.00MiB at 1.00MiB/s ETA 00:05`.
#[allow(clippy::expect_used)]
static PROGRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[download\]\s+(\d+(?:\.\d+)?)%").expect("progress regex is valid") // Static pattern, safe to panic
});

/// Destination line announcing the output file, the title source.
#[allow(clippy::expect_used)]
static DEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[download\]\s+Destination:\s+(.+)").expect("destination regex is valid") // Static pattern, safe to panic
});

/// Merge phase announcement from the muxing post-processor.
#[allow(clippy::expect_used)]
static MERGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[Merger\]\s+Merging formats into "(.+)""#).expect("merger regex is valid") // Static pattern, safe to panic
});

/// Skip line for files already present on disk.
#[allow(clippy::expect_used)]
static ALREADY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[download\]\s+(.+?) has already been downloaded")
        .expect("already-downloaded regex is valid") // Static pattern, safe to panic
});

/// One recognized event in the yt-dlp stdout stream.
#[derive(Debug, Clone, PartialEq)]
enum LineEvent {
    Progress(f32),
    Destination(String),
    Merging(String),
    AlreadyDownloaded(String),
}

/// Parses a single `--newline` stdout line into an event, if recognized.
fn parse_output_line(line: &str) -> Option<LineEvent> {
    if let Some(caps) = PROGRESS_RE.captures(line) {
        let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
        return Some(LineEvent::Progress(percent));
    }
    if let Some(caps) = DEST_RE.captures(line) {
        return Some(LineEvent::Destination(title_from_path(caps.get(1)?.as_str())));
    }
    if let Some(caps) = MERGE_RE.captures(line) {
        return Some(LineEvent::Merging(title_from_path(caps.get(1)?.as_str())));
    }
    if let Some(caps) = ALREADY_RE.captures(line) {
        return Some(LineEvent::AlreadyDownloaded(title_from_path(
            caps.get(1)?.as_str(),
        )));
    }
    None
}

/// Derives a display title from an output path: the file stem of the
/// destination yt-dlp announced (the output template is `%(title)s.%(ext)s`).
fn title_from_path(path: &str) -> String {
    Path::new(path.trim())
        .file_stem()
        .map_or_else(|| path.trim().to_string(), |stem| stem.to_string_lossy().into_owned())
}

/// Extraction backend that shells out to the `yt-dlp` binary.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    binary: PathBuf,
}

impl YtDlpExtractor {
    /// Locates the `yt-dlp` binary for `profile`.
    ///
    /// Probes well-known install locations, then the search path. Falls back
    /// to the bare binary name so the OS gets a final chance to resolve it at
    /// spawn time.
    #[must_use]
    pub fn locate(profile: &PlatformProfile) -> Self {
        let name = match profile.os() {
            OsKind::Windows => "yt-dlp.exe",
            OsKind::MacOs | OsKind::Unix => "yt-dlp",
        };

        let well_known = match profile.os() {
            OsKind::MacOs => vec![
                PathBuf::from("/opt/homebrew/bin/yt-dlp"),
                PathBuf::from("/usr/local/bin/yt-dlp"),
                PathBuf::from("/usr/bin/yt-dlp"),
            ],
            OsKind::Unix => vec![
                PathBuf::from("/usr/local/bin/yt-dlp"),
                PathBuf::from("/usr/bin/yt-dlp"),
            ],
            OsKind::Windows => Vec::new(),
        };

        let binary = well_known
            .into_iter()
            .find(|candidate| candidate.is_file())
            .or_else(|| profile.search_path(name))
            .unwrap_or_else(|| PathBuf::from(name));

        debug!(binary = %binary.display(), "Resolved extraction binary");
        Self { binary }
    }

    /// Builds one with an explicit binary path (tests, custom installs).
    #[must_use]
    pub fn with_binary(binary: PathBuf) -> Self {
        Self { binary }
    }

    /// Maps an options record onto a yt-dlp argument vector.
    #[must_use]
    pub fn build_args(options: &DownloadOptions, url: &str) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            options.format.clone(),
            "--no-playlist".to_string(),
            "--newline".to_string(),
            // Self-update is handled at process start, not per download.
            "--no-update".to_string(),
            "-P".to_string(),
            options.destination.display().to_string(),
            "-o".to_string(),
            options.output_template.clone(),
            "--retries".to_string(),
            options.retries.to_string(),
            "--fragment-retries".to_string(),
            options.fragment_retries.to_string(),
        ];

        if let Some(user_agent) = &options.user_agent {
            args.push("--user-agent".to_string());
            args.push(user_agent.clone());
        }
        if let Some(referer) = &options.referer {
            args.push("--referer".to_string());
            args.push(referer.clone());
        }
        if !options.check_certificates {
            args.push("--no-check-certificates".to_string());
        }
        if options.ignore_errors {
            args.push("--ignore-errors".to_string());
        }
        if let Some(muxer) = &options.muxer_path {
            args.push("--ffmpeg-location".to_string());
            args.push(muxer.display().to_string());
        }

        args.push(url.to_string());
        args
    }
}

impl Extractor for YtDlpExtractor {
    #[instrument(skip(self, options, progress), fields(binary = %self.binary.display()))]
    fn extract_and_download(
        &self,
        url: &str,
        options: &DownloadOptions,
        progress: &mut dyn FnMut(ProgressUpdate),
    ) -> Result<String, ExtractError> {
        let args = Self::build_args(options, url);
        trace!(?args, "Spawning yt-dlp");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                ExtractError::new(format!(
                    "failed to start {}: {err}",
                    self.binary.display()
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExtractError::new("failed to capture yt-dlp stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ExtractError::new("failed to capture yt-dlp stderr"))?;

        // Drain stderr on a helper thread so neither pipe can fill up and
        // stall the child while we block on stdout.
        let stderr_handle = thread::spawn(move || {
            let reader = BufReader::new(stderr);
            let mut lines = Vec::new();
            for line in reader.lines().map_while(Result::ok) {
                lines.push(line);
            }
            lines.join("\n")
        });

        let mut title: Option<String> = None;
        for line in BufReader::new(stdout).lines().map_while(Result::ok) {
            match parse_output_line(&line) {
                Some(LineEvent::Progress(percent)) => progress(ProgressUpdate {
                    percent,
                    status: "downloading".to_string(),
                }),
                Some(LineEvent::Destination(name)) => {
                    progress(ProgressUpdate {
                        percent: 0.0,
                        status: format!("starting {name}"),
                    });
                    title = Some(name);
                }
                Some(LineEvent::Merging(name)) => {
                    progress(ProgressUpdate {
                        percent: 99.0,
                        status: "merging audio and video".to_string(),
                    });
                    title = Some(name);
                }
                Some(LineEvent::AlreadyDownloaded(name)) => {
                    progress(ProgressUpdate {
                        percent: 100.0,
                        status: "already downloaded".to_string(),
                    });
                    title = Some(name);
                }
                None => trace!(line, "Unrecognized yt-dlp output line"),
            }
        }

        let status = child
            .wait()
            .map_err(|err| ExtractError::new(format!("failed to wait for yt-dlp: {err}")))?;
        let stderr_text = stderr_handle.join().unwrap_or_default();

        if status.success() {
            Ok(title.unwrap_or_else(|| url.to_string()))
        } else if stderr_text.trim().is_empty() {
            Err(ExtractError::new(format!("yt-dlp exited with {status}")))
        } else {
            Err(ExtractError::new(stderr_text))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::platform::{OsKind, PlatformProfile};
    use std::collections::HashMap;

    fn unix_profile() -> PlatformProfile {
        PlatformProfile::with_environment(
            OsKind::Unix,
            Some(PathBuf::from("/home/kim")),
            HashMap::new(),
        )
    }

    #[test]
    fn test_parse_progress_line_extracts_percent() {
        let event =
            parse_output_line("[download]  42.3% of 10.00MiB at 1.00MiB/s ETA 00:05").unwrap();
        assert_eq!(event, LineEvent::Progress(42.3));
    }

    #[test]
    fn test_parse_destination_line_yields_title_stem() {
        let event =
            parse_output_line("[download] Destination: /home/kim/Videos/My Clip.webm").unwrap();
        assert_eq!(event, LineEvent::Destination("My Clip".to_string()));
    }

    #[test]
    fn test_parse_merger_line_yields_title_stem() {
        let event = parse_output_line(
            r#"[Merger] Merging formats into "/home/kim/Videos/My Clip.mkv""#,
        )
        .unwrap();
        assert_eq!(event, LineEvent::Merging("My Clip".to_string()));
    }

    #[test]
    fn test_parse_already_downloaded_line() {
        let event =
            parse_output_line("[download] /home/kim/Videos/My Clip.mp4 has already been downloaded")
                .unwrap();
        assert_eq!(event, LineEvent::AlreadyDownloaded("My Clip".to_string()));
    }

    #[test]
    fn test_parse_unrelated_line_is_none() {
        assert!(parse_output_line("[youtube] abc123: Downloading webpage").is_none());
    }

    #[test]
    fn test_build_args_base_shape() {
        let options = DownloadOptions::base(&unix_profile());
        let args = YtDlpExtractor::build_args(&options, "https://example.com/watch?v=1");

        assert_eq!(args[0], "-f");
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(args.contains(&"--newline".to_string()));
        assert_eq!(args.last().unwrap(), "https://example.com/watch?v=1");
        // Base attempt: default identity, certificates verified.
        assert!(!args.contains(&"--user-agent".to_string()));
        assert!(!args.contains(&"--no-check-certificates".to_string()));
        assert!(!args.contains(&"--ignore-errors".to_string()));
    }

    #[test]
    fn test_build_args_fallback_carries_identity_and_relaxations() {
        let options = DownloadOptions::forbidden_fallback(&unix_profile());
        let args = YtDlpExtractor::build_args(&options, "https://example.com/watch?v=1");

        assert!(args.contains(&"--user-agent".to_string()));
        assert!(args.contains(&"--referer".to_string()));
        assert!(args.contains(&"--no-check-certificates".to_string()));
        assert!(args.contains(&"--ignore-errors".to_string()));
    }

    #[test]
    fn test_extract_reports_spawn_failure_as_error() {
        let extractor =
            YtDlpExtractor::with_binary(PathBuf::from("/nonexistent/vidfetch-test-ytdlp"));
        let options = DownloadOptions::base(&unix_profile());
        let mut sink = |_update: ProgressUpdate| {};

        let err = extractor
            .extract_and_download("https://example.com", &options, &mut sink)
            .unwrap_err();
        assert!(err.message.contains("failed to start"));
    }
}
