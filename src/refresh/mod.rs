//! Best-effort self-update of the extraction dependency.
//!
//! Once per process start, shells out to the platform package manager to
//! upgrade `yt-dlp`. Bounded by a fixed deadline; every failure mode
//! (non-zero exit, timeout, spawn error) is reported and swallowed — an
//! outdated extractor is still worth trying.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::platform::{OsKind, PlatformProfile};

/// Upper bound on the upgrade subprocess; covers a cold pip install.
pub const REFRESH_TIMEOUT: Duration = Duration::from_secs(120);

/// How often the child is polled while waiting for the deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Failure of the upgrade subprocess. Only ever logged, never propagated.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The package manager could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// The package-manager invocation that failed.
        program: String,
        /// The underlying spawn error.
        #[source]
        source: io::Error,
    },

    /// The upgrade ran past the deadline and was killed.
    #[error("upgrade timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error while waiting on the child.
    #[error("failed waiting for upgrade process: {0}")]
    Io(#[from] io::Error),
}

/// Attempts to upgrade `yt-dlp` via the platform package manager.
///
/// Never fails the caller: all outcomes are logged and discarded.
pub fn refresh_extractor(profile: &PlatformProfile) {
    let (program, args) = upgrade_command(profile);
    info!(program = %program.display(), "Upgrading yt-dlp via platform package manager");

    match run_with_deadline(&program, &args, REFRESH_TIMEOUT) {
        Ok(output) if output.status.success() => {
            info!("yt-dlp upgrade finished");
        }
        Ok(output) => {
            warn!(
                exit_code = output.status.code(),
                stderr = %stderr_tail(&output.stderr),
                "yt-dlp upgrade failed; continuing with the installed version"
            );
        }
        Err(err) => {
            warn!(error = %err, "yt-dlp upgrade did not run; continuing with the installed version");
        }
    }
}

/// Picks the upgrade invocation for this platform: Homebrew when present on
/// macOS, otherwise pip.
#[must_use]
pub fn upgrade_command(profile: &PlatformProfile) -> (PathBuf, Vec<&'static str>) {
    if profile.os() == OsKind::MacOs {
        for brew in ["/opt/homebrew/bin/brew", "/usr/local/bin/brew"] {
            if Path::new(brew).is_file() {
                return (PathBuf::from(brew), vec!["upgrade", "yt-dlp"]);
            }
        }
    }

    match profile.os() {
        OsKind::Windows => (
            PathBuf::from("python"),
            vec!["-m", "pip", "install", "--upgrade", "yt-dlp"],
        ),
        OsKind::MacOs | OsKind::Unix => (
            PathBuf::from("pip3"),
            vec!["install", "--upgrade", "yt-dlp"],
        ),
    }
}

/// Runs a command to completion, killing it if the deadline passes.
///
/// Poll-based wait: `try_wait` until exit or deadline, then kill and reap.
///
/// # Errors
///
/// Returns [`RefreshError`] on spawn failure, timeout, or wait error.
pub(crate) fn run_with_deadline(
    program: &Path,
    args: &[&str],
    timeout: Duration,
) -> Result<Output, RefreshError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| RefreshError::Spawn {
            program: program.display().to_string(),
            source,
        })?;

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait()? {
            Some(_status) => return Ok(child.wait_with_output()?),
            None => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait(); // Reap the zombie
                    return Err(RefreshError::Timeout(timeout));
                }
                thread::sleep(POLL_INTERVAL);
            }
        }
    }
}

/// Last non-empty stderr line, for compact log output.
fn stderr_tail(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("")
        .to_string()
}
