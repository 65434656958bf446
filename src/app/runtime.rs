//! The interactive run loop.
//!
//! Refreshes the extraction dependency once, then prompts for URLs until the
//! exit sentinel or end of input. Download failures are reported and the loop
//! continues; nothing a single URL does can take the session down.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use tracing::{debug, error, info};

use crate::app::input::{PromptAction, classify_prompt_line};
use crate::download::DownloadEngine;
use crate::extractor::{Extractor, ProgressUpdate, YtDlpExtractor};
use crate::platform::PlatformProfile;
use crate::progress::ProgressReporter;
use crate::refresh;

/// Runs the interactive session against the real platform and extractor.
///
/// # Errors
///
/// Returns an error only for stdin/stdout I/O failures; download failures are
/// reported to the user and swallowed.
pub fn run(skip_refresh: bool) -> Result<()> {
    let profile = PlatformProfile::detect();
    debug!(os = ?profile.os(), destination = %profile.destination_dir().display(), "Platform profile detected");

    if skip_refresh {
        debug!("Dependency refresh skipped");
    } else {
        refresh::refresh_extractor(&profile);
    }

    let extractor = YtDlpExtractor::locate(&profile);
    let engine = DownloadEngine::new(&extractor, &profile);

    let stdin = io::stdin();
    run_prompt_loop(stdin.lock(), |url| download_one(&engine, url))
}

/// The prompt loop proper, generic over its input source and dispatch target
/// so tests can drive it with a buffer and a counter.
pub(crate) fn run_prompt_loop<R, F>(mut input: R, mut dispatch: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(&str),
{
    loop {
        print!("Enter a video URL ('q' to quit): ");
        io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            // EOF: treat like a quit so piped input exits cleanly.
            println!();
            info!("Input closed, exiting");
            return Ok(());
        }

        match classify_prompt_line(&line) {
            PromptAction::Quit => {
                println!("Goodbye.");
                return Ok(());
            }
            PromptAction::Empty => {
                println!("Please enter a URL.");
            }
            PromptAction::Url(url) => dispatch(&url),
        }
    }
}

/// Downloads one URL, reporting the outcome on stdout.
fn download_one<E: Extractor>(engine: &DownloadEngine<'_, E>, url: &str) {
    println!("Starting download...");

    let reporter = ProgressReporter::stderr();
    let mut progress = |update: ProgressUpdate| reporter.update(&update);

    match engine.download(url, &mut progress) {
        Ok(report) => {
            reporter.finish();
            println!("Download complete: {}", report.title);
        }
        Err(err) => {
            reporter.finish();
            error!(error = %err, "Download failed");
            println!("Download failed: {err}");
            if let Some(hints) = err.remediation() {
                println!("What to try:");
                for (index, hint) in hints.iter().enumerate() {
                    println!("  {}) {hint}", index + 1);
                }
            }
        }
    }

    println!();
    println!("Enter another URL to download the next video.");
    println!();
}
