//! CLI argument definitions using clap derive macros.
//!
//! The interactive contract takes no arguments; the flags here only control
//! logging verbosity and the startup dependency refresh.

use clap::Parser;

/// Interactive video downloader front-end for yt-dlp.
///
/// Prompts for video URLs on stdin and saves them to the OS video directory
/// (`~/Movies` on macOS, `%USERPROFILE%\Videos` on Windows, `~/Videos`
/// elsewhere). Enter `q` to quit.
#[derive(Parser, Debug)]
#[command(name = "vidfetch")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Skip the startup upgrade of yt-dlp
    #[arg(long)]
    pub no_refresh: bool,
}
