//! Platform profile: OS-dependent destination paths and muxer discovery.
//!
//! All operating-system branching lives behind [`PlatformProfile`], a value
//! object captured once at startup and injected everywhere else. Tests build
//! profiles by hand (e.g. a Windows profile with no discoverable `ffmpeg`)
//! instead of relying on the host machine.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Operating-system family, as far as destination paths and muxer discovery
/// care about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsKind {
    /// Apple desktop (`~/Movies` destination).
    MacOs,
    /// Windows (`%USERPROFILE%\Videos` destination, `.exe` binaries).
    Windows,
    /// Everything else Unix-like (`~/Videos` destination).
    Unix,
}

/// Snapshot of the platform facts the downloader depends on.
///
/// Holds the OS family, the user's home directory, and a copy of the process
/// environment. Constructed from the real environment via [`detect`], or by
/// hand in tests via [`with_environment`].
///
/// [`detect`]: PlatformProfile::detect
/// [`with_environment`]: PlatformProfile::with_environment
#[derive(Debug, Clone)]
pub struct PlatformProfile {
    os: OsKind,
    home: Option<PathBuf>,
    env: HashMap<String, String>,
}

impl PlatformProfile {
    /// Captures the profile of the host system.
    #[must_use]
    pub fn detect() -> Self {
        let os = if cfg!(target_os = "macos") {
            OsKind::MacOs
        } else if cfg!(target_os = "windows") {
            OsKind::Windows
        } else {
            OsKind::Unix
        };

        Self {
            os,
            home: dirs::home_dir(),
            env: env::vars().collect(),
        }
    }

    /// Builds a profile with an explicit OS, home directory, and environment.
    ///
    /// Intended for tests and for callers that need to simulate another
    /// platform; production code uses [`PlatformProfile::detect`].
    #[must_use]
    pub fn with_environment(
        os: OsKind,
        home: Option<PathBuf>,
        env: HashMap<String, String>,
    ) -> Self {
        Self { os, home, env }
    }

    /// The OS family this profile describes.
    #[must_use]
    pub fn os(&self) -> OsKind {
        self.os
    }

    /// Looks up a variable in the captured environment.
    #[must_use]
    pub fn env(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// The directory downloads are written to.
    ///
    /// Three fixed branches: `~/Movies` on macOS, `%USERPROFILE%\Videos` on
    /// Windows, `~/Videos` elsewhere. Falls back to the current directory
    /// when no home directory can be resolved.
    #[must_use]
    pub fn destination_dir(&self) -> PathBuf {
        match self.os {
            OsKind::MacOs => self.home_or_cwd().join("Movies"),
            OsKind::Windows => self
                .env("USERPROFILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| self.home_or_cwd())
                .join("Videos"),
            OsKind::Unix => self.home_or_cwd().join("Videos"),
        }
    }

    /// The file name of the muxing binary on this platform.
    #[must_use]
    pub fn muxer_binary_name(&self) -> &'static str {
        match self.os {
            OsKind::Windows => "ffmpeg.exe",
            OsKind::MacOs | OsKind::Unix => "ffmpeg",
        }
    }

    /// Locates the external muxing binary (`ffmpeg`), if any.
    ///
    /// Checks a fixed list of well-known install locations first, then each
    /// entry of the captured `PATH`. Returns the first existing candidate.
    #[must_use]
    pub fn find_muxer(&self) -> Option<PathBuf> {
        for candidate in self.muxer_candidates() {
            if candidate.is_file() {
                debug!(path = %candidate.display(), "Found muxing binary");
                return Some(candidate);
            }
        }

        let found = self.search_path(self.muxer_binary_name());
        match &found {
            Some(path) => debug!(path = %path.display(), "Found muxing binary on PATH"),
            None => debug!("No muxing binary discoverable"),
        }
        found
    }

    /// Well-known filesystem locations for the muxing binary, in probe order.
    #[must_use]
    pub fn muxer_candidates(&self) -> Vec<PathBuf> {
        match self.os {
            OsKind::Windows => {
                let mut candidates = Vec::new();
                for var in ["PROGRAMFILES", "PROGRAMFILES(X86)"] {
                    if let Some(dir) = self.env(var) {
                        candidates.push(
                            Path::new(dir).join("ffmpeg").join("bin").join("ffmpeg.exe"),
                        );
                    }
                }
                if let Some(dir) = self.env("ProgramData") {
                    candidates.push(
                        Path::new(dir)
                            .join("chocolatey")
                            .join("bin")
                            .join("ffmpeg.exe"),
                    );
                }
                if let Some(home) = &self.home {
                    candidates.push(home.join("ffmpeg").join("bin").join("ffmpeg.exe"));
                }
                candidates
            }
            OsKind::MacOs => vec![
                PathBuf::from("/opt/homebrew/bin/ffmpeg"),
                PathBuf::from("/usr/local/bin/ffmpeg"),
                PathBuf::from("/usr/bin/ffmpeg"),
            ],
            OsKind::Unix => vec![
                PathBuf::from("/usr/local/bin/ffmpeg"),
                PathBuf::from("/usr/bin/ffmpeg"),
            ],
        }
    }

    /// Scans the captured `PATH` for a binary named `name`.
    #[must_use]
    pub fn search_path(&self, name: &str) -> Option<PathBuf> {
        let path_var = self.env("PATH").or_else(|| self.env("Path"))?;
        env::split_paths(path_var)
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    fn home_or_cwd(&self) -> PathBuf {
        self.home.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
