//! Prompt-line classification for the interactive loop.
//!
//! Kept separate from the loop itself so the sentinel and whitespace rules
//! are testable without touching stdin.

/// The word that ends the interactive session, matched case-insensitively.
pub const EXIT_SENTINEL: &str = "q";

/// What the loop should do with one line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptAction {
    /// Terminate the session cleanly.
    Quit,
    /// Re-prompt with a warning; nothing was entered.
    Empty,
    /// Dispatch this (trimmed) string to the downloader.
    ///
    /// No URL well-formedness check happens here; malformed input is left to
    /// the downloader's failure path.
    Url(String),
}

/// Classifies one raw prompt line.
#[must_use]
pub fn classify_prompt_line(line: &str) -> PromptAction {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case(EXIT_SENTINEL) {
        PromptAction::Quit
    } else if trimmed.is_empty() {
        PromptAction::Empty
    } else {
        PromptAction::Url(trimmed.to_string())
    }
}
