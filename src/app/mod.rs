//! Interactive application layer: prompt parsing and the run loop.

pub mod input;
pub mod runtime;

pub use input::{PromptAction, classify_prompt_line};
pub use runtime::run;
