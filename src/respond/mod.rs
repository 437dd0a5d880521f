//! Producing user-facing text: synthesized answers and clarifying questions.

pub mod clarify;
pub mod format;

pub use clarify::{ClarificationComposer, static_question};
pub use format::{ErrorKind, format_error};
