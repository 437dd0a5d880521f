//! Rich diagnostic error types for shopdesk.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives
//! (see [`crate::store::StoreError`], [`crate::llm::LlmError`],
//! [`crate::config::ConfigError`]). This module ties them together for hosts
//! that want a single error type.
//!
//! None of these errors ever reach the end user through the chat pipeline:
//! the pipeline renders data-access failures as fixed sentences and degrades
//! silently on enhancement failures. They surface only to the host (CLI,
//! catalog loading, configuration).

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::llm::LlmError;
use crate::store::StoreError;

/// Top-level error type for shopdesk.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the host.
#[derive(Debug, Error, Diagnostic)]
pub enum DeskError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience alias for results carrying a [`DeskError`].
pub type DeskResult<T> = std::result::Result<T, DeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts_transparently() {
        let err: DeskError = StoreError::Unavailable {
            message: "connection refused".into(),
        }
        .into();
        assert!(matches!(err, DeskError::Store(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn diagnostic_code_survives_wrapping() {
        let err: DeskError = LlmError::Unavailable {
            url: "http://127.0.0.1:1".into(),
        }
        .into();
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("shopdesk::llm::unavailable"));
    }
}
