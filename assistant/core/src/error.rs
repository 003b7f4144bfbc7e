//! Error Types
//!
//! Every failure the study assistant can report to a caller. The stream
//! reconciler never produces one of these on its own; parsers, the session
//! and the assistant do.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by study operations
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StudyError {
    /// The prompt exceeds the token budget accepted before generation
    #[error("input is too long: {tokens} tokens (budget: {budget}). Try a smaller section")]
    InputTooLarge {
        /// Estimated token count of the rejected input
        tokens: usize,
        /// Configured budget
        budget: usize,
    },

    /// Generated text did not follow the expected layout
    #[error("malformed generation output: {0}")]
    MalformedGenerationOutput(String),

    /// The generation source is missing or not capable on this device
    #[error("generation source unavailable: {0}")]
    SourceUnavailable(String),

    /// The operation did not finish within its allotted time
    #[error("{operation} timed out after {}s", after.as_secs())]
    Timeout {
        /// Which operation was abandoned
        operation: &'static str,
        /// The deadline that fired
        after: Duration,
    },

    /// The source failed while producing output
    #[error("generation failed: {0}")]
    Generation(String),

    /// Another request is already in flight
    #[error("another request is already being processed")]
    Busy,

    /// Nothing to work on
    #[error("{0}")]
    EmptyInput(&'static str),

    /// The session was released before the operation ran
    #[error("session has been closed")]
    SessionClosed,
}

impl StudyError {
    /// Build a malformed-output error
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedGenerationOutput(detail.into())
    }

    /// Whether retrying the same request could succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Busy | Self::Generation(_) | Self::MalformedGenerationOutput(_)
        )
    }
}

/// Result alias for study operations
pub type StudyResult<T> = Result<T, StudyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_too_large_message() {
        let err = StudyError::InputTooLarge {
            tokens: 2048,
            budget: 1024,
        };
        assert_eq!(
            err.to_string(),
            "input is too long: 2048 tokens (budget: 1024). Try a smaller section"
        );
    }

    #[test]
    fn test_timeout_message() {
        let err = StudyError::Timeout {
            operation: "summary",
            after: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "summary timed out after 30s");
    }

    #[test]
    fn test_transient_classification() {
        assert!(StudyError::Busy.is_transient());
        assert!(StudyError::malformed("x").is_transient());
        assert!(!StudyError::SessionClosed.is_transient());
        assert!(!StudyError::InputTooLarge { tokens: 2, budget: 1 }.is_transient());
    }
}
