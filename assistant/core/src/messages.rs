//! Assistant Messages
//!
//! Requests a surface sends to the assistant and the responses it gets
//! back. The set of operations is closed: [`StudyAssistant::handle`]
//! matches every [`StudyRequest`] variant exhaustively.
//!
//! Both enums serialize with a `type` tag so a surface in another process
//! (a browser extension page, a web UI) can exchange them as JSON:
//!
//! ```json
//! {"type": "processText", "text": "..."}
//! {"type": "summary", "summary": "..."}
//! ```
//!
//! [`StudyAssistant::handle`]: crate::StudyAssistant::handle

use serde::{Deserialize, Serialize};

use crate::error::StudyError;
use crate::parse::{Flashcard, QuizQuestion};
use crate::source::Availability;

/// Requests from a surface to the assistant
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StudyRequest {
    /// Summarize a passage
    ProcessText {
        /// The selected text
        text: String,
    },
    /// Derive flashcards from a summary
    GenerateFlashcards {
        /// A summary produced earlier
        summary: String,
    },
    /// Derive a quiz question from a summary
    GenerateQuiz {
        /// A summary produced earlier
        summary: String,
    },
    /// Report whether generation is possible
    #[serde(rename = "checkAIStatus")]
    CheckStatus,
    /// Release the assistant's session
    Cleanup,
}

impl StudyRequest {
    /// Short operation name for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProcessText { .. } => "summary",
            Self::GenerateFlashcards { .. } => "flashcards",
            Self::GenerateQuiz { .. } => "quiz",
            Self::CheckStatus => "status",
            Self::Cleanup => "cleanup",
        }
    }
}

/// Snapshot of the assistant's state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantStatus {
    /// What the source reports for this device
    pub available: Availability,
    /// Whether a base session is currently open
    pub session_open: bool,
    /// Whether a request is in flight
    pub busy: bool,
}

/// Responses from the assistant to a surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StudyResponse {
    /// A finished summary
    Summary {
        /// Markdown summary text
        summary: String,
    },
    /// Parsed flashcards (possibly empty)
    Flashcards {
        /// Cards in generation order
        flashcards: Vec<Flashcard>,
    },
    /// A parsed quiz question
    Quiz {
        /// The question
        quiz: QuizQuestion,
    },
    /// Current assistant status
    Status {
        /// The status snapshot
        status: AssistantStatus,
    },
    /// Cleanup finished
    CleanedUp {
        /// Whether a session was actually released
        released: bool,
    },
    /// The request failed
    Error {
        /// Human-readable failure description
        error: String,
    },
}

impl StudyResponse {
    /// Whether the request succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Error { .. })
    }
}

impl From<StudyError> for StudyResponse {
    fn from(err: StudyError) -> Self {
        Self::Error {
            error: err.to_string(),
        }
    }
}
