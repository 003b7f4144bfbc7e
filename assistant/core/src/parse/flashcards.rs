//! Flashcard Parsing
//!
//! Generated flashcards arrive as blocks separated by `---`:
//!
//! ```text
//! Q: What is X?
//! A: X is Y.
//! ---
//! Q: 2+2?
//! A: 4
//! ---
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StudyError, StudyResult};

/// Separator between flashcard blocks
pub const CARD_DELIMITER: &str = "---";

/// Marker that starts the answer inside a block
const ANSWER_MARKER: &str = "\nA:";

/// Marker that may start the question
const QUESTION_MARKER: &str = "Q:";

/// A question/answer pair
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    /// Prompt side
    pub question: String,
    /// Answer side, never empty
    pub answer: String,
}

impl Flashcard {
    /// Create a flashcard
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Why a single block was not turned into a card
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BlockDefect {
    MissingAnswerMarker,
    EmptyAnswer,
}

impl BlockDefect {
    fn describe(self) -> &'static str {
        match self {
            Self::MissingAnswerMarker => "no \"A:\" line",
            Self::EmptyAnswer => "empty answer",
        }
    }
}

/// Non-empty trimmed blocks in source order
fn blocks(text: &str) -> impl Iterator<Item = &str> {
    text.split(CARD_DELIMITER)
        .map(str::trim)
        .filter(|block| !block.is_empty())
}

fn parse_block(block: &str) -> Result<Flashcard, BlockDefect> {
    let (question, answer) = block
        .split_once(ANSWER_MARKER)
        .ok_or(BlockDefect::MissingAnswerMarker)?;

    let answer = answer.trim();
    if answer.is_empty() {
        return Err(BlockDefect::EmptyAnswer);
    }

    let question = question.strip_prefix(QUESTION_MARKER).unwrap_or(question);
    Ok(Flashcard::new(question.trim(), answer))
}

/// Parse flashcards, skipping malformed blocks
///
/// Blocks without an `A:` line or with an empty answer are dropped and
/// logged. Empty input yields an empty list.
#[must_use]
pub fn parse_flashcards(text: &str) -> Vec<Flashcard> {
    blocks(text)
        .enumerate()
        .filter_map(|(index, block)| match parse_block(block) {
            Ok(card) => Some(card),
            Err(defect) => {
                debug!(index, defect = defect.describe(), "Skipping malformed flashcard block");
                None
            }
        })
        .collect()
}

/// Parse flashcards, failing on the first malformed block
///
/// # Errors
///
/// Returns [`StudyError::MalformedGenerationOutput`] naming the first block
/// that has no `A:` line or an empty answer.
pub fn parse_flashcards_strict(text: &str) -> StudyResult<Vec<Flashcard>> {
    blocks(text)
        .enumerate()
        .map(|(index, block)| {
            parse_block(block).map_err(|defect| {
                StudyError::malformed(format!(
                    "flashcard block {} has {}",
                    index + 1,
                    defect.describe()
                ))
            })
        })
        .collect()
}
