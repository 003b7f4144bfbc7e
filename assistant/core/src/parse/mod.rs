//! Structured-Text Parsers
//!
//! Pure functions that turn completed model output into typed records.
//! Neither parser indexes past what the text contains: malformed input
//! becomes a skipped card or a [`StudyError::MalformedGenerationOutput`].
//!
//! [`StudyError::MalformedGenerationOutput`]: crate::StudyError::MalformedGenerationOutput

mod flashcards;
mod quiz;

pub use flashcards::{parse_flashcards, parse_flashcards_strict, Flashcard, CARD_DELIMITER};
pub use quiz::{parse_quiz, QuizQuestion, OPTION_COUNT, QUIZ_LINES};
