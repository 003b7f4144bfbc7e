//! Quiz Parsing
//!
//! A generated quiz question is exactly seven lines:
//!
//! ```text
//! Q: [question]
//! A) [option1]
//! B) [option2]
//! C) [option3]
//! D) [option4]
//! Correct: [A/B/C/D]
//! Explanation: [brief explanation]
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{StudyError, StudyResult};

/// Lines a quiz block must contain
pub const QUIZ_LINES: usize = 7;

/// Number of answer options
pub const OPTION_COUNT: usize = 4;

/// Option letters in index order
const OPTION_LETTERS: [&str; OPTION_COUNT] = ["A", "B", "C", "D"];

/// Width of an option marker such as `A)`
const OPTION_MARKER_CHARS: usize = 2;

/// A multiple-choice question
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    /// The question text
    pub question: String,
    /// Answer options in display order
    pub options: [String; OPTION_COUNT],
    /// Index of the correct option, or -1 if the letter was not recognized
    pub correct_index: i8,
    /// Why the correct option is correct
    pub explanation: String,
}

impl QuizQuestion {
    /// Index of the correct option, if one was recognized
    #[must_use]
    pub fn correct_option(&self) -> Option<usize> {
        usize::try_from(self.correct_index)
            .ok()
            .filter(|&index| index < OPTION_COUNT)
    }

    /// Whether choosing `index` answers the question correctly
    #[must_use]
    pub fn is_correct(&self, index: usize) -> bool {
        self.correct_option() == Some(index)
    }
}

/// Map a `Correct:` letter to an option index (-1 when unrecognized)
fn letter_index(letter: &str) -> i8 {
    OPTION_LETTERS
        .iter()
        .position(|&l| l == letter)
        .and_then(|index| i8::try_from(index).ok())
        .unwrap_or(-1)
}

/// Drop the first `count` characters, never splitting a code point
fn skip_chars(line: &str, count: usize) -> &str {
    match line.char_indices().nth(count) {
        Some((offset, _)) => &line[offset..],
        None => "",
    }
}

fn strip_label<'a>(line: &'a str, label: &str) -> &'a str {
    line.strip_prefix(label).unwrap_or(line).trim()
}

/// Parse a seven-line quiz block
///
/// Lines are trimmed before use. Option markers are removed by dropping the
/// first two characters, so `A)`, `A.` and `1)` are all accepted. Lines past
/// the seventh are ignored.
///
/// # Errors
///
/// Returns [`StudyError::MalformedGenerationOutput`] when the block has
/// fewer than seven lines.
pub fn parse_quiz(text: &str) -> StudyResult<QuizQuestion> {
    let lines: Vec<&str> = text.trim().lines().map(str::trim).collect();

    let [question, a, b, c, d, correct, explanation, ..] = lines.as_slice() else {
        return Err(StudyError::malformed(format!(
            "malformed quiz text: expected {QUIZ_LINES} lines, found {}",
            lines.len()
        )));
    };

    let options = [a, b, c, d].map(|line| skip_chars(line, OPTION_MARKER_CHARS).trim().to_string());

    Ok(QuizQuestion {
        question: strip_label(question, "Q:").to_string(),
        options,
        correct_index: letter_index(strip_label(correct, "Correct:")),
        explanation: strip_label(explanation, "Explanation:").to_string(),
    })
}
