//! Prompt Templates
//!
//! The instructions sent to the model for each operation. The flashcard and
//! quiz templates pin the exact layouts the parsers expect.

/// System prompt applied to every session
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert study assistant specializing in clear, concise summaries. \
Focus on identifying and explaining key concepts accurately and succinctly.";

/// Prompt asking for a markdown summary of `text`
#[must_use]
pub fn summary_prompt(text: &str) -> String {
    format!(
        "Create a clear, structured summary of the following text:

{text}

Format the summary using this markdown structure:
# Overview
A brief introduction of the main topic (2-3 sentences)

## Key Points
- First main point
- Second main point
- Third main point

## Important Details
- Notable detail 1
- Notable detail 2
- Notable detail 3

Keep the summary focused and concise. Use clear language."
    )
}

/// Prompt asking for `count` flashcards derived from `summary`
#[must_use]
pub fn flashcards_prompt(summary: &str, count: usize) -> String {
    format!(
        "Create {count} study flashcards from this summary:
{summary}

Rules:
1. Focus on key concepts and relationships
2. Test understanding, not just memorization
3. Keep questions clear and answers concise

Format exactly as:
Q: [question]
A: [answer]
---"
    )
}

/// Prompt asking for one multiple-choice question about `summary`
#[must_use]
pub fn quiz_prompt(summary: &str) -> String {
    format!(
        "Create a multiple-choice question based on this summary:
{summary}

Guidelines:
1. Question should test understanding
2. All options should be plausible
3. Include explanation for correct answer

Format exactly as:
Q: [question]
A) [option1]
B) [option2]
C) [option3]
D) [option4]
Correct: [A/B/C/D]
Explanation: [brief explanation]"
    )
}
