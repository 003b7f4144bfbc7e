//! Plain-text rendering of assistant responses

use std::fmt::Write;

use studyspace_core::{AssistantStatus, Flashcard, QuizQuestion, StudyResponse};

const OPTION_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Render a response for a terminal
pub fn render(response: &StudyResponse) -> String {
    match response {
        StudyResponse::Summary { summary } => format!("{summary}\n"),
        StudyResponse::Flashcards { flashcards } => render_flashcards(flashcards),
        StudyResponse::Quiz { quiz } => render_quiz(quiz),
        StudyResponse::Status { status } => render_status(status),
        StudyResponse::CleanedUp { released } => {
            format!("Session {}\n", if *released { "released" } else { "was not open" })
        }
        StudyResponse::Error { error } => format!("Error: {error}\n"),
    }
}

fn render_flashcards(cards: &[Flashcard]) -> String {
    if cards.is_empty() {
        return "No flashcards could be read from the model output.\n".to_string();
    }

    let mut out = String::new();
    for (i, card) in cards.iter().enumerate() {
        let _ = writeln!(out, "{}. {}\n   -> {}", i + 1, card.question, card.answer);
    }
    out
}

fn render_quiz(quiz: &QuizQuestion) -> String {
    let mut out = format!("{}\n", quiz.question);
    for (letter, option) in OPTION_LETTERS.iter().zip(&quiz.options) {
        let _ = writeln!(out, "  {letter}) {option}");
    }
    match quiz.correct_option() {
        Some(index) => {
            let _ = writeln!(out, "Answer: {}", OPTION_LETTERS[index]);
        }
        None => out.push_str("Answer: (not recognized)\n"),
    }
    let _ = writeln!(out, "{}", quiz.explanation);
    out
}

fn render_status(status: &AssistantStatus) -> String {
    format!(
        "available: {:?}\nsession open: {}\nbusy: {}\n",
        status.available, status.session_open, status.busy
    )
}
