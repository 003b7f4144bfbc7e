//! Study Assistant - The Orchestration Core
//!
//! The assistant owns the base session and runs the three study operations:
//! summarize a passage, derive flashcards, derive a quiz question.
//!
//! # Design Philosophy
//!
//! The assistant is surface-agnostic. A CLI, a browser extension bridge or a
//! test harness drives it through typed methods or through
//! [`StudyRequest`]/[`StudyResponse`] values. Every operation:
//!
//! - runs alone: a second request while one is in flight gets
//!   [`StudyError::Busy`]
//! - races the configured timeout: when it fires the operation future is
//!   dropped and [`StudyError::Timeout`] is returned (the source's producer
//!   task may keep running until it notices its receiver is gone)
//! - opens the base session lazily on first use

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::StudyConfig;
use crate::error::{StudyError, StudyResult};
use crate::messages::{AssistantStatus, StudyRequest, StudyResponse};
use crate::parse::{parse_flashcards, parse_quiz, Flashcard, QuizQuestion};
use crate::prompts::{flashcards_prompt, quiz_prompt, summary_prompt};
use crate::reconcile::{reconcile_stream, ProgressObserver};
use crate::session::StudySession;
use crate::source::GenerationSource;

/// Clears the in-flight flag when the operation ends or is abandoned
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> StudyResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self { flag })
            .map_err(|_| StudyError::Busy)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// The study assistant
pub struct StudyAssistant<S: GenerationSource> {
    /// Configuration
    config: StudyConfig,
    /// Generation source
    source: Arc<S>,
    /// Base session, opened on first use
    session: Mutex<Option<StudySession<S>>>,
    /// Set while an operation runs
    in_flight: AtomicBool,
}

impl<S: GenerationSource + 'static> StudyAssistant<S> {
    /// Create an assistant over `source`
    pub fn new(source: S, config: StudyConfig) -> Self {
        Self::with_shared_source(Arc::new(source), config)
    }

    /// Create an assistant over a shared source
    pub fn with_shared_source(source: Arc<S>, config: StudyConfig) -> Self {
        Self {
            config,
            source,
            session: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    /// Whether an operation is running
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Summarize `text`, reporting deltas to `observer` as they arrive
    ///
    /// # Errors
    ///
    /// [`StudyError::EmptyInput`] for blank text,
    /// [`StudyError::InputTooLarge`] when the text exceeds the token budget,
    /// plus the session, generation, busy and timeout errors every operation
    /// can return.
    pub async fn summarize(
        &self,
        text: &str,
        observer: Option<&dyn ProgressObserver>,
    ) -> StudyResult<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StudyError::EmptyInput("Please select text to summarize"));
        }

        self.run("summary", async {
            let rx = {
                let mut slot = self.session.lock().await;
                let session = self.base_session(&mut slot).await?;

                let tokens = session.count_prompt_tokens(text).await?;
                let budget = self.config.max_prompt_tokens;
                if tokens > budget {
                    warn!(tokens, budget, "Input exceeds token budget");
                    return Err(StudyError::InputTooLarge { tokens, budget });
                }
                debug!(tokens, budget, "Input within token budget");

                session.prompt_streaming(summary_prompt(text)).await?
            };

            reconcile_stream(rx, observer).await
        })
        .await
    }

    /// Generate flashcards from a summary
    ///
    /// Malformed blocks in the model output are skipped, so the result may be
    /// empty.
    ///
    /// # Errors
    ///
    /// [`StudyError::EmptyInput`] for a blank summary, plus the errors every
    /// operation can return.
    pub async fn generate_flashcards(&self, summary: &str) -> StudyResult<Vec<Flashcard>> {
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(StudyError::EmptyInput("Please create a summary first"));
        }

        self.run("flashcards", async {
            let text = self
                .generate_on_fork(flashcards_prompt(summary, self.config.flashcard_count))
                .await?;
            let cards = parse_flashcards(&text);
            if cards.is_empty() {
                warn!(len = text.len(), "No well-formed flashcards in generated text");
            }
            Ok(cards)
        })
        .await
    }

    /// Generate one multiple-choice question from a summary
    ///
    /// # Errors
    ///
    /// [`StudyError::EmptyInput`] for a blank summary,
    /// [`StudyError::MalformedGenerationOutput`] when the model output does
    /// not have the seven-line layout, plus the errors every operation can
    /// return.
    pub async fn generate_quiz(&self, summary: &str) -> StudyResult<QuizQuestion> {
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(StudyError::EmptyInput("Please create a summary first"));
        }

        self.run("quiz", async {
            let text = self.generate_on_fork(quiz_prompt(summary)).await?;
            let quiz = parse_quiz(&text)?;
            if quiz.correct_option().is_none() {
                warn!("Quiz answer letter not recognized");
            }
            Ok(quiz)
        })
        .await
    }

    /// Report availability, session and busy state
    pub async fn status(&self) -> AssistantStatus {
        // A held lock may be a first open still in progress; `busy` covers it
        let session_open = self
            .session
            .try_lock()
            .is_ok_and(|slot| slot.as_ref().is_some_and(|s| !s.is_closed()));

        AssistantStatus {
            available: self.source.availability().await,
            session_open,
            busy: self.is_busy(),
        }
    }

    /// Release the base session; returns whether one was open
    pub async fn cleanup(&self) -> bool {
        let session = self.session.lock().await.take();
        match session {
            Some(mut session) => {
                session.close();
                info!(session = %session.id(), "Base session cleaned up");
                true
            }
            None => false,
        }
    }

    /// Dispatch a request and convert the outcome into a response
    pub async fn handle(
        &self,
        request: StudyRequest,
        observer: Option<&dyn ProgressObserver>,
    ) -> StudyResponse {
        let kind = request.kind();
        debug!(request = kind, "Handling request");

        let response = match request {
            StudyRequest::ProcessText { text } => self
                .summarize(&text, observer)
                .await
                .map(|summary| StudyResponse::Summary { summary }),
            StudyRequest::GenerateFlashcards { summary } => self
                .generate_flashcards(&summary)
                .await
                .map(|flashcards| StudyResponse::Flashcards { flashcards }),
            StudyRequest::GenerateQuiz { summary } => self
                .generate_quiz(&summary)
                .await
                .map(|quiz| StudyResponse::Quiz { quiz }),
            StudyRequest::CheckStatus => Ok(StudyResponse::Status {
                status: self.status().await,
            }),
            StudyRequest::Cleanup => Ok(StudyResponse::CleanedUp {
                released: self.cleanup().await,
            }),
        };

        response.unwrap_or_else(|err| {
            warn!(request = kind, error = %err, "Request failed");
            StudyResponse::from(err)
        })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Run `operation` under the in-flight guard and the timeout
    async fn run<T, F>(&self, operation: &'static str, fut: F) -> StudyResult<T>
    where
        F: Future<Output = StudyResult<T>>,
    {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        let started = Instant::now();
        let after = self.config.processing_timeout;

        match tokio::time::timeout(after, fut).await {
            Ok(result) => {
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                match &result {
                    Ok(_) => info!(operation, elapsed_ms, "Operation complete"),
                    Err(e) => debug!(operation, elapsed_ms, error = %e, "Operation failed"),
                }
                result
            }
            Err(_) => {
                warn!(operation, timeout_secs = after.as_secs(), "Operation timed out, result discarded");
                Err(StudyError::Timeout { operation, after })
            }
        }
    }

    /// Open the base session if there is none
    async fn base_session<'a>(
        &self,
        slot: &'a mut Option<StudySession<S>>,
    ) -> StudyResult<&'a StudySession<S>> {
        if slot.as_ref().map_or(true, StudySession::is_closed) {
            *slot = Some(StudySession::open(Arc::clone(&self.source), &self.config).await?);
        }
        slot.as_ref().ok_or(StudyError::SessionClosed)
    }

    /// Fork the base session, run `prompt` on the fork, release the fork
    async fn generate_on_fork(&self, prompt: String) -> StudyResult<String> {
        let fork = {
            let mut slot = self.session.lock().await;
            self.base_session(&mut slot).await?.fork()?
        };

        let rx = fork.prompt_streaming(prompt).await?;
        reconcile_stream(rx, None).await
    }
}
