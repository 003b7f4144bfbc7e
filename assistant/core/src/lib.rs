//! StudySpace Core - Headless Study Assistant
//!
//! This crate turns a passage of text into a summary, flashcards and a
//! multiple-choice quiz question using a streaming text-generation source.
//! It has no UI dependencies: a CLI, an extension bridge or a test harness
//! drives it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Surfaces                                │
//! │        CLI  │  extension bridge  │  tests / headless             │
//! └──────────────────────────┬───────────────────────────────────────┘
//!              StudyRequest  │  StudyResponse
//! ┌──────────────────────────┴───────────────────────────────────────┐
//! │                       StudyAssistant                             │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌────────────────────┐  │
//! │  │ StudySession │─▶│ StreamReconciler │─▶│ flashcard / quiz   │  │
//! │  │ (owned, RAII)│  │ (snapshot deltas)│  │ parsers            │  │
//! │  └──────┬───────┘  └──────────────────┘  └────────────────────┘  │
//! └─────────┼────────────────────────────────────────────────────────┘
//!           │ GenerationSource (Ollama, scripted, ...)
//! ```
//!
//! # Key Types
//!
//! - [`StudyAssistant`]: runs the summary, flashcard and quiz operations
//! - [`StreamReconciler`]: folds overlapping snapshots into one string
//! - [`parse_flashcards`] / [`parse_quiz`]: text to typed records
//! - [`GenerationSource`]: the model host abstraction
//! - [`StudyError`]: every failure a caller can see
//!
//! # Quick Start
//!
//! ```ignore
//! use studyspace_core::{OllamaSource, StudyAssistant, StudyConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = StudyConfig::from_env();
//!     let assistant = StudyAssistant::new(OllamaSource::from_env(&config.model), config);
//!
//!     let summary = assistant.summarize("Mitochondria are ...", None).await?;
//!     let cards = assistant.generate_flashcards(&summary).await?;
//!     let quiz = assistant.generate_quiz(&summary).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`assistant`]: the orchestration core
//! - [`config`]: defaults, TOML file and environment configuration
//! - [`error`]: error types
//! - [`messages`]: request/response enums for surfaces
//! - [`parse`]: flashcard and quiz parsers
//! - [`prompts`]: prompt templates
//! - [`reconcile`]: stream reconciliation and progress observers
//! - [`session`]: owned generation sessions
//! - [`source`]: generation source trait and implementations

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assistant;
pub mod config;
pub mod error;
pub mod messages;
pub mod parse;
pub mod prompts;
pub mod reconcile;
pub mod session;
pub mod source;

// Re-exports for convenience
pub use assistant::StudyAssistant;
pub use config::{
    default_config_path, load_config, load_config_file, load_config_from_path, ConfigError,
    StudyConfig, StudyToml,
};
pub use error::{StudyError, StudyResult};
pub use messages::{AssistantStatus, StudyRequest, StudyResponse};
pub use parse::{parse_flashcards, parse_flashcards_strict, parse_quiz, Flashcard, QuizQuestion};
pub use reconcile::{
    reconcile_stream, ChannelObserver, ProgressError, ProgressObserver, ProgressUpdate,
    StreamReconciler,
};
pub use session::{SessionId, SessionOptions, StudySession};
pub use source::{
    Availability, GenerationChunk, GenerationRequest, GenerationSource, OllamaSource,
    ScriptedSource, SourceCapabilities,
};
