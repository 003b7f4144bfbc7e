//! Generation Sources
//!
//! Abstracted access to text-generation hosts through a common trait.
//!
//! # Available Sources
//!
//! - **Ollama**: Local LLM server
//! - **Scripted**: Replays recorded chunk sequences (tests, headless runs)
//!
//! # Usage
//!
//! ```ignore
//! use studyspace_core::source::{GenerationRequest, GenerationSource, OllamaSource};
//!
//! let source = OllamaSource::from_env("llama3.2");
//! let rx = source.prompt_streaming(&GenerationRequest::new("Hello!")).await?;
//! ```

mod ollama;
mod scripted;
mod traits;

pub use ollama::{OllamaSource, DEFAULT_HOST, DEFAULT_PORT};
pub use scripted::ScriptedSource;
pub use traits::{
    estimate_tokens, Availability, GenerationChunk, GenerationRequest, GenerationSource,
    SourceCapabilities,
};
