//! Generation Source Traits
//!
//! Trait definitions for the text-generation capability the assistant runs
//! on. The host may be an on-device model, a local Ollama server, or a
//! scripted source in tests; the assistant only sees this interface.
//!
//! # Design Philosophy
//!
//! A source streams *snapshots*, not deltas. Some hosts re-send the whole
//! response so far on every emission, others send true increments, and a few
//! restart mid-stream. The reconciler downstream copes with all of these, so
//! sources forward whatever their host produces without post-processing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::session::SessionId;

/// One emission from a generation source
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationChunk {
    /// A text snapshot (cumulative or incremental, see module docs)
    Snapshot(String),
    /// The source failed; no further chunks follow
    Error(String),
}

impl GenerationChunk {
    /// Create a snapshot chunk
    pub fn snapshot(text: impl Into<String>) -> Self {
        Self::Snapshot(text.into())
    }
}

/// Whether a source can serve requests on this device
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Availability {
    /// Ready to generate now
    Readily,
    /// Usable once a model download completes
    AfterDownload,
    /// Not usable on this device
    #[default]
    No,
}

impl Availability {
    /// Whether a session may be created
    #[must_use]
    pub fn is_usable(self) -> bool {
        !matches!(self, Self::No)
    }
}

/// What a source reports about itself before a session is created
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceCapabilities {
    /// Availability on this device
    pub available: Availability,
    /// Sampling temperature used when the caller does not pick one
    pub default_temperature: Option<f32>,
    /// Top-k used when the caller does not pick one
    pub default_top_k: Option<u32>,
}

/// Configuration for a generation request
#[derive(Clone, Debug, Default)]
pub struct GenerationRequest {
    /// The prompt to send
    pub prompt: String,
    /// System prompt (optional, applied before the prompt)
    pub system: Option<String>,
    /// Sampling temperature (0.0-1.0); `None` keeps the source default
    pub temperature: Option<f32>,
    /// Top-k sampling; `None` keeps the source default
    pub top_k: Option<u32>,
    /// Maximum tokens to generate (0 = source default)
    pub max_tokens: u32,
}

impl GenerationRequest {
    /// Create a new request for a prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Set system prompt
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 1.0));
        self
    }

    /// Set top-k
    #[must_use]
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Set max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Rough token estimate for sources without a tokenizer endpoint
///
/// Assumes ~4 characters per token, rounding up.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Generation source trait
///
/// Implement this trait to run the assistant on a different model host.
#[async_trait]
pub trait GenerationSource: Send + Sync {
    /// Source name for logs (e.g., "Ollama")
    fn name(&self) -> &str;

    /// Report availability and sampling defaults
    async fn capabilities(&self) -> anyhow::Result<SourceCapabilities>;

    /// Count (or estimate) the tokens a prompt would consume
    async fn count_prompt_tokens(&self, prompt: &str) -> anyhow::Result<usize>;

    /// Start generating and return a receiver of snapshots
    ///
    /// The channel closes when generation ends. An error mid-stream is sent
    /// as [`GenerationChunk::Error`] before the channel closes.
    async fn prompt_streaming(
        &self,
        request: &GenerationRequest,
    ) -> anyhow::Result<mpsc::Receiver<GenerationChunk>>;

    /// Free host resources held for a session
    ///
    /// Called exactly once per session, from a synchronous context (possibly
    /// `Drop`). Sources without per-session state keep the default no-op.
    fn release_session(&self, _session: SessionId) {}

    /// Convenience availability probe
    async fn availability(&self) -> Availability {
        self.capabilities()
            .await
            .map(|caps| caps.available)
            .unwrap_or(Availability::No)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_request_builder() {
        let request = GenerationRequest::new("Summarize")
            .with_system("You are helpful")
            .with_temperature(1.7)
            .with_top_k(3)
            .with_max_tokens(100);

        assert_eq!(request.prompt, "Summarize");
        assert_eq!(request.system.as_deref(), Some("You are helpful"));
        assert_eq!(request.temperature, Some(1.0));
        assert_eq!(request.top_k, Some(3));
        assert_eq!(request.max_tokens, 100);
    }

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_availability_serde() {
        let json = serde_json::to_string(&Availability::AfterDownload).unwrap();
        assert_eq!(json, "\"after-download\"");
        assert!(Availability::Readily.is_usable());
        assert!(!Availability::No.is_usable());
    }
}
