//! Scripted Generation Source
//!
//! An in-memory source that replays pre-recorded chunk sequences. Used by
//! the test suites and for headless runs where no model host is present.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::session::SessionId;

use super::traits::{
    estimate_tokens, Availability, GenerationChunk, GenerationRequest, GenerationSource,
    SourceCapabilities,
};

/// Source that replays scripted responses in order
///
/// Each call to `prompt_streaming` pops the next script. When the scripts run
/// out, the stream closes immediately with no chunks.
#[derive(Clone)]
pub struct ScriptedSource {
    availability: Availability,
    scripts: Arc<Mutex<VecDeque<Vec<GenerationChunk>>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
    released: Arc<Mutex<Vec<SessionId>>>,
    chunk_delay: Duration,
    fixed_token_count: Option<usize>,
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSource {
    /// Create an available source with no scripts
    #[must_use]
    pub fn new() -> Self {
        Self {
            availability: Availability::Readily,
            scripts: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            released: Arc::new(Mutex::new(Vec::new())),
            chunk_delay: Duration::ZERO,
            fixed_token_count: None,
        }
    }

    /// Report the given availability
    #[must_use]
    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    /// Sleep between chunks
    #[must_use]
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// Report this token count for every prompt instead of estimating
    #[must_use]
    pub fn with_token_count(mut self, tokens: usize) -> Self {
        self.fixed_token_count = Some(tokens);
        self
    }

    /// Queue a response made of raw chunks
    #[must_use]
    pub fn with_chunks(self, chunks: Vec<GenerationChunk>) -> Self {
        self.scripts.lock().push_back(chunks);
        self
    }

    /// Queue a response made of snapshot strings
    #[must_use]
    pub fn with_snapshots<I, T>(self, snapshots: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.with_chunks(
            snapshots
                .into_iter()
                .map(|s| GenerationChunk::Snapshot(s.into()))
                .collect(),
        )
    }

    /// Queue a full response, streamed as growing cumulative snapshots
    #[must_use]
    pub fn with_response(self, text: &str) -> Self {
        let mut snapshots = Vec::new();
        let mut current = String::new();
        for word in text.split_inclusive(' ') {
            current.push_str(word);
            snapshots.push(current.clone());
        }
        self.with_snapshots(snapshots)
    }

    /// Requests received so far
    #[must_use]
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }

    /// Sessions released so far, in release order
    #[must_use]
    pub fn released_sessions(&self) -> Vec<SessionId> {
        self.released.lock().clone()
    }

    /// Scripts not yet consumed
    #[must_use]
    pub fn remaining_scripts(&self) -> usize {
        self.scripts.lock().len()
    }
}

#[async_trait]
impl GenerationSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "Scripted"
    }

    async fn capabilities(&self) -> anyhow::Result<SourceCapabilities> {
        Ok(SourceCapabilities {
            available: self.availability,
            default_temperature: Some(0.7),
            default_top_k: Some(3),
        })
    }

    async fn count_prompt_tokens(&self, prompt: &str) -> anyhow::Result<usize> {
        Ok(self
            .fixed_token_count
            .unwrap_or_else(|| estimate_tokens(prompt)))
    }

    fn release_session(&self, session: SessionId) {
        self.released.lock().push(session);
    }

    async fn prompt_streaming(
        &self,
        request: &GenerationRequest,
    ) -> anyhow::Result<mpsc::Receiver<GenerationChunk>> {
        self.requests.lock().push(request.clone());
        let chunks = self.scripts.lock().pop_front().unwrap_or_default();
        let delay = self.chunk_delay;

        let (tx, rx) = mpsc::channel(chunks.len().max(1));
        tokio::spawn(async move {
            for chunk in chunks {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if tx.send(chunk).await.is_err() {
                    return;
                }
            }
        });

        Ok(rx)
    }
}
