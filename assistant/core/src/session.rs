//! Session Management
//!
//! A [`StudySession`] is the caller-owned handle through which all
//! generation happens. It carries the sampling options fixed at creation and
//! is released exactly once: explicitly through [`StudySession::close`], or
//! when it is dropped.
//!
//! # Design Philosophy
//!
//! The summary runs on a long-lived base session. Flashcard and quiz
//! requests each [`fork`](StudySession::fork) a child with the same options
//! and let it drop when the request ends, so derived requests never leave
//! state behind on the base session.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::StudyConfig;
use crate::error::{StudyError, StudyResult};
use crate::source::{GenerationChunk, GenerationRequest, GenerationSource};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Unique session identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Allocate the next process-wide identifier
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Sampling options fixed for the lifetime of a session
#[derive(Clone, Debug, PartialEq)]
pub struct SessionOptions {
    /// System prompt sent with every request
    pub system_prompt: String,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Top-k sampling
    pub top_k: Option<u32>,
}

/// An owned generation session
pub struct StudySession<S: GenerationSource> {
    id: SessionId,
    source: Arc<S>,
    options: SessionOptions,
    closed: bool,
}

impl<S: GenerationSource> StudySession<S> {
    /// Open a session if the source is usable on this device
    ///
    /// Temperature and top-k fall back to the source's defaults when the
    /// configuration leaves them unset.
    ///
    /// # Errors
    ///
    /// Returns [`StudyError::SourceUnavailable`] when capabilities cannot be
    /// queried or the source reports it is not available.
    pub async fn open(source: Arc<S>, config: &StudyConfig) -> StudyResult<Self> {
        let caps = source
            .capabilities()
            .await
            .map_err(|e| StudyError::SourceUnavailable(format!("{}: {e}", source.name())))?;

        if !caps.available.is_usable() {
            return Err(StudyError::SourceUnavailable(format!(
                "{} is not available on this device",
                source.name()
            )));
        }

        let options = SessionOptions {
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature.or(caps.default_temperature),
            top_k: config.top_k.or(caps.default_top_k),
        };

        let session = Self::with_options(source, options);
        info!(session = %session.id, source = session.source.name(), availability = ?caps.available, "Session opened");
        Ok(session)
    }

    fn with_options(source: Arc<S>, options: SessionOptions) -> Self {
        Self {
            id: SessionId::next(),
            source,
            options,
            closed: false,
        }
    }

    /// Session identifier
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Options this session generates with
    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Whether the session has been released
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Create an independent child session with the same options
    ///
    /// # Errors
    ///
    /// Returns [`StudyError::SessionClosed`] if this session was released.
    pub fn fork(&self) -> StudyResult<Self> {
        self.ensure_open()?;
        let child = Self::with_options(Arc::clone(&self.source), self.options.clone());
        debug!(parent = %self.id, child = %child.id, "Session forked");
        Ok(child)
    }

    /// Count the tokens a prompt would consume
    ///
    /// # Errors
    ///
    /// Returns [`StudyError::SessionClosed`] after release, or
    /// [`StudyError::Generation`] if the source cannot count.
    pub async fn count_prompt_tokens(&self, prompt: &str) -> StudyResult<usize> {
        self.ensure_open()?;
        self.source
            .count_prompt_tokens(prompt)
            .await
            .map_err(|e| StudyError::Generation(e.to_string()))
    }

    /// Start a streaming generation for `prompt`
    ///
    /// # Errors
    ///
    /// Returns [`StudyError::SessionClosed`] after release, or
    /// [`StudyError::Generation`] if the source refuses the request.
    pub async fn prompt_streaming(
        &self,
        prompt: impl Into<String>,
    ) -> StudyResult<mpsc::Receiver<GenerationChunk>> {
        self.ensure_open()?;

        let mut request = GenerationRequest::new(prompt).with_system(self.options.system_prompt.clone());
        request.temperature = self.options.temperature;
        request.top_k = self.options.top_k;

        self.source
            .prompt_streaming(&request)
            .await
            .map_err(|e| StudyError::Generation(e.to_string()))
    }

    /// Release the session; later calls are no-ops
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.source.release_session(self.id);
        debug!(session = %self.id, "Session released");
    }

    fn ensure_open(&self) -> StudyResult<()> {
        if self.closed {
            Err(StudyError::SessionClosed)
        } else {
            Ok(())
        }
    }
}

impl<S: GenerationSource> Drop for StudySession<S> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<S: GenerationSource> fmt::Debug for StudySession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudySession")
            .field("id", &self.id)
            .field("source", &self.source.name())
            .field("options", &self.options)
            .field("closed", &self.closed)
            .finish()
    }
}
