//! Stream Reconciler Implementation

use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::progress::{ProgressObserver, ProgressUpdate};
use crate::error::{StudyError, StudyResult};
use crate::source::GenerationChunk;

/// Folds snapshots into one growing result
///
/// A chunk that extends the previous one contributes only its new suffix.
/// Any other chunk is treated as entirely new content and appended whole,
/// so a source that restarts mid-stream duplicates text rather than losing
/// it.
#[derive(Clone, Debug, Default)]
pub struct StreamReconciler {
    previous: String,
    result: String,
    chunk_count: usize,
    divergence_count: usize,
}

impl StreamReconciler {
    /// Create an empty reconciler
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return the delta it contributed
    pub fn push(&mut self, chunk: &str) -> &str {
        let delta = match chunk.strip_prefix(self.previous.as_str()) {
            Some(suffix) => suffix,
            None => {
                self.divergence_count += 1;
                debug!(
                    chunk_index = self.chunk_count,
                    previous_len = self.previous.len(),
                    chunk_len = chunk.len(),
                    "Chunk does not extend previous snapshot, appending whole chunk"
                );
                chunk
            }
        };

        let start = self.result.len();
        self.result.push_str(delta);
        self.previous.clear();
        self.previous.push_str(chunk);
        self.chunk_count += 1;

        &self.result[start..]
    }

    /// Reconciled text so far
    #[must_use]
    pub fn result(&self) -> &str {
        &self.result
    }

    /// Number of chunks consumed
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Number of chunks that did not extend their predecessor
    #[must_use]
    pub fn divergence_count(&self) -> usize {
        self.divergence_count
    }

    /// Consume the reconciler, returning the final text
    #[must_use]
    pub fn into_result(self) -> String {
        self.result
    }
}

/// Notify an observer, swallowing any failure
fn notify(observer: Option<&dyn ProgressObserver>, delta: &str, text: &str) {
    let Some(observer) = observer else {
        return;
    };
    if delta.is_empty() {
        return;
    }

    let update = ProgressUpdate {
        delta: delta.to_string(),
        text: text.to_string(),
    };
    if let Err(e) = observer.on_progress(&update) {
        trace!(error = %e, "Progress notification dropped");
    }
}

/// Drain a generation channel into a single reconciled string
///
/// Each non-empty delta is offered to `observer`. The reconciler itself
/// cannot fail; the only error is a source that reports one mid-stream.
///
/// # Errors
///
/// Returns [`StudyError::Generation`] when the source sends
/// [`GenerationChunk::Error`]. Text received before the error is discarded.
pub async fn reconcile_stream(
    mut rx: mpsc::Receiver<GenerationChunk>,
    observer: Option<&dyn ProgressObserver>,
) -> StudyResult<String> {
    let mut reconciler = StreamReconciler::new();

    while let Some(chunk) = rx.recv().await {
        match chunk {
            GenerationChunk::Snapshot(text) => {
                let start = reconciler.result().len();
                reconciler.push(&text);
                let so_far = reconciler.result();
                notify(observer, &so_far[start..], so_far);
            }
            GenerationChunk::Error(error) => {
                debug!(
                    chunks = reconciler.chunk_count(),
                    partial_len = reconciler.result().len(),
                    "Source failed mid-stream"
                );
                return Err(StudyError::Generation(error));
            }
        }
    }

    debug!(
        chunks = reconciler.chunk_count(),
        divergences = reconciler.divergence_count(),
        len = reconciler.result().len(),
        "Stream reconciled"
    );
    Ok(reconciler.into_result())
}
