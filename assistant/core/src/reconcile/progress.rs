//! Progress Observers
//!
//! Best-effort sinks for reconciliation deltas. Delivery is never
//! guaranteed: a failing observer is logged and ignored by the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// One progress notification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Text added by the latest chunk
    pub delta: String,
    /// Reconciled text so far
    pub text: String,
}

/// Why a progress notification could not be delivered
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProgressError {
    /// Nobody is listening anymore (e.g. the popup was closed)
    #[error("progress receiver closed")]
    Closed,
    /// The receiver is not keeping up
    #[error("progress receiver full")]
    Full,
    /// Observer-specific failure
    #[error("{0}")]
    Other(String),
}

/// Receives reconciliation progress
pub trait ProgressObserver: Send + Sync {
    /// Handle one update; errors are ignored by the reconciler
    ///
    /// # Errors
    ///
    /// Returns an error when the update could not be delivered.
    fn on_progress(&self, update: &ProgressUpdate) -> Result<(), ProgressError>;
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressUpdate) -> Result<(), ProgressError> + Send + Sync,
{
    fn on_progress(&self, update: &ProgressUpdate) -> Result<(), ProgressError> {
        self(update)
    }
}

/// Forwards updates into a bounded channel without waiting
#[derive(Clone, Debug)]
pub struct ChannelObserver {
    tx: mpsc::Sender<ProgressUpdate>,
}

impl ChannelObserver {
    /// Wrap a sender
    #[must_use]
    pub fn new(tx: mpsc::Sender<ProgressUpdate>) -> Self {
        Self { tx }
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, update: &ProgressUpdate) -> Result<(), ProgressError> {
        self.tx.try_send(update.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Closed(_) => ProgressError::Closed,
            mpsc::error::TrySendError::Full(_) => ProgressError::Full,
        })
    }
}
