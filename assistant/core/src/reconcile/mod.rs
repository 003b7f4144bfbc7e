//! Stream Reconciliation
//!
//! Turns a sequence of possibly-overlapping generation snapshots into one
//! monotonically growing string, reporting each delta as it is computed.
//!
//! # Algorithm
//!
//! ```text
//!   previous = ""                 result = ""
//!
//!   chunk "Hello"        starts with ""       -> delta "Hello"
//!   chunk "Hello world"  starts with "Hello"  -> delta " world"
//!   chunk "Goodbye"      no shared prefix     -> delta "Goodbye" (whole chunk)
//!
//!   result = "Hello worldGoodbye"
//! ```
//!
//! A chunk that does not extend its predecessor is appended verbatim. This
//! can duplicate text when a source restarts, but never drops any.
//!
//! # Example
//!
//! ```ignore
//! use studyspace_core::reconcile::{reconcile_stream, ChannelObserver};
//!
//! let (progress_tx, progress_rx) = tokio::sync::mpsc::channel(32);
//! let observer = ChannelObserver::new(progress_tx);
//! let text = reconcile_stream(chunks_rx, Some(&observer)).await?;
//! ```

mod progress;
mod reconciler;

pub use progress::{ChannelObserver, ProgressError, ProgressObserver, ProgressUpdate};
pub use reconciler::{reconcile_stream, StreamReconciler};
