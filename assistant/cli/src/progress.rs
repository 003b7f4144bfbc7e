//! Live summary output

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use studyspace_core::ProgressUpdate;

/// Write deltas as they arrive; returns exactly the text written
///
/// Updates dropped upstream never reach the channel, so callers compare the
/// result with the final text to know whether the output is complete.
pub async fn print_deltas<W>(mut rx: mpsc::Receiver<ProgressUpdate>, out: &mut W) -> String
where
    W: AsyncWrite + Unpin,
{
    let mut written = String::new();
    while let Some(update) = rx.recv().await {
        if out.write_all(update.delta.as_bytes()).await.is_err() {
            break;
        }
        let _ = out.flush().await;
        written.push_str(&update.delta);
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyspace_core::{ChannelObserver, ProgressError, ProgressObserver, StreamReconciler};

    fn feed(observer: &ChannelObserver, snapshots: &[&str]) -> (String, Vec<ProgressError>) {
        let mut reconciler = StreamReconciler::new();
        let mut errors = Vec::new();
        for snapshot in snapshots {
            let delta = reconciler.push(snapshot).to_string();
            let update = ProgressUpdate {
                delta,
                text: reconciler.result().to_string(),
            };
            if let Err(e) = observer.on_progress(&update) {
                errors.push(e);
            }
        }
        (reconciler.into_result(), errors)
    }

    #[tokio::test]
    async fn test_all_deltas_written() {
        let (tx, rx) = mpsc::channel(8);
        let observer = ChannelObserver::new(tx);
        let (summary, errors) = feed(&observer, &["# Ov", "# Overview", "# Overview\n- ATP"]);
        drop(observer);
        assert!(errors.is_empty());

        let mut out = Vec::new();
        let written = print_deltas(rx, &mut out).await;
        assert_eq!(written, summary);
        assert_eq!(out, summary.as_bytes());
    }

    #[tokio::test]
    async fn test_full_channel_shows_as_incomplete_output() {
        // Nobody reads while the model writes, so later updates are dropped
        let (tx, rx) = mpsc::channel(1);
        let observer = ChannelObserver::new(tx);
        let (summary, errors) = feed(&observer, &["Cells", "Cells make", "Cells make energy"]);
        drop(observer);
        assert_eq!(errors, vec![ProgressError::Full, ProgressError::Full]);

        let mut out = Vec::new();
        let written = print_deltas(rx, &mut out).await;
        assert_eq!(written, "Cells");
        assert_ne!(written, summary);
    }
}
