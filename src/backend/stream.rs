//! Single-producer, single-consumer hand-off queue for backend output.

use std::future::Future;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::StreamError;

/// Bound on deltas buffered between the producer task and the consumer.
pub const QUEUE_CAPACITY: usize = 64;

/// One fragment of backend output, or the error that ended the stream.
pub type Delta = Result<String, StreamError>;

/// Consumer half: an ordered, finite, single-pass sequence of deltas.
#[derive(Debug)]
pub struct DeltaStream {
    rx: mpsc::Receiver<Delta>,
    cancel: CancellationToken,
}

/// Producer half, owned by the task doing the network round trip.
#[derive(Debug)]
pub struct DeltaSender {
    tx: mpsc::Sender<Delta>,
}

impl DeltaStream {
    /// Create a connected sender/stream pair observing `cancel`.
    pub fn channel(cancel: &CancellationToken) -> (DeltaSender, DeltaStream) {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        (
            DeltaSender { tx },
            DeltaStream {
                rx,
                cancel: cancel.clone(),
            },
        )
    }

    /// A stream that yields `text` as its only delta and then closes.
    #[cfg(test)]
    pub(crate) fn once(text: impl Into<String>, cancel: &CancellationToken) -> Self {
        let (sender, stream) = Self::channel(cancel);
        // A fresh channel always has room for one item.
        let _ = sender.tx.try_send(Ok(text.into()));
        stream
    }

    /// A stream fed from already-known deltas by a background task.
    #[cfg(test)]
    pub(crate) fn from_deltas<I>(deltas: I, cancel: &CancellationToken) -> Self
    where
        I: IntoIterator<Item = String>,
        I::IntoIter: Send + 'static,
    {
        let deltas = deltas.into_iter();
        spawn(cancel, move |tx| async move {
            for delta in deltas {
                if !tx.send(delta).await {
                    break;
                }
            }
            Ok(())
        })
    }

    /// Wait for the next delta.
    ///
    /// Returns `None` once the producer closed the queue normally. After the
    /// cancellation token fires this yields `Err(StreamError::Cancelled)`
    /// instead of waiting on the producer.
    pub async fn next(&mut self) -> Option<Delta> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Some(Err(StreamError::Cancelled)),
            delta = self.rx.recv() => delta,
        }
    }
}

impl DeltaSender {
    /// Push one delta. Returns `false` once the consumer has gone away.
    pub async fn send(&self, delta: String) -> bool {
        self.tx.send(Ok(delta)).await.is_ok()
    }

    /// Report a mid-stream failure to the consumer.
    pub async fn fail(&self, err: StreamError) {
        let _ = self.tx.send(Err(err)).await;
    }
}

/// Run `produce` on its own task and hand back the stream it feeds.
///
/// The queue closes when `produce` returns. An `Err` from `produce` is
/// delivered to the consumer as the final item. When `cancel` fires the
/// producer future is dropped immediately, which closes the queue.
pub fn spawn<F, Fut>(cancel: &CancellationToken, produce: F) -> DeltaStream
where
    F: FnOnce(DeltaSender) -> Fut,
    Fut: Future<Output = Result<(), StreamError>> + Send + 'static,
{
    let (sender, stream) = DeltaStream::channel(cancel);
    let failure = DeltaSender {
        tx: sender.tx.clone(),
    };
    let producer = produce(sender);
    let token = cancel.clone();

    tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Generation cancelled, closing delta stream");
                let _ = failure.tx.try_send(Err(StreamError::Cancelled));
            }
            result = producer => {
                if let Err(e) = result {
                    warn!("Delta stream failed: {}", e);
                    failure.fail(e).await;
                }
            }
        }
    });

    stream
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    async fn drain(mut stream: DeltaStream) -> Vec<Delta> {
        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            let stop = item.is_err();
            items.push(item);
            if stop {
                break;
            }
        }
        items
    }

    #[tokio::test]
    async fn test_deltas_arrive_in_order_then_close() {
        let cancel = CancellationToken::new();
        let stream = DeltaStream::from_deltas(
            vec!["feat".to_string(), ": ".to_string(), "add".to_string()],
            &cancel,
        );
        let items = drain(stream).await;
        assert_eq!(
            items,
            vec![Ok("feat".to_string()), Ok(": ".to_string()), Ok("add".to_string())]
        );
    }

    #[tokio::test]
    async fn test_once_yields_single_delta() {
        let cancel = CancellationToken::new();
        let mut stream = DeltaStream::once("<Commit>fix: x</Commit>", &cancel);
        assert_eq!(stream.next().await, Some(Ok("<Commit>fix: x</Commit>".to_string())));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_producer_error_is_last_item() {
        let cancel = CancellationToken::new();
        let stream = spawn(&cancel, |tx| async move {
            tx.send("partial".to_string()).await;
            Err(StreamError::Read("connection reset".to_string()))
        });
        let items = drain(stream).await;
        assert_eq!(
            items,
            vec![
                Ok("partial".to_string()),
                Err(StreamError::Read("connection reset".to_string()))
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_stops_producer_and_surfaces_cancelled() {
        let cancel = CancellationToken::new();
        let (dropped_tx, dropped_rx) = oneshot::channel::<()>();

        let mut stream = spawn(&cancel, move |tx| async move {
            // Dropped together with the producer future.
            let _guard = dropped_tx;
            tx.send("feat".to_string()).await;
            std::future::pending::<()>().await;
            Ok(())
        });

        assert_eq!(stream.next().await, Some(Ok("feat".to_string())));
        cancel.cancel();

        let next = timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("consumer must not hang after cancel");
        assert_eq!(next, Some(Err(StreamError::Cancelled)));

        let closed = timeout(Duration::from_secs(1), dropped_rx).await;
        assert!(closed.is_ok(), "producer task should be dropped promptly");
    }

    #[tokio::test]
    async fn test_producer_stops_when_consumer_drops() {
        let cancel = CancellationToken::new();
        let (done_tx, done_rx) = oneshot::channel();

        let stream = spawn(&cancel, move |tx| async move {
            let mut sent = 0usize;
            while tx.send("x".to_string()).await {
                sent += 1;
            }
            let _ = done_tx.send(sent);
            Ok(())
        });
        drop(stream);

        let sent = timeout(Duration::from_secs(1), done_rx)
            .await
            .expect("producer should notice the dropped consumer")
            .unwrap();
        assert!(sent <= QUEUE_CAPACITY);
    }
}
