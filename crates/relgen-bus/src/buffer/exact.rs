//! Exact FIFO buffer.

use super::ValueBuffer;
use async_trait::async_trait;
use relgen_core::{BufferPolicy, Value};
use std::sync::Mutex;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;

/// Bounded FIFO: each value is taken exactly once, in publish order.
///
/// `put` waits while the buffer is full and `take` waits while it is empty.
pub struct ExactBuffer {
    sender: Mutex<Option<mpsc::Sender<Value>>>,
    receiver: AsyncMutex<mpsc::Receiver<Value>>,
    released: CancellationToken,
}

impl ExactBuffer {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender: Mutex::new(Some(sender)),
            receiver: AsyncMutex::new(receiver),
            released: CancellationToken::new(),
        }
    }

    fn sender(&self) -> Option<mpsc::Sender<Value>> {
        self.sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ValueBuffer for ExactBuffer {
    async fn put(&self, value: Value) {
        let Some(sender) = self.sender() else {
            return;
        };
        tokio::select! {
            _ = sender.send(value) => {}
            _ = self.released.cancelled() => {}
        }
    }

    async fn take(&self) -> Option<Value> {
        self.receiver.lock().await.recv().await
    }

    fn close(&self) {
        self.sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
    }

    fn release(&self) {
        self.released.cancel();
        self.close();
    }

    fn policy(&self) -> BufferPolicy {
        BufferPolicy::Exact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fifo_then_blocks() {
        let buffer = Arc::new(ExactBuffer::new(16));
        for i in 0..5 {
            buffer.put(Value::Int(i)).await;
        }
        for i in 0..5 {
            assert_eq!(buffer.take().await, Some(Value::Int(i)));
        }

        // The next take waits for a new put.
        let taker = {
            let buffer = buffer.clone();
            tokio::spawn(async move { buffer.take().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!taker.is_finished());

        buffer.put(Value::Int(99)).await;
        let taken = tokio::time::timeout(Duration::from_secs(1), taker)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(taken, Some(Value::Int(99)));
    }

    #[tokio::test]
    async fn test_put_blocks_when_full() {
        let buffer = ExactBuffer::new(1);
        buffer.put(Value::Int(1)).await;
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), buffer.put(Value::Int(2))).await;
        assert!(blocked.is_err());
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let buffer = ExactBuffer::new(4);
        buffer.put(Value::Int(1)).await;
        buffer.close();
        buffer.put(Value::Int(2)).await;

        assert_eq!(buffer.take().await, Some(Value::Int(1)));
        assert_eq!(buffer.take().await, None);
    }

    #[tokio::test]
    async fn test_release_unblocks_put() {
        let buffer = Arc::new(ExactBuffer::new(1));
        buffer.put(Value::Int(1)).await;

        let putter = {
            let buffer = buffer.clone();
            tokio::spawn(async move { buffer.put(Value::Int(2)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!putter.is_finished());

        buffer.release();
        tokio::time::timeout(Duration::from_secs(1), putter)
            .await
            .unwrap()
            .unwrap();

        // Later puts are discarded without waiting.
        tokio::time::timeout(Duration::from_secs(1), buffer.put(Value::Int(3)))
            .await
            .unwrap();
    }
}
