//! Single-fire start gate.

use std::sync::Arc;
use tokio::sync::watch;

/// A gate that opens once and stays open.
///
/// Opening an open latch is a no-op; every waiter, present or future, passes
/// once it is open.
#[derive(Debug, Clone)]
pub struct Latch {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Default for Latch {
    fn default() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }
}

impl Latch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the latch. Returns `true` only for the call that opened it.
    pub fn open(&self) -> bool {
        !self.sender.send_replace(true)
    }

    pub fn is_open(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Wait until the latch is open.
    pub async fn wait(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives as long as `self`, so this only returns once open.
        let _ = receiver.wait_for(|open| *open).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_opens_once() {
        let latch = Latch::new();
        assert!(!latch.is_open());
        assert!(latch.open());
        assert!(!latch.open());
        assert!(latch.is_open());
        latch.wait().await;
    }

    #[tokio::test]
    async fn test_waiters_released_on_open() {
        let latch = Latch::new();
        let waiter = {
            let latch = latch.clone();
            tokio::spawn(async move { latch.wait().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        latch.open();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
