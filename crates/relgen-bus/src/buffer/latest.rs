//! Single-slot buffer holding the latest value.

use super::ValueBuffer;
use async_trait::async_trait;
use relgen_core::{BufferPolicy, Value};
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
struct Slot {
    value: Option<Value>,
    closed: bool,
}

/// One slot, overwritten on every put. `take` waits only until the slot is
/// first filled, then keeps returning the latest value.
pub struct LatestBuffer {
    slot: watch::Sender<Slot>,
}

impl Default for LatestBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LatestBuffer {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(Slot::default());
        Self { slot }
    }
}

#[async_trait]
impl ValueBuffer for LatestBuffer {
    async fn put(&self, value: Value) {
        self.slot.send_modify(|slot| slot.value = Some(value));
    }

    async fn take(&self) -> Option<Value> {
        let mut receiver = self.slot.subscribe();
        let slot = receiver
            .wait_for(|slot| slot.value.is_some() || slot.closed)
            .await
            .ok()?;
        slot.value.clone()
    }

    fn close(&self) {
        self.slot.send_modify(|slot| slot.closed = true);
    }

    fn release(&self) {
        self.close();
    }

    fn policy(&self) -> BufferPolicy {
        BufferPolicy::Latest
    }
}
