//! Circular sample buffer.

use super::ValueBuffer;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use relgen_core::{BufferPolicy, Value};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;

/// Default ring capacity.
pub const DEFAULT_SAMPLE_CAPACITY: usize = 10_000;

struct Ring {
    entries: Vec<Value>,
    next: usize,
    closed: bool,
    released: bool,
    rng: StdRng,
}

/// Ring of the most recent values; `take` returns a random live entry.
///
/// `put` never waits; beyond capacity the oldest entry is overwritten. `take`
/// waits for a publish only while the ring is empty.
pub struct SampleBuffer {
    ring: Mutex<Ring>,
    capacity: usize,
    published: Notify,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, StdRng::from_os_rng())
    }

    /// A buffer whose sampling is reproducible.
    pub fn seeded(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: usize, rng: StdRng) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Mutex::new(Ring {
                entries: Vec::with_capacity(capacity.min(DEFAULT_SAMPLE_CAPACITY)),
                next: 0,
                closed: false,
                released: false,
                rng,
            }),
            capacity,
            published: Notify::new(),
        }
    }

    fn ring(&self) -> MutexGuard<'_, Ring> {
        self.ring
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.ring().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ValueBuffer for SampleBuffer {
    async fn put(&self, value: Value) {
        {
            let mut guard = self.ring();
            let ring = &mut *guard;
            if ring.released {
                return;
            }
            if ring.entries.len() < self.capacity {
                ring.entries.push(value);
            } else {
                ring.entries[ring.next] = value;
            }
            ring.next = (ring.next + 1) % self.capacity;
        }
        self.published.notify_waiters();
    }

    async fn take(&self) -> Option<Value> {
        loop {
            // Registered before the check so a put in between is not missed.
            let published = self.published.notified();
            {
                let mut guard = self.ring();
                let ring = &mut *guard;
                if !ring.entries.is_empty() {
                    let idx = ring.rng.random_range(0..ring.entries.len());
                    return Some(ring.entries[idx].clone());
                }
                if ring.closed || ring.released {
                    return None;
                }
            }
            published.await;
        }
    }

    fn close(&self) {
        self.ring().closed = true;
        self.published.notify_waiters();
    }

    fn release(&self) {
        self.ring().released = true;
        self.published.notify_waiters();
    }

    fn policy(&self) -> BufferPolicy {
        BufferPolicy::Sample
    }
}
