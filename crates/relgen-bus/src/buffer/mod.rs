//! Cross-table value buffers.
//!
//! A consumer column holds one buffer per upstream stream. The buffer is
//! registered on the upstream topic through a [`BufferListener`] and read by
//! the consumer with [`ValueBuffer::take`]. Three policies are provided:
//!
//! - [`ExactBuffer`] - every value taken exactly once, in publish order
//! - [`SampleBuffer`] - random sample of the most recent values
//! - [`LatestBuffer`] - the most recently published value

pub mod exact;
pub mod latest;
pub mod sample;

pub use exact::ExactBuffer;
pub use latest::LatestBuffer;
pub use sample::SampleBuffer;

use crate::listener::{Listener, ListenerError};
use crate::message::Message;
use async_trait::async_trait;
use relgen_core::{BufferPolicy, Settings, Value};
use std::sync::Arc;

/// Consumer-side storage for one upstream stream.
#[async_trait]
pub trait ValueBuffer: Send + Sync {
    /// Store a value published upstream.
    async fn put(&self, value: Value);

    /// Take the next value; `None` once the stream has ended and nothing
    /// more can be taken.
    async fn take(&self) -> Option<Value>;

    /// Mark the end of the upstream stream.
    fn close(&self);

    /// The consumer is gone: discard any further puts.
    fn release(&self);

    fn policy(&self) -> BufferPolicy;
}

/// Build an empty buffer for `policy` sized from `settings`.
pub fn buffer_for(
    policy: BufferPolicy,
    settings: &Settings,
    seed: Option<u64>,
) -> Arc<dyn ValueBuffer> {
    match policy {
        BufferPolicy::Exact => Arc::new(ExactBuffer::new(settings.exact_buffer_capacity)),
        BufferPolicy::Sample => Arc::new(match seed {
            Some(seed) => SampleBuffer::seeded(settings.sample_buffer_capacity, seed),
            None => SampleBuffer::new(settings.sample_buffer_capacity),
        }),
        BufferPolicy::Latest => Arc::new(LatestBuffer::new()),
    }
}

/// Feeds topic messages into a buffer.
pub struct BufferListener {
    buffer: Arc<dyn ValueBuffer>,
}

impl BufferListener {
    pub fn new(buffer: Arc<dyn ValueBuffer>) -> Self {
        Self { buffer }
    }
}

#[async_trait]
impl Listener for BufferListener {
    async fn on_message(&self, message: &Message) -> Result<(), ListenerError> {
        match message {
            Message::Value(value) => self.buffer.put(value.clone()).await,
            Message::PoisonPill => self.buffer.close(),
        }
        Ok(())
    }
}
