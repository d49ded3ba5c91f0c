//! Topic bus and cross-table value buffers for relgen.
//!
//! A producer publishes each value of a referenced column to that column's
//! [`Topic`]. One drain task per topic forwards messages, in publish order, to
//! every registered [`Listener`]. Consumer columns register a
//! [`BufferListener`] wrapping a [`ValueBuffer`] and read from the buffer.
//!
//! ```text
//! producer ──publish──▶ Topic (bounded queue) ──drain──▶ BufferListener ──▶ ValueBuffer ──take──▶ consumer
//! ```
//!
//! Topics live in a [`TopicRegistry`], which creates at most one topic and one
//! drain task per [`relgen_core::StreamKey`] and forgets a topic once its
//! drain loop ends.

pub mod buffer;
pub mod latch;
pub mod listener;
pub mod message;
pub mod registry;
pub mod topic;

pub use buffer::{
    buffer_for, BufferListener, ExactBuffer, LatestBuffer, SampleBuffer, ValueBuffer,
};
pub use latch::Latch;
pub use listener::{Listener, ListenerError};
pub use message::Message;
pub use registry::TopicRegistry;
pub use topic::{BusError, DrainExit, Topic, TopicStats, DEFAULT_QUEUE_CAPACITY};
