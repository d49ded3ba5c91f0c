//! Topics: bounded FIFO queues broadcast to registered listeners.

use crate::latch::Latch;
use crate::listener::{Listener, ListenerError};
use crate::message::Message;
use futures::future::join_all;
use relgen_core::{StreamKey, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Default bound of a topic queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 8192;

/// Error type for bus operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// The topic's drain loop has exited
    #[error("Topic '{0}' is closed")]
    TopicClosed(StreamKey),

    /// The publish was interrupted by cancellation
    #[error("Publish to '{0}' cancelled")]
    Cancelled(StreamKey),
}

/// Snapshot of a topic's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopicStats {
    /// Messages handed to `publish`
    pub published: u64,
    /// Messages accepted by the queue
    pub enqueued: u64,
    /// Messages taken off the queue by the drain loop
    pub dequeued: u64,
    /// Successful per-listener deliveries
    pub broadcast: u64,
    /// Registered listeners
    pub listeners: usize,
}

#[derive(Debug, Default)]
struct Counters {
    published: AtomicU64,
    enqueued: AtomicU64,
    dequeued: AtomicU64,
    broadcast: AtomicU64,
}

/// A named stream of values with one drain loop.
///
/// Lifecycle: created, awaiting listeners (the drain loop is parked on the
/// latch), draining, terminated.
pub struct Topic {
    key: StreamKey,
    sender: mpsc::Sender<Message>,
    listeners: RwLock<Vec<Arc<dyn Listener>>>,
    listener_count: AtomicUsize,
    started: Latch,
    warned_no_listeners: AtomicBool,
    terminated: AtomicBool,
    counters: Counters,
}

impl Topic {
    /// Create a topic and the receiving end its drain loop consumes.
    pub(crate) fn new(key: StreamKey, capacity: usize) -> (Arc<Self>, mpsc::Receiver<Message>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let topic = Arc::new(Self {
            key,
            sender,
            listeners: RwLock::new(Vec::new()),
            listener_count: AtomicUsize::new(0),
            started: Latch::new(),
            warned_no_listeners: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
            counters: Counters::default(),
        });
        (topic, receiver)
    }

    pub fn key(&self) -> &StreamKey {
        &self.key
    }

    /// Register a listener and open the start gate.
    pub fn add_listener(&self, listener: Arc<dyn Listener>) {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        listeners.push(listener);
        self.listener_count.store(listeners.len(), Ordering::Release);
        drop(listeners);

        if self.started.open() {
            debug!("Topic '{}' started draining", self.key);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listener_count.load(Ordering::Acquire)
    }

    /// Whether the drain loop has exited.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Publish a value, waiting while the queue is full.
    pub async fn publish(&self, value: Value) -> Result<(), BusError> {
        self.send(Message::Value(value)).await
    }

    /// Publish the poison pill, ending the stream.
    pub async fn close(&self) -> Result<(), BusError> {
        self.send(Message::PoisonPill).await
    }

    async fn send(&self, message: Message) -> Result<(), BusError> {
        self.counters.published.fetch_add(1, Ordering::Relaxed);

        if self.listener_count() == 0 && !self.warned_no_listeners.swap(true, Ordering::AcqRel) {
            warn!(
                "Publishing to topic '{}' with no listeners; the queue may fill and block",
                self.key
            );
        }

        self.sender
            .send(message)
            .await
            .map_err(|_| BusError::TopicClosed(self.key.clone()))?;
        self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn stats(&self) -> TopicStats {
        TopicStats {
            published: self.counters.published.load(Ordering::Relaxed),
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            dequeued: self.counters.dequeued.load(Ordering::Relaxed),
            broadcast: self.counters.broadcast.load(Ordering::Relaxed),
            listeners: self.listener_count(),
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn Listener>> {
        self.listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Deliver one message to every listener concurrently.
    ///
    /// Returns `false` when a listener failed fatally.
    async fn broadcast(&self, message: &Message) -> bool {
        let listeners = self.snapshot();
        let results = join_all(listeners.iter().map(|l| l.on_message(message))).await;

        let mut healthy = true;
        for result in results {
            match result {
                Ok(()) => {
                    self.counters.broadcast.fetch_add(1, Ordering::Relaxed);
                }
                Err(ListenerError::Rejected(reason)) => {
                    warn!("Listener on topic '{}' rejected a message: {reason}", self.key);
                }
                Err(ListenerError::Fatal(reason)) => {
                    error!("Listener on topic '{}' failed: {reason}", self.key);
                    healthy = false;
                }
            }
        }
        healthy
    }
}

/// Why a drain loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainExit {
    /// Poison pill delivered
    Completed,
    /// A listener failed fatally
    ListenerFailed,
    /// Cancellation token fired
    Cancelled,
}

/// Run the drain loop of `topic` until the poison pill, a fatal listener
/// error or cancellation.
///
/// On every exit path other than a delivered poison pill, listeners still
/// receive one so consumers waiting on the stream observe its end.
pub(crate) async fn drain(
    topic: Arc<Topic>,
    mut receiver: mpsc::Receiver<Message>,
    cancel: CancellationToken,
) -> DrainExit {
    let exit = tokio::select! {
        _ = topic.started.wait() => drain_started(&topic, &mut receiver, &cancel).await,
        _ = cancel.cancelled() => DrainExit::Cancelled,
    };

    receiver.close();
    topic.terminated.store(true, Ordering::Release);

    if exit != DrainExit::Completed {
        for listener in topic.snapshot() {
            if let Err(e) = listener.on_message(&Message::PoisonPill).await {
                debug!("Listener on topic '{}' failed on close: {e}", topic.key);
            }
        }
    }

    debug!(
        "Topic '{}' terminated ({exit:?}): {:?}",
        topic.key,
        topic.stats()
    );
    exit
}

async fn drain_started(
    topic: &Topic,
    receiver: &mut mpsc::Receiver<Message>,
    cancel: &CancellationToken,
) -> DrainExit {
    loop {
        let message = tokio::select! {
            message = receiver.recv() => message,
            _ = cancel.cancelled() => return DrainExit::Cancelled,
        };
        let Some(message) = message else {
            return DrainExit::Completed;
        };
        topic.counters.dequeued.fetch_add(1, Ordering::Relaxed);

        let healthy = tokio::select! {
            healthy = topic.broadcast(&message) => healthy,
            _ = cancel.cancelled() => return DrainExit::Cancelled,
        };

        if !healthy {
            return DrainExit::ListenerFailed;
        }
        if message.is_poison_pill() {
            return DrainExit::Completed;
        }
    }
}
