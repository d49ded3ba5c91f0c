//! Live-topic registry.

use crate::topic::{drain, Topic, TopicStats, DEFAULT_QUEUE_CAPACITY};
use relgen_core::StreamKey;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

type TopicMap = Arc<Mutex<HashMap<StreamKey, Arc<Topic>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct RegistryInner {
    topics: TopicMap,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    capacity: usize,
    cancel: CancellationToken,
}

/// Registry of live topics keyed by stream.
///
/// `get_or_create` is an atomic create-if-absent: each key gets exactly one
/// topic and one drain task. A topic removes itself when its drain loop ends,
/// on every exit path.
#[derive(Clone)]
pub struct TopicRegistry {
    inner: Arc<RegistryInner>,
}

impl TopicRegistry {
    /// Create a registry whose drain loops stop when `cancel` fires.
    pub fn new(capacity: usize, cancel: CancellationToken) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                topics: Arc::default(),
                tasks: Mutex::new(Vec::new()),
                capacity,
                cancel,
            }),
        }
    }

    pub fn with_default_capacity(cancel: CancellationToken) -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY, cancel)
    }

    /// Return the live topic for `key`, creating it and spawning its drain
    /// loop if absent. Must be called from within a tokio runtime.
    pub fn get_or_create(&self, key: &StreamKey) -> Arc<Topic> {
        let mut topics = lock(&self.inner.topics);
        if let Some(topic) = topics.get(key) {
            return topic.clone();
        }

        let (topic, receiver) = Topic::new(key.clone(), self.inner.capacity);
        topics.insert(key.clone(), topic.clone());
        drop(topics);

        let map = self.inner.topics.clone();
        let cancel = self.inner.cancel.clone();
        let task_topic = topic.clone();
        let handle = tokio::spawn(async move {
            let key = task_topic.key().clone();
            let exit = drain(task_topic.clone(), receiver, cancel).await;

            let mut topics = lock(&map);
            // A newer topic may have taken the key after this one ended.
            if topics
                .get(&key)
                .is_some_and(|current| Arc::ptr_eq(current, &task_topic))
            {
                topics.remove(&key);
            }
            debug!("Removed topic '{key}' from registry ({exit:?})");
        });
        lock(&self.inner.tasks).push(handle);

        debug!("Created topic '{key}'");
        topic
    }

    /// The live topic for `key`, if any.
    pub fn get(&self, key: &StreamKey) -> Option<Arc<Topic>> {
        lock(&self.inner.topics).get(key).cloned()
    }

    /// Keys of live topics, sorted.
    pub fn keys(&self) -> Vec<StreamKey> {
        let mut keys: Vec<StreamKey> = lock(&self.inner.topics).keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.topics).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counters of every live topic.
    pub fn stats(&self) -> Vec<(StreamKey, TopicStats)> {
        let topics: Vec<Arc<Topic>> = lock(&self.inner.topics).values().cloned().collect();
        topics
            .into_iter()
            .map(|topic| (topic.key().clone(), topic.stats()))
            .collect()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    /// Wait for every drain loop spawned so far to finish.
    pub async fn shutdown(&self) {
        let handles = std::mem::take(&mut *lock(&self.inner.tasks));
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Topic drain task failed: {e}");
            }
        }
    }
}
