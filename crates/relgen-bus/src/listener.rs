use crate::message::Message;
use async_trait::async_trait;

/// Error returned by a listener for one message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListenerError {
    /// The message was not accepted; the topic keeps draining
    #[error("message rejected: {0}")]
    Rejected(String),

    /// The listener is broken; the topic terminates
    #[error("fatal listener error: {0}")]
    Fatal(String),
}

/// A consumer registered on a topic.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Handle one broadcast message, poison pill included.
    async fn on_message(&self, message: &Message) -> Result<(), ListenerError>;
}
