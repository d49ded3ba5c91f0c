use relgen_core::Value;

/// A message carried by a topic.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A published column value
    Value(Value),
    /// End of stream; the drain loop exits after broadcasting it
    PoisonPill,
}

impl Message {
    pub fn is_poison_pill(&self) -> bool {
        matches!(self, Message::PoisonPill)
    }
}

impl From<Value> for Message {
    fn from(value: Value) -> Self {
        Message::Value(value)
    }
}
