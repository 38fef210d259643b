use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Payloads and metadata are opaque, self-describing structured values. The
/// engine never inspects them; it only carries them from producer to
/// consumer.
pub type Value = serde_json::Value;

pub type Metadata = HashMap<String, Value>;

/// One immutable, append-only record in a log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub log_id: String,
    pub payload: Value,
    pub metadata: Option<Metadata>,
}

/// Per-(log, group, message) processing state. `Pending` is the implicit
/// default for any id that has never been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageState {
    #[default]
    Pending,
    InProgress,
    Processed,
    Failed,
    Dead,
}

impl MessageState {
    /// `Processed` and `Dead` are sticky: once reached, a message never
    /// transitions out of them.
    pub fn is_terminal(self) -> bool {
        matches!(self, MessageState::Processed | MessageState::Dead)
    }
}
