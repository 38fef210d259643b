use dashmap::DashMap;
use tracing::trace;

use crate::model::{Message, Metadata, Value};

/// Append-only per-log message sequences. Ids are dense and assigned in
/// append order; nothing is ever deleted or mutated once appended.
#[derive(Debug, Default)]
pub struct Storage {
    logs: DashMap<String, Vec<Message>>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one message to `log_id`, creating the log on first use, and
    /// returns its dense id.
    pub fn append(&self, log_id: &str, payload: Value, metadata: Option<Metadata>) -> u64 {
        let mut log = self.logs.entry(log_id.to_owned()).or_default();
        let id = log.len() as u64;
        log.push(Message {
            id,
            log_id: log_id.to_owned(),
            payload,
            metadata,
        });
        trace!(log_id, id, "appended message");
        id
    }

    /// Returns up to `limit` messages starting at `start_index`, in id
    /// order. Never errors: an unknown log or an out-of-range start index
    /// both yield an empty batch.
    pub fn get_batch(&self, log_id: &str, start_index: u64, limit: usize) -> Vec<Message> {
        let Some(log) = self.logs.get(log_id) else {
            return Vec::new();
        };
        let start = start_index as usize;
        if start >= log.len() {
            return Vec::new();
        }
        let end = (start + limit).min(log.len());
        log[start..end].to_vec()
    }

    #[cfg(test)]
    pub(crate) fn len(&self, log_id: &str) -> u64 {
        self.logs.get(log_id).map_or(0, |log| log.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_assigns_dense_contiguous_ids() {
        let storage = Storage::new();
        for i in 0..5 {
            let id = storage.append("orders", Value::from(i), None);
            assert_eq!(id, i as u64);
        }
        assert_eq!(storage.len("orders"), 5);
    }

    #[test]
    fn get_batch_on_unknown_log_is_empty() {
        let storage = Storage::new();
        assert!(storage.get_batch("missing", 0, 10).is_empty());
    }

    #[test]
    fn get_batch_past_end_is_empty() {
        let storage = Storage::new();
        storage.append("orders", Value::from(1), None);
        assert!(storage.get_batch("orders", 5, 10).is_empty());
    }

    #[test]
    fn get_batch_respects_limit_and_order() {
        let storage = Storage::new();
        for i in 0..10 {
            storage.append("orders", Value::from(i), None);
        }
        let batch = storage.get_batch("orders", 2, 3);
        let ids: Vec<u64> = batch.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn logs_are_independent() {
        let storage = Storage::new();
        storage.append("a", Value::from(1), None);
        storage.append("b", Value::from(2), None);
        assert_eq!(storage.len("a"), 1);
        assert_eq!(storage.len("b"), 1);
    }
}
