use std::collections::HashMap;

use dashmap::DashMap;

use crate::model::MessageState;

type GroupKey = (String, String);

/// Per-(log, group) base offset plus per-message state and retry count.
#[derive(Debug, Default)]
struct GroupState {
    base_offset: u64,
    states: HashMap<u64, MessageState>,
    retries: HashMap<u64, u32>,
}

/// Tracks consumption progress independently for every (log, group) pair.
/// A `DashMap` entry gives exclusive access to one group's state for the
/// duration of an operation, which is the serialization this store needs:
/// no two groups ever contend with each other.
#[derive(Debug, Default)]
pub struct StateStore {
    groups: DashMap<GroupKey, GroupState>,
}

fn key(log_id: &str, group_id: &str) -> GroupKey {
    (log_id.to_owned(), group_id.to_owned())
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_base_offset(&self, log_id: &str, group_id: &str) -> u64 {
        self.groups
            .get(&key(log_id, group_id))
            .map_or(0, |g| g.base_offset)
    }

    pub fn set_base_offset(&self, log_id: &str, group_id: &str, offset: u64) {
        self.groups.entry(key(log_id, group_id)).or_default().base_offset = offset;
    }

    pub fn get_message_state(&self, log_id: &str, group_id: &str, id: u64) -> MessageState {
        self.groups
            .get(&key(log_id, group_id))
            .and_then(|g| g.states.get(&id).copied())
            .unwrap_or_default()
    }

    pub fn get_message_states(
        &self,
        log_id: &str,
        group_id: &str,
        ids: &[u64],
    ) -> HashMap<u64, MessageState> {
        let group = self.groups.get(&key(log_id, group_id));
        ids.iter()
            .map(|&id| {
                let state = group
                    .as_ref()
                    .and_then(|g| g.states.get(&id).copied())
                    .unwrap_or_default();
                (id, state)
            })
            .collect()
    }

    pub fn set_message_state(&self, log_id: &str, group_id: &str, id: u64, state: MessageState) {
        self.groups
            .entry(key(log_id, group_id))
            .or_default()
            .states
            .insert(id, state);
    }

    pub fn get_retry_count(&self, log_id: &str, group_id: &str, id: u64) -> u32 {
        self.groups
            .get(&key(log_id, group_id))
            .and_then(|g| g.retries.get(&id).copied())
            .unwrap_or(0)
    }

    /// Atomically increments and returns the new retry count for `id`.
    pub fn increment_retry_count(&self, log_id: &str, group_id: &str, id: u64) -> u32 {
        let mut group = self.groups.entry(key(log_id, group_id)).or_default();
        let counter = group.retries.entry(id).or_insert(0);
        *counter += 1;
        *counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecorded_state_defaults_to_pending() {
        let store = StateStore::new();
        assert_eq!(store.get_message_state("l", "g", 0), MessageState::Pending);
        assert_eq!(store.get_base_offset("l", "g"), 0);
        assert_eq!(store.get_retry_count("l", "g", 0), 0);
    }

    #[test]
    fn groups_are_independent() {
        let store = StateStore::new();
        store.set_message_state("l", "g1", 0, MessageState::Processed);
        assert_eq!(
            store.get_message_state("l", "g1", 0),
            MessageState::Processed
        );
        assert_eq!(store.get_message_state("l", "g2", 0), MessageState::Pending);
    }

    #[test]
    fn increment_retry_count_is_monotonic() {
        let store = StateStore::new();
        assert_eq!(store.increment_retry_count("l", "g", 5), 1);
        assert_eq!(store.increment_retry_count("l", "g", 5), 2);
        assert_eq!(store.increment_retry_count("l", "g", 5), 3);
        assert_eq!(store.get_retry_count("l", "g", 5), 3);
    }

    #[test]
    fn batch_read_defaults_missing_entries() {
        let store = StateStore::new();
        store.set_message_state("l", "g", 1, MessageState::Failed);
        let states = store.get_message_states("l", "g", &[0, 1, 2]);
        assert_eq!(states[&0], MessageState::Pending);
        assert_eq!(states[&1], MessageState::Failed);
        assert_eq!(states[&2], MessageState::Pending);
    }
}
