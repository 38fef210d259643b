use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::lease::LeaseManager;
use crate::model::{Message, MessageState};
use crate::state::StateStore;
use crate::storage::Storage;

/// How many messages `acquire_next` pulls per scan iteration.
const BATCH_SIZE: usize = 20;

/// Consecutive failed settlements before a message moves to `Dead`.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Per-log façade composing [`Storage`], [`StateStore`] and [`LeaseManager`]
/// into the two operations consumers and producers actually need:
/// `acquire_next` and `settle`. Bound to a single `log_id` at construction;
/// a [`crate::registry::Registry`] hands out one of these per log, all
/// backed by the same shared stores.
pub struct Orchestrator {
    log_id: String,
    storage: Arc<Storage>,
    state: Arc<StateStore>,
    leases: Arc<LeaseManager>,
    slide_locks: DashMap<String, Mutex<()>>,
    max_retries: u32,
}

impl Orchestrator {
    pub(crate) fn new(
        log_id: String,
        storage: Arc<Storage>,
        state: Arc<StateStore>,
        leases: Arc<LeaseManager>,
        max_retries: u32,
    ) -> Self {
        Self {
            log_id,
            storage,
            state,
            leases,
            slide_locks: DashMap::new(),
            max_retries,
        }
    }

    pub fn log_id(&self) -> &str {
        &self.log_id
    }

    /// Finds and leases the lowest-id non-terminal, unleased message for
    /// `group_id`, or `None` if there is nothing left to consume right now.
    pub fn acquire_next(
        &self,
        group_id: &str,
        client_id: &str,
        duration: Duration,
    ) -> Option<Message> {
        self.slide(group_id);

        let mut cursor = self.state.get_base_offset(&self.log_id, group_id);
        loop {
            let batch = self.storage.get_batch(&self.log_id, cursor, BATCH_SIZE);
            if batch.is_empty() {
                return None;
            }

            let ids: Vec<u64> = batch.iter().map(|m| m.id).collect();
            let states = self.state.get_message_states(&self.log_id, group_id, &ids);
            let leases = self.leases.get_leases(&self.log_id, group_id, &ids);

            for message in &batch {
                let mut state = states[&message.id];
                let has_live_lease = leases.get(&message.id).is_some_and(Option::is_some);

                if state.is_terminal() {
                    continue;
                }

                if state == MessageState::InProgress && !has_live_lease {
                    debug!(
                        log_id = %self.log_id,
                        group_id,
                        id = message.id,
                        "lazy reclamation of in-progress message with no live lease"
                    );
                    self.state
                        .set_message_state(&self.log_id, group_id, message.id, MessageState::Pending);
                    state = MessageState::Pending;
                }

                let claimable = matches!(state, MessageState::Pending | MessageState::Failed);
                if claimable && !has_live_lease && self.try_acquire_lease(group_id, message.id, client_id, duration) {
                    return Some(message.clone());
                }
            }

            cursor += batch.len() as u64;
        }
    }

    /// Re-checks state (it may have gone terminal since the batch read) and
    /// races for the lease. Returns `false` on a lost race or a state that
    /// turned terminal underneath us; both are ordinary control flow.
    fn try_acquire_lease(
        &self,
        group_id: &str,
        message_id: u64,
        client_id: &str,
        duration: Duration,
    ) -> bool {
        let state = self.state.get_message_state(&self.log_id, group_id, message_id);
        if state.is_terminal() {
            return false;
        }
        if !self
            .leases
            .acquire(&self.log_id, group_id, message_id, client_id, duration)
        {
            return false;
        }
        self.state
            .set_message_state(&self.log_id, group_id, message_id, MessageState::InProgress);
        true
    }

    /// Records the outcome of processing `message_id` and releases its
    /// lease. Fails with [`Error::WrongOwner`] if a live lease is held by
    /// someone other than `client_id`; settlement after the lease has
    /// expired, but before anyone else re-acquires it, is permitted.
    pub fn settle(&self, group_id: &str, message_id: u64, client_id: &str, success: bool) -> Result<()> {
        if let Some(lease) = self.leases.get_lease(&self.log_id, group_id, message_id) {
            if lease.owner_id != client_id {
                warn!(
                    log_id = %self.log_id,
                    group_id,
                    message_id,
                    client_id,
                    "settle rejected: client does not own the lease"
                );
                return Err(Error::WrongOwner {
                    log_id: self.log_id.clone(),
                    group_id: group_id.to_owned(),
                    message_id,
                });
            }
        }

        let new_state = if success {
            MessageState::Processed
        } else {
            let retries = self
                .state
                .increment_retry_count(&self.log_id, group_id, message_id);
            if retries >= self.max_retries {
                error!(
                    log_id = %self.log_id,
                    group_id,
                    message_id,
                    retries,
                    "message exhausted retries, moving to dead state"
                );
                MessageState::Dead
            } else {
                MessageState::Failed
            }
        };

        self.state
            .set_message_state(&self.log_id, group_id, message_id, new_state);
        self.leases.release(&self.log_id, group_id, message_id);

        if new_state.is_terminal() {
            self.slide(group_id);
        }

        Ok(())
    }

    /// Advances `group_id`'s base offset past a contiguous prefix of
    /// terminal messages. Serialized per group so concurrent sliders never
    /// duplicate the scan; safe to call redundantly.
    fn slide(&self, group_id: &str) {
        let lock = self
            .slide_locks
            .entry(group_id.to_owned())
            .or_insert_with(|| Mutex::new(()));
        let _guard = lock.lock();

        let mut offset = self.state.get_base_offset(&self.log_id, group_id);
        while self
            .state
            .get_message_state(&self.log_id, group_id, offset)
            .is_terminal()
        {
            offset += 1;
        }
        self.state.set_base_offset(&self.log_id, group_id, offset);
    }
}
