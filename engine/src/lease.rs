use std::collections::HashMap;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info};

type GroupKey = (String, String);

/// A time-bounded exclusive claim on one message, scoped to a (log, group).
#[derive(Debug, Clone)]
pub struct Lease {
    pub owner_id: String,
    pub expiry: Instant,
}

impl Lease {
    fn is_live(&self) -> bool {
        Instant::now() < self.expiry
    }
}

fn key(log_id: &str, group_id: &str) -> GroupKey {
    (log_id.to_owned(), group_id.to_owned())
}

/// Holds live leases keyed by (log, group, message id). Mutations against a
/// given (log, group) are serialized by the `DashMap` entry for that key.
/// `reap_expired` additionally takes `coordination` as a writer, which
/// blocks every other operation for the duration of the scan and prevents
/// a torn read of the lease table; `acquire`/`get_lease`/`get_leases`/
/// `release` take it as a reader first and only then touch their per-key
/// entry, so the lock order never inverts.
#[derive(Debug, Default)]
pub struct LeaseManager {
    leases: DashMap<GroupKey, HashMap<u64, Lease>>,
    coordination: RwLock<()>,
}

impl LeaseManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants a lease if none is currently live for this key. Returns
    /// `false` on a lost race; the caller is expected to treat that as
    /// ordinary control flow, not an error.
    pub fn acquire(
        &self,
        log_id: &str,
        group_id: &str,
        id: u64,
        owner_id: &str,
        duration: Duration,
    ) -> bool {
        let _coord = self.coordination.read();
        let mut group = self.leases.entry(key(log_id, group_id)).or_default();

        if let Some(existing) = group.get(&id) {
            if existing.is_live() {
                debug!(log_id, group_id, id, owner_id, "lease race lost");
                return false;
            }
        }

        group.insert(
            id,
            Lease {
                owner_id: owner_id.to_owned(),
                expiry: Instant::now() + duration,
            },
        );
        debug!(log_id, group_id, id, owner_id, "lease acquired");
        true
    }

    /// Returns the live lease for `id`, opportunistically dropping it first
    /// if it has already expired.
    pub fn get_lease(&self, log_id: &str, group_id: &str, id: u64) -> Option<Lease> {
        let _coord = self.coordination.read();
        let mut group = self.leases.get_mut(&key(log_id, group_id))?;
        take_if_live(&mut group, id)
    }

    /// Batch variant of [`get_lease`](Self::get_lease).
    pub fn get_leases(
        &self,
        log_id: &str,
        group_id: &str,
        ids: &[u64],
    ) -> HashMap<u64, Option<Lease>> {
        let _coord = self.coordination.read();
        let mut group = self.leases.get_mut(&key(log_id, group_id));
        ids.iter()
            .map(|&id| {
                let lease = group.as_mut().and_then(|g| take_if_live(g, id));
                (id, lease)
            })
            .collect()
    }

    /// Idempotently removes the lease for `id`, if any.
    pub fn release(&self, log_id: &str, group_id: &str, id: u64) {
        let _coord = self.coordination.read();
        if let Some(mut group) = self.leases.get_mut(&key(log_id, group_id)) {
            group.remove(&id);
        }
    }

    /// Scans every (log, group) bucket and drops leases whose expiry has
    /// passed. Returns the number of leases reaped.
    pub fn reap_expired(&self) -> usize {
        let _coord = self.coordination.write();
        let now = Instant::now();
        let mut reaped = 0;
        for mut group in self.leases.iter_mut() {
            let before = group.len();
            group.retain(|_, lease| lease.expiry > now);
            reaped += before - group.len();
        }
        if reaped > 0 {
            info!(reaped, "reaper collected expired leases");
        }
        reaped
    }
}

/// Returns `Some(lease)` if live, removing it (and returning `None`) if it
/// has expired.
fn take_if_live(group: &mut HashMap<u64, Lease>, id: u64) -> Option<Lease> {
    match group.get(&id) {
        Some(lease) if lease.is_live() => Some(lease.clone()),
        Some(_) => {
            group.remove(&id);
            None
        }
        None => None,
    }
}
