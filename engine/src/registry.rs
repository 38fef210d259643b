use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::info;

use crate::lease::LeaseManager;
use crate::orchestrator::{Orchestrator, DEFAULT_MAX_RETRIES};
use crate::state::StateStore;
use crate::storage::Storage;

/// Process-wide directory of orchestrators, one per log, all sharing the
/// same `Storage`/`StateStore`/`LeaseManager`. This is the explicit value a
/// caller constructs once at startup and hands to the connection frontend;
/// it is not a global singleton.
pub struct Registry {
    storage: Arc<Storage>,
    state: Arc<StateStore>,
    leases: Arc<LeaseManager>,
    orchestrators: DashMap<String, Arc<Orchestrator>>,
    max_retries: u32,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_max_retries(DEFAULT_MAX_RETRIES)
    }

    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            storage: Arc::new(Storage::new()),
            state: Arc::new(StateStore::new()),
            leases: Arc::new(LeaseManager::new()),
            orchestrators: DashMap::new(),
            max_retries,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn leases(&self) -> &LeaseManager {
        &self.leases
    }

    /// Returns the orchestrator for `log_id`, constructing it on first use.
    pub fn orchestrator(&self, log_id: &str) -> Arc<Orchestrator> {
        Arc::clone(&self.orchestrators.entry(log_id.to_owned()).or_insert_with(|| {
            Arc::new(Orchestrator::new(
                log_id.to_owned(),
                Arc::clone(&self.storage),
                Arc::clone(&self.state),
                Arc::clone(&self.leases),
                self.max_retries,
            ))
        }))
    }

    /// Spawns the background lease reaper as a child task of this registry.
    /// The returned handle must be `shutdown` for a clean exit; dropping it
    /// leaves the task running.
    pub fn spawn_reaper(self: &Arc<Self>, interval: Duration) -> ReaperHandle {
        let registry = Arc::clone(self);
        let shutdown = Arc::new(Notify::new());
        let shutdown_rx = Arc::clone(&shutdown);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately; don't reap at t=0
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        registry.leases.reap_expired();
                    }
                    () = shutdown_rx.notified() => {
                        info!("lease reaper shutting down");
                        break;
                    }
                }
            }
        });

        ReaperHandle { shutdown, task }
    }
}

/// A running reaper task and its shutdown signal.
pub struct ReaperHandle {
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// Signals the reaper to stop and waits for it to quiesce.
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orchestrator_is_cached_per_log() {
        let registry = Registry::new();
        let a = registry.orchestrator("l");
        let b = registry.orchestrator("l");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn different_logs_get_different_orchestrators() {
        let registry = Registry::new();
        let a = registry.orchestrator("l1");
        let b = registry.orchestrator("l2");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tasks_sharing_a_registry_never_duplicate_delivery() {
        let registry = Arc::new(Registry::new());
        for i in 0..20 {
            registry.storage().append("l", serde_json::json!(i), None);
        }

        let mut handles = Vec::new();
        for worker in 0..4 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let orchestrator = registry.orchestrator("l");
                let client_id = format!("c{worker}");
                let mut acquired = Vec::new();
                while let Some(message) = orchestrator.acquire_next("g", &client_id, Duration::from_secs(30)) {
                    orchestrator.settle("g", message.id, &client_id, true).unwrap();
                    acquired.push(message.id);
                }
                acquired
            }));
        }

        let mut all_ids = Vec::new();
        for handle in handles {
            all_ids.extend(handle.await.unwrap());
        }
        all_ids.sort_unstable();
        assert_eq!(all_ids, (0..20).collect::<Vec<u64>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn reaper_collects_expired_leases_on_its_own() {
        let registry = Arc::new(Registry::new());
        registry
            .leases
            .acquire("l", "g", 0, "c1", Duration::from_millis(1));

        let handle = registry.spawn_reaper(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(60)).await;
        handle.shutdown().await;

        assert!(registry.leases.get_lease("l", "g", 0).is_none());
    }
}
