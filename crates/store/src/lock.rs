//! Per-call advisory lock (spec §4.11, §5). The orchestrator holds this for
//! the duration of a turn so two concurrent webhook deliveries for the same
//! call can't interleave their load/persist cycle.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use frontdesk_core::CallId;

#[derive(Default)]
pub struct CallLockTable {
    locks: DashMap<CallId, Arc<Mutex<()>>>,
}

impl CallLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the advisory lock for `call_id`, creating it on first use.
    /// The returned guard releases the lock on drop; entries are never
    /// removed from the table, so lock identity is stable for the life of
    /// the process (acceptable: one call's worth of calls is bounded by
    /// concurrent call volume, not call history).
    pub async fn lock(&self, call_id: &CallId) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(call_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_call_id_serializes_through_one_lock() {
        let table = CallLockTable::new();
        let call_id = CallId::from("call-1");

        let guard = table.lock(&call_id).await;
        let table = Arc::new(table);
        let table2 = table.clone();
        let call_id2 = call_id.clone();

        let handle = tokio::spawn(async move {
            let _guard2 = table2.lock(&call_id2).await;
            "acquired"
        });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!handle.is_finished());

        drop(guard);
        let result = handle.await.unwrap();
        assert_eq!(result, "acquired");
    }

    #[tokio::test]
    async fn different_call_ids_do_not_contend() {
        let table = CallLockTable::new();
        let _g1 = table.lock(&CallId::from("a")).await;
        let g2 = table.lock(&CallId::from("b")).await;
        drop(g2);
    }
}
