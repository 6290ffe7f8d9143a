//! State Store (spec §4.11, C11). `load`/`persist`/`release`, backed by
//! either an in-process map (tests, single-node deployments) or ScyllaDB.

use async_trait::async_trait;
use dashmap::DashMap;
use frontdesk_core::{CallId, CallState, CoreResult, ErrorKind, TenantId};

use crate::client::ScyllaClient;
use crate::error::StoreError;

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Returns a zero-value state (spec §4.11) if the call has no
    /// persisted record.
    async fn load(&self, call_id: &CallId, tenant_id: &TenantId) -> CoreResult<CallState>;

    /// Atomic write of the full state record. Callers must call
    /// [`CallState::check_invariants`] before persisting -- this method
    /// re-checks the monotone invariants itself as a last line of defense
    /// and refuses to write a state that would violate them.
    async fn persist(&self, previous_turn_index: Option<u64>, state: &CallState) -> CoreResult<()>;

    /// Idempotent; deleting an already-absent call is not an error.
    async fn release(&self, call_id: &CallId) -> CoreResult<()>;
}

#[derive(Default)]
pub struct InMemoryStateStore {
    states: DashMap<CallId, CallState>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, call_id: &CallId, tenant_id: &TenantId) -> CoreResult<CallState> {
        Ok(self
            .states
            .get(call_id)
            .map(|entry| entry.clone())
            .unwrap_or_else(|| CallState::new(call_id.clone(), tenant_id.clone())))
    }

    async fn persist(&self, previous_turn_index: Option<u64>, state: &CallState) -> CoreResult<()> {
        state.check_invariants(previous_turn_index)?;
        self.states.insert(state.call_id.clone(), state.clone());
        Ok(())
    }

    async fn release(&self, call_id: &CallId) -> CoreResult<()> {
        self.states.remove(call_id);
        Ok(())
    }
}

pub struct ScyllaStateStore {
    client: ScyllaClient,
}

impl ScyllaStateStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StateStore for ScyllaStateStore {
    async fn load(&self, call_id: &CallId, tenant_id: &TenantId) -> CoreResult<CallState> {
        let query = format!(
            "SELECT state_json FROM {}.call_state WHERE call_id = ?",
            self.client.keyspace()
        );
        let result = self
            .client
            .session()
            .query_unpaged(query, (call_id.as_str(),))
            .await
            .map_err(|e| ErrorKind::from(StoreError::from(e)))?;

        let row = result
            .rows_typed::<(String,)>()
            .map_err(|e| ErrorKind::from(StoreError::Query(e.to_string())))?
            .next();

        match row {
            Some(Ok((state_json,))) => serde_json::from_str(&state_json)
                .map_err(|e| ErrorKind::from(StoreError::Serialization(e.to_string()))),
            _ => Ok(CallState::new(call_id.clone(), tenant_id.clone())),
        }
    }

    async fn persist(&self, previous_turn_index: Option<u64>, state: &CallState) -> CoreResult<()> {
        state.check_invariants(previous_turn_index)?;

        let state_json = serde_json::to_string(state)
            .map_err(|e| ErrorKind::from(StoreError::Serialization(e.to_string())))?;

        let query = format!(
            "INSERT INTO {}.call_state (call_id, tenant_id, turn_index, state_json, updated_at) VALUES (?, ?, ?, ?, toTimestamp(now()))",
            self.client.keyspace()
        );
        self.client
            .session()
            .query_unpaged(
                query,
                (
                    state.call_id.as_str(),
                    state.tenant_id.as_str(),
                    state.turn_index as i64,
                    state_json,
                ),
            )
            .await
            .map_err(|e| ErrorKind::from(StoreError::from(e)))?;

        Ok(())
    }

    async fn release(&self, call_id: &CallId) -> CoreResult<()> {
        let query = format!("DELETE FROM {}.call_state WHERE call_id = ?", self.client.keyspace());
        self.client
            .session()
            .query_unpaged(query, (call_id.as_str(),))
            .await
            .map_err(|e| ErrorKind::from(StoreError::from(e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::Lane;

    #[tokio::test]
    async fn load_of_unknown_call_returns_zero_value_state() {
        let store = InMemoryStateStore::new();
        let state = store
            .load(&CallId::from("call-1"), &TenantId::from("tenant-1"))
            .await
            .unwrap();
        assert_eq!(state.lane, Lane::Discovery);
        assert_eq!(state.turn_index, 0);
    }

    #[tokio::test]
    async fn persist_then_load_roundtrips() {
        let store = InMemoryStateStore::new();
        let mut state = CallState::new(CallId::from("call-1"), TenantId::from("tenant-1"));
        state.turn_index = 1;
        store.persist(None, &state).await.unwrap();

        let loaded = store.load(&CallId::from("call-1"), &TenantId::from("tenant-1")).await.unwrap();
        assert_eq!(loaded.turn_index, 1);
    }

    #[tokio::test]
    async fn persist_rejects_non_increasing_turn_index() {
        let store = InMemoryStateStore::new();
        let mut state = CallState::new(CallId::from("call-1"), TenantId::from("tenant-1"));
        state.turn_index = 3;
        let err = store.persist(Some(3), &state).await.unwrap_err();
        assert!(matches!(err, ErrorKind::InvariantViolation(_)));
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let store = InMemoryStateStore::new();
        store.release(&CallId::from("ghost")).await.unwrap();
        store.release(&CallId::from("ghost")).await.unwrap();
    }
}
