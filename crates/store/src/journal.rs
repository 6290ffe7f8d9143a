//! Event Journal (spec §4.12, C12). Append-only per `(call_id, turn_index)`,
//! sequenced within a turn. Writes must never block the turn: the Scylla
//! backend buffers into a bounded channel and flushes on a background task,
//! falling back to an in-memory overflow buffer if the channel is full or
//! the journal is unreachable (spec: "buffers in memory and flushes later
//! if journal unavailable").

use async_trait::async_trait;
use dashmap::DashMap;
use frontdesk_core::{CallId, CoreResult, ErrorKind, TurnEvent};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::client::ScyllaClient;
use crate::error::StoreError;

#[async_trait]
pub trait EventJournal: Send + Sync {
    /// Appends one event. Must not block the calling turn on storage
    /// latency; implementations that can't satisfy that synchronously
    /// should hand the event to a background writer instead.
    async fn append(&self, event: TurnEvent) -> CoreResult<()>;

    /// Returns a call's events in `(turn_index, seq)` order, for replay.
    async fn replay(&self, call_id: &CallId) -> CoreResult<Vec<TurnEvent>>;
}

#[derive(Default)]
pub struct InMemoryEventJournal {
    events: DashMap<CallId, Vec<TurnEvent>>,
}

impl InMemoryEventJournal {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventJournal for InMemoryEventJournal {
    async fn append(&self, event: TurnEvent) -> CoreResult<()> {
        self.events.entry(event.call_id.clone()).or_default().push(event);
        Ok(())
    }

    async fn replay(&self, call_id: &CallId) -> CoreResult<Vec<TurnEvent>> {
        let mut events = self.events.get(call_id).map(|v| v.clone()).unwrap_or_default();
        events.sort_by_key(|e| (e.turn_index, e.seq));
        Ok(events)
    }
}

/// Scylla-backed journal. `append` never touches the network directly: it
/// pushes onto a bounded channel drained by a background task, and falls
/// back to an in-process overflow buffer (`frontdesk-core`'s
/// `EventJournalBackpressure` event is emitted by the caller, not here, when
/// that happens) so a slow or down journal can never stall a turn.
pub struct ScyllaEventJournal {
    sender: mpsc::Sender<TurnEvent>,
    overflow: Arc<DashMap<CallId, Vec<TurnEvent>>>,
    client: ScyllaClient,
}

impl ScyllaEventJournal {
    pub fn new(client: ScyllaClient, buffer_capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<TurnEvent>(buffer_capacity);
        let overflow: Arc<DashMap<CallId, Vec<TurnEvent>>> = Arc::new(DashMap::new());
        let flush_client = client.clone();
        let flush_overflow = overflow.clone();

        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                if let Err(err) = Self::write(&flush_client, &event).await {
                    tracing::warn!(call_id = %event.call_id.as_str(), error = %err, "event journal write failed, buffering");
                    flush_overflow.entry(event.call_id.clone()).or_default().push(event);
                }
            }
        });

        Self { sender, overflow, client }
    }

    async fn write(client: &ScyllaClient, event: &TurnEvent) -> Result<(), StoreError> {
        let data_json = serde_json::to_string(&event.data).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let event_type_json = serde_json::to_string(&event.event_type).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let query = format!(
            "INSERT INTO {}.turn_events (call_id, turn_index, seq, tenant_id, event_type, timestamp_ms, data_json) VALUES (?, ?, ?, ?, ?, ?, ?)",
            client.keyspace()
        );
        client
            .session()
            .query_unpaged(
                query,
                (
                    event.call_id.as_str(),
                    event.turn_index as i64,
                    event.seq as i64,
                    event.tenant_id.as_str(),
                    event_type_json,
                    event.timestamp_ms,
                    data_json,
                ),
            )
            .await
            .map_err(|e| StoreError::from(e))?;
        Ok(())
    }

    /// Retries any events buffered in the overflow map after a prior write
    /// failure. Intended to be polled periodically, not called per-turn.
    pub async fn flush_overflow(&self) {
        let call_ids: Vec<CallId> = self.overflow.iter().map(|e| e.key().clone()).collect();
        for call_id in call_ids {
            if let Some((_, events)) = self.overflow.remove(&call_id) {
                for event in events {
                    if Self::write(&self.client, &event).await.is_err() {
                        self.overflow.entry(call_id.clone()).or_default().push(event);
                    }
                }
            }
        }
    }
}

#[async_trait]
impl EventJournal for ScyllaEventJournal {
    async fn append(&self, event: TurnEvent) -> CoreResult<()> {
        if self.sender.try_send(event.clone()).is_err() {
            tracing::warn!(call_id = %event.call_id.as_str(), "event journal channel full, buffering in overflow");
            self.overflow.entry(event.call_id.clone()).or_default().push(event);
        }
        Ok(())
    }

    async fn replay(&self, call_id: &CallId) -> CoreResult<Vec<TurnEvent>> {
        let query = format!(
            "SELECT call_id, turn_index, seq, tenant_id, event_type, timestamp_ms, data_json FROM {}.turn_events WHERE call_id = ?",
            self.client.keyspace()
        );
        let result = self
            .client
            .session()
            .query_unpaged(query, (call_id.as_str(),))
            .await
            .map_err(|e| ErrorKind::from(StoreError::from(e)))?;

        let rows = result
            .rows_typed::<(String, i64, i64, String, String, i64, String)>()
            .map_err(|e| ErrorKind::from(StoreError::Query(e.to_string())))?;

        let mut events = Vec::new();
        for row in rows {
            let (call_id, turn_index, seq, tenant_id, event_type_json, timestamp_ms, data_json) =
                row.map_err(|e| ErrorKind::from(StoreError::Query(e.to_string())))?;
            let event_type = serde_json::from_str(&event_type_json)
                .map_err(|e| ErrorKind::from(StoreError::Serialization(e.to_string())))?;
            let data = serde_json::from_str(&data_json)
                .map_err(|e| ErrorKind::from(StoreError::Serialization(e.to_string())))?;
            events.push(TurnEvent {
                call_id: call_id.into(),
                tenant_id: tenant_id.into(),
                turn_index: turn_index as u64,
                seq: seq as u64,
                event_type,
                timestamp_ms,
                data,
            });
        }
        events.sort_by_key(|e| (e.turn_index, e.seq));
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::{TenantId, TurnEventType};

    #[tokio::test]
    async fn replay_orders_by_turn_then_seq() {
        let journal = InMemoryEventJournal::new();
        let call_id = CallId::from("call-1");
        let tenant_id = TenantId::from("tenant-1");

        journal
            .append(TurnEvent::new(call_id.clone(), tenant_id.clone(), 1, 1, TurnEventType::S6Response, serde_json::json!({})))
            .await
            .unwrap();
        journal
            .append(TurnEvent::new(call_id.clone(), tenant_id.clone(), 0, 0, TurnEventType::S1RuntimeOwner, serde_json::json!({})))
            .await
            .unwrap();
        journal
            .append(TurnEvent::new(call_id.clone(), tenant_id.clone(), 0, 1, TurnEventType::InputTextSelected, serde_json::json!({})))
            .await
            .unwrap();

        let events = journal.replay(&call_id).await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event_type, TurnEventType::S1RuntimeOwner);
        assert_eq!(events[1].event_type, TurnEventType::InputTextSelected);
        assert_eq!(events[2].event_type, TurnEventType::S6Response);
    }

    #[tokio::test]
    async fn replay_of_unknown_call_is_empty() {
        let journal = InMemoryEventJournal::new();
        let events = journal.replay(&CallId::from("nope")).await.unwrap();
        assert!(events.is_empty());
    }
}
