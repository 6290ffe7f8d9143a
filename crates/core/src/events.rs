//! Append-only turn events (spec §3, §4.10, §6).

use crate::ids::{CallId, TenantId};
use serde::{Deserialize, Serialize};

/// Enumerated event codes. Closed set; dispatch on tag, no open hierarchy
/// (spec §9 "Scenario and trigger polymorphism").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnEventType {
    #[serde(rename = "SECTION_S1_RUNTIME_OWNER")]
    S1RuntimeOwner,
    #[serde(rename = "SECTION_S1_5_CONNECTION_QUALITY_GATE")]
    S1_5ConnectionQualityGate,
    #[serde(rename = "INPUT_TEXT_SELECTED")]
    InputTextSelected,
    #[serde(rename = "SECTION_S2_5_ESCALATION_DETECTED")]
    S2_5EscalationDetected,
    #[serde(rename = "GREETING_INTERCEPTED")]
    GreetingIntercepted,
    #[serde(rename = "SECTION_S3_SLOT_EXTRACTION")]
    S3SlotExtraction,
    #[serde(rename = "SECTION_S3_PENDING_SLOTS_STORED")]
    S3PendingSlotsStored,
    #[serde(rename = "SECTION_S3_5_DESCRIBING_PROBLEM_DETECTED")]
    S3_5DescribingProblemDetected,
    #[serde(rename = "SECTION_S3_5_TRUST_CONCERN_DETECTED")]
    S3_5TrustConcernDetected,
    #[serde(rename = "SECTION_S3_5_CALLER_FEELS_IGNORED_DETECTED")]
    S3_5CallerFeelsIgnoredDetected,
    #[serde(rename = "SECTION_S3_5_REFUSED_SLOT_DETECTED")]
    S3_5RefusedSlotDetected,
    #[serde(rename = "SECTION_S4A_1_TRIAGE_SIGNALS")]
    S4A1TriageSignals,
    #[serde(rename = "SECTION_S4A_2_SCENARIO_MATCH")]
    S4A2ScenarioMatch,
    #[serde(rename = "SECTION_S4B_DISCOVERY_OWNER_SELECTED")]
    S4BOwnerSelected,
    #[serde(rename = "SECTION_S5_CONSENT_GATE")]
    S5ConsentGate,
    #[serde(rename = "SECTION_S6_RESPONSE")]
    S6Response,
    #[serde(rename = "S4A_TIMED_OUT")]
    S4ATimedOut,
    #[serde(rename = "SCENARIO_MATCH_ERROR")]
    ScenarioMatchError,
    #[serde(rename = "STATE_LOAD_FAILED")]
    StateLoadFailed,
    #[serde(rename = "STATE_INVARIANT")]
    StateInvariant,
    #[serde(rename = "EVENT_JOURNAL_BACKPRESSURE")]
    EventJournalBackpressure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnEvent {
    pub call_id: CallId,
    pub tenant_id: TenantId,
    pub turn_index: u64,
    /// Monotonic per `(call_id, turn_index)`.
    pub seq: u64,
    #[serde(rename = "type")]
    pub event_type: TurnEventType,
    pub timestamp_ms: i64,
    pub data: serde_json::Value,
}

impl TurnEvent {
    pub fn new(
        call_id: CallId,
        tenant_id: TenantId,
        turn_index: u64,
        seq: u64,
        event_type: TurnEventType,
        data: serde_json::Value,
    ) -> Self {
        Self {
            call_id,
            tenant_id,
            turn_index,
            seq,
            event_type,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            data,
        }
    }
}
