//! Inbound/outbound turn envelopes (spec §6) and the stage-outcome tag used
//! by the orchestrator (spec §9: "each stage is a function (ctx) -> ctx
//! with a tagged outcome").

use crate::call_state::Lane;
use crate::error::ErrorKind;
use crate::events::TurnEvent;
use crate::ids::{CallId, SlotId, TenantId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Voice,
    Sms,
    Chat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    pub tenant_id: TenantId,
    pub call_id: CallId,
    #[serde(default)]
    pub turn_index: Option<u64>,
    pub transcript: String,
    pub stt_confidence: f32,
    pub channel: Channel,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnResponse {
    pub text: String,
    #[serde(default)]
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferDirective {
    pub target: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Directives {
    #[serde(default)]
    pub transfer: Option<TransferDirective>,
    #[serde(default)]
    pub hangup: bool,
    #[serde(default)]
    pub follow_up_question: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateView {
    pub lane: Lane,
    pub pending_slots: HashMap<SlotId, String>,
    pub confirmed_slots: HashMap<SlotId, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub response: TurnResponse,
    pub directives: Directives,
    pub state: StateView,
    pub events: Vec<TurnEvent>,
}

/// Tagged outcome of a single pipeline stage. `Continue` means the stage
/// mutated the context in place and the orchestrator proceeds to the next
/// stage; `ShortCircuit` carries the final response text for this turn;
/// `Error` is always non-fatal to the caller — the orchestrator logs it
/// and falls through per spec §4.10/§7.
#[derive(Debug, Clone)]
pub enum StageOutcome {
    Continue,
    ShortCircuit(TurnResponse),
    Error(ErrorKind),
}
