//! Per-call state (spec §3 "Call state"). Owned by one call, lifetime = call.

use crate::error::ErrorKind;
use crate::ids::{CallId, SlotId, TenantId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The high-level mode of a call. Transitions are monotone: DISCOVERY ->
/// BOOKING -> TERMINATED, no back-edges (spec §3, §8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Lane {
    Discovery,
    Booking,
    Terminated,
}

impl Lane {
    /// Validates a proposed transition against the monotone ordering. A
    /// no-op transition (same lane) is always allowed.
    pub fn can_transition_to(self, next: Lane) -> bool {
        next >= self
    }
}

impl Default for Lane {
    fn default() -> Self {
        Lane::Discovery
    }
}

/// Where an extracted slot value came from. Drives confirmation behavior
/// in the Discovery/Booking Flow Runners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotSource {
    Extraction,
    Triage,
    CallerVolunteer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSlot {
    pub value: String,
    pub source: SlotSource,
    pub turn: u64,
    /// Always false by construction — a slot in `pendingSlots` is, by
    /// definition, not yet confirmed. Kept as an explicit field (rather
    /// than implied by map membership) because it is mirrored into the
    /// event journal and into `plainSlots`.
    pub confirmed: bool,
}

impl PendingSlot {
    pub fn new(value: impl Into<String>, source: SlotSource, turn: u64) -> Self {
        Self {
            value: value.into(),
            source,
            turn,
            confirmed: false,
        }
    }
}

/// Who mutated a slot, for the bounded change history (supplemental
/// feature, grounded on the teacher's dialogue-state-tracker corrections).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeSource {
    UserUtterance,
    Correction,
    SystemConfirmation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChange {
    pub turn_index: u64,
    pub slot_id: SlotId,
    pub old_value: Option<String>,
    pub new_value: String,
    pub source: ChangeSource,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryProgress {
    pub current_step_index: usize,
    pub reprompt_count: HashMap<SlotId, u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingProgress {
    pub current_step_index: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsentState {
    pub pending: bool,
    pub asked_explicitly: bool,
}

/// The single component authorized to produce final text for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Owner {
    TriageScenario,
    DiscoveryFlow,
    BookingFlow,
    Greeting,
    Transfer,
}

const MAX_CHANGE_HISTORY: usize = 32;
const MAX_REPROMPTS_PER_SLOT: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallState {
    pub call_id: CallId,
    pub tenant_id: TenantId,
    pub lane: Lane,
    pub turn_index: u64,
    pub pending_slots: HashMap<SlotId, PendingSlot>,
    pub confirmed_slots: HashMap<SlotId, String>,
    pub discovery: DiscoveryProgress,
    pub booking: BookingProgress,
    pub consent: ConsentState,
    pub greeted_this_call: bool,
    pub last_response: Option<String>,
    pub last_owner: Option<Owner>,
    pub last_opener: Option<String>,
    /// Sticky for the remainder of the call (spec §9 open question:
    /// `refusedSlot` is treated as per-call, not per-turn).
    pub refused_slots: HashSet<SlotId>,
    #[serde(default)]
    pub change_history: Vec<StateChange>,
}

impl CallState {
    pub fn new(call_id: CallId, tenant_id: TenantId) -> Self {
        Self {
            call_id,
            tenant_id,
            lane: Lane::default(),
            turn_index: 0,
            pending_slots: HashMap::new(),
            confirmed_slots: HashMap::new(),
            discovery: DiscoveryProgress::default(),
            booking: BookingProgress::default(),
            consent: ConsentState::default(),
            greeted_this_call: false,
            last_response: None,
            last_owner: None,
            last_opener: None,
            refused_slots: HashSet::new(),
            change_history: Vec::new(),
        }
    }

    /// Union view of pending and confirmed slots (spec §3 `plainSlots`,
    /// "legacy view"). Confirmed wins on the (impossible, by invariant)
    /// case of the same slot appearing in both.
    pub fn plain_slots(&self) -> HashMap<SlotId, String> {
        let mut out: HashMap<SlotId, String> = self
            .pending_slots
            .iter()
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect();
        for (k, v) in &self.confirmed_slots {
            out.insert(k.clone(), v.clone());
        }
        out
    }

    /// Enforces the "at most one of pending/confirmed" invariant before
    /// inserting a newly-extracted value.
    pub fn set_pending_slot(
        &mut self,
        slot_id: SlotId,
        value: impl Into<String>,
        source: SlotSource,
        turn: u64,
    ) {
        let value = value.into();
        if self.confirmed_slots.contains_key(&slot_id) {
            // Already confirmed: a fresh extraction does not downgrade it.
            // The caller must go through `record_correction` to override.
            return;
        }
        let old = self.pending_slots.get(&slot_id).map(|p| p.value.clone());
        if old.as_deref() != Some(value.as_str()) {
            self.push_change(slot_id.clone(), old, value.clone(), ChangeSource::UserUtterance);
        }
        self.pending_slots
            .insert(slot_id, PendingSlot::new(value, source, turn));
    }

    /// Moves a pending slot to confirmed (Booking Flow Runner only, per
    /// spec §4.6 "The runner never promotes pending -> confirmed").
    pub fn confirm_slot(&mut self, slot_id: &SlotId) -> Result<(), ErrorKind> {
        match self.pending_slots.remove(slot_id) {
            Some(pending) => {
                self.push_change(
                    slot_id.clone(),
                    Some(pending.value.clone()),
                    pending.value.clone(),
                    ChangeSource::SystemConfirmation,
                );
                self.confirmed_slots.insert(slot_id.clone(), pending.value);
                Ok(())
            }
            None => Err(ErrorKind::InvariantViolation(format!(
                "cannot confirm slot {} with no pending value",
                slot_id
            ))),
        }
    }

    /// A caller correction replaces the pending value without confirming it.
    pub fn correct_pending_slot(&mut self, slot_id: SlotId, value: impl Into<String>, turn: u64) {
        let value = value.into();
        let old = self.pending_slots.get(&slot_id).map(|p| p.value.clone());
        self.push_change(slot_id.clone(), old, value.clone(), ChangeSource::Correction);
        self.pending_slots.insert(
            slot_id,
            PendingSlot::new(value, SlotSource::CallerVolunteer, turn),
        );
    }

    fn push_change(
        &mut self,
        slot_id: SlotId,
        old_value: Option<String>,
        new_value: String,
        source: ChangeSource,
    ) {
        self.change_history.push(StateChange {
            turn_index: self.turn_index,
            slot_id,
            old_value,
            new_value,
            source,
        });
        if self.change_history.len() > MAX_CHANGE_HISTORY {
            self.change_history.remove(0);
        }
    }

    pub fn mark_refused(&mut self, slot_id: SlotId) {
        self.refused_slots.insert(slot_id);
    }

    pub fn is_refused(&self, slot_id: &SlotId) -> bool {
        self.refused_slots.contains(slot_id)
    }

    /// Bumps and returns the reprompt counter for a slot; callers compare
    /// against `MAX_REPROMPTS_PER_SLOT` to decide whether to give up.
    pub fn bump_reprompt(&mut self, slot_id: &SlotId) -> u32 {
        let counter = self.discovery.reprompt_count.entry(slot_id.clone()).or_insert(0);
        *counter += 1;
        *counter
    }

    pub fn reprompt_exhausted(&self, slot_id: &SlotId) -> bool {
        self.discovery
            .reprompt_count
            .get(slot_id)
            .copied()
            .unwrap_or(0)
            >= MAX_REPROMPTS_PER_SLOT
    }

    /// Validates the invariants persist() must enforce (spec §4.11).
    pub fn check_invariants(&self, previous_turn_index: Option<u64>) -> Result<(), ErrorKind> {
        for slot_id in self.pending_slots.keys() {
            if self.confirmed_slots.contains_key(slot_id) {
                return Err(ErrorKind::InvariantViolation(format!(
                    "slot {} present in both pending and confirmed",
                    slot_id
                )));
            }
        }
        if let Some(prev) = previous_turn_index {
            if self.turn_index <= prev {
                return Err(ErrorKind::InvariantViolation(format!(
                    "turnIndex must strictly increase: {} -> {}",
                    prev, self.turn_index
                )));
            }
        }
        Ok(())
    }

    pub fn try_transition_lane(&mut self, next: Lane) -> Result<(), ErrorKind> {
        if !self.lane.can_transition_to(next) {
            return Err(ErrorKind::InvariantViolation(format!(
                "illegal lane transition {:?} -> {:?}",
                self.lane, next
            )));
        }
        self.lane = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> CallState {
        CallState::new(CallId::from("call-1"), TenantId::from("tenant-1"))
    }

    #[test]
    fn lane_is_monotone() {
        assert!(Lane::Discovery.can_transition_to(Lane::Booking));
        assert!(Lane::Booking.can_transition_to(Lane::Terminated));
        assert!(!Lane::Booking.can_transition_to(Lane::Discovery));
        assert!(!Lane::Terminated.can_transition_to(Lane::Discovery));
        assert!(Lane::Discovery.can_transition_to(Lane::Discovery));
    }

    #[test]
    fn slot_is_exactly_pending_or_confirmed() {
        let mut s = state();
        let slot = SlotId::from("address");
        s.set_pending_slot(slot.clone(), "123 Market St", SlotSource::Extraction, 1);
        assert!(s.pending_slots.contains_key(&slot));
        s.confirm_slot(&slot).unwrap();
        assert!(!s.pending_slots.contains_key(&slot));
        assert!(s.confirmed_slots.contains_key(&slot));
        assert!(s.check_invariants(None).is_ok());
    }

    #[test]
    fn confirming_unknown_slot_is_invariant_violation() {
        let mut s = state();
        let err = s.confirm_slot(&SlotId::from("nope")).unwrap_err();
        assert!(matches!(err, ErrorKind::InvariantViolation(_)));
    }

    #[test]
    fn reprompt_counter_bounds() {
        let mut s = state();
        let slot = SlotId::from("phone");
        assert!(!s.reprompt_exhausted(&slot));
        s.bump_reprompt(&slot);
        s.bump_reprompt(&slot);
        assert!(s.reprompt_exhausted(&slot));
    }

    #[test]
    fn turn_index_must_strictly_increase() {
        let mut s = state();
        s.turn_index = 3;
        assert!(s.check_invariants(Some(3)).is_err());
        s.turn_index = 4;
        assert!(s.check_invariants(Some(3)).is_ok());
    }
}
