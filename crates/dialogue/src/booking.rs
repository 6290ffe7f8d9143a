//! Booking Flow Runner (spec §4.7, C7). Active when `lane = BOOKING`.
//! Confirms pending slot values one at a time; on completion transitions
//! `lane = TERMINATED`.

use frontdesk_core::{CallState, Lane, SlotId, TenantConfig};

const AFFIRMATIVE: &[&str] = &["yes", "yeah", "yep", "correct", "that's right", "confirmed", "right"];
const NEGATIVE: &[&str] = &["no", "nope", "that's wrong", "incorrect", "not right"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    /// Ask the caller to confirm a pending value.
    Confirm { slot_id: SlotId, prompt: String },
    /// No pending value exists yet for the next unconfirmed step; fall back
    /// to an open question, the same shape as a Discovery Flow Runner
    /// prompt (spec is silent on this case -- see DESIGN.md).
    Ask { slot_id: SlotId, prompt: String },
    /// Every required booking slot is confirmed; the call is done.
    Completed,
    /// Nothing to do (e.g. empty booking flow).
    Idle,
}

fn is_affirmative(text: &str) -> bool {
    AFFIRMATIVE.iter().any(|p| text.contains(p))
}

fn is_negative(text: &str) -> bool {
    NEGATIVE.iter().any(|p| text.contains(p))
}

/// Runs one step of the booking flow against `normalized_text` (this turn's
/// caller utterance, already normalized by C1). Only meaningful when
/// `state.lane == Lane::Booking`.
pub fn run(state: &mut CallState, tenant: &TenantConfig, normalized_text: &str) -> BookingOutcome {
    let steps = &tenant.booking_flow.steps;
    if steps.is_empty() {
        return BookingOutcome::Idle;
    }

    let awaiting = state
        .last_owner
        .map(|o| o == frontdesk_core::Owner::BookingFlow)
        .unwrap_or(false);

    if awaiting {
        if let Some(slot_id) = steps
            .iter()
            .map(|s| &s.slot_id)
            .find(|id| state.pending_slots.contains_key(*id))
        {
            if is_affirmative(normalized_text) && !is_negative(normalized_text) {
                let _ = state.confirm_slot(slot_id);
            }
            // A negative/correction leaves the value pending; the next
            // extraction stage (run before this one, per the orchestrator's
            // stage order) already overwrote it if the caller corrected it.
        }
    }

    let mut index = state.booking.current_step_index;
    while index < steps.len() {
        let step = &steps[index];
        if state.confirmed_slots.contains_key(&step.slot_id) {
            index += 1;
            continue;
        }

        state.booking.current_step_index = index;

        if state.pending_slots.contains_key(&step.slot_id) {
            return BookingOutcome::Confirm {
                slot_id: step.slot_id.clone(),
                prompt: step.prompt_template.clone(),
            };
        }
        return BookingOutcome::Ask {
            slot_id: step.slot_id.clone(),
            prompt: step.prompt_template.clone(),
        };
    }

    state.booking.current_step_index = index;
    let _ = state.try_transition_lane(Lane::Terminated);
    BookingOutcome::Completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::{CallId, FlowConfig, FlowStep, Owner, SlotSource, TenantId};

    fn tenant_with_steps() -> TenantConfig {
        let mut tenant = TenantConfig::default();
        tenant.booking_flow = FlowConfig {
            steps: vec![FlowStep {
                slot_id: SlotId::from("address"),
                prompt_template: "Just confirming: address is {address}?".to_string(),
            }],
        };
        tenant
    }

    fn state() -> CallState {
        let mut s = CallState::new(CallId::from("call-1"), TenantId::from("tenant-1"));
        s.try_transition_lane(Lane::Booking).unwrap();
        s
    }

    #[test]
    fn asks_for_confirmation_of_a_pending_slot() {
        let tenant = tenant_with_steps();
        let mut s = state();
        s.set_pending_slot(SlotId::from("address"), "123 Market St", SlotSource::Extraction, 1);
        let outcome = run(&mut s, &tenant, "hello");
        assert_eq!(
            outcome,
            BookingOutcome::Confirm {
                slot_id: SlotId::from("address"),
                prompt: "Just confirming: address is {address}?".to_string(),
            }
        );
    }

    #[test]
    fn affirmative_response_confirms_the_slot() {
        let tenant = tenant_with_steps();
        let mut s = state();
        s.set_pending_slot(SlotId::from("address"), "123 Market St", SlotSource::Extraction, 1);
        run(&mut s, &tenant, "hello");
        s.last_owner = Some(Owner::BookingFlow);

        let outcome = run(&mut s, &tenant, "yes that's right");
        assert_eq!(outcome, BookingOutcome::Completed);
        assert_eq!(s.confirmed_slots.get(&SlotId::from("address")).unwrap(), "123 Market St");
        assert_eq!(s.lane, Lane::Terminated);
    }

    #[test]
    fn negative_response_keeps_slot_pending() {
        let tenant = tenant_with_steps();
        let mut s = state();
        s.set_pending_slot(SlotId::from("address"), "123 Market St", SlotSource::Extraction, 1);
        run(&mut s, &tenant, "hello");
        s.last_owner = Some(Owner::BookingFlow);

        let outcome = run(&mut s, &tenant, "no that's wrong");
        assert!(s.pending_slots.contains_key(&SlotId::from("address")));
        assert_eq!(
            outcome,
            BookingOutcome::Confirm {
                slot_id: SlotId::from("address"),
                prompt: "Just confirming: address is {address}?".to_string(),
            }
        );
    }

    #[test]
    fn no_pending_value_falls_back_to_asking() {
        let tenant = tenant_with_steps();
        let mut s = state();
        let outcome = run(&mut s, &tenant, "hello");
        assert_eq!(
            outcome,
            BookingOutcome::Ask {
                slot_id: SlotId::from("address"),
                prompt: "Just confirming: address is {address}?".to_string(),
            }
        );
    }
}
