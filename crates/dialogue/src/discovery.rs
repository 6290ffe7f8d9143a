//! Discovery Flow Runner (spec §4.6, C6). Walks `discoveryFlow.steps`, one
//! step advanced (or satisfied) per turn. Never promotes pending to
//! confirmed -- only the Booking Flow Runner or an explicit confirmation
//! turn does that.

use frontdesk_core::{CallState, ConfirmMode, SlotId, TenantConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryPrompt {
    pub slot_id: SlotId,
    pub prompt: String,
}

/// `None` means every step is either confirmed, satisfied by a pending
/// value, or exhausted -- discovery has nothing left to ask this turn.
pub fn run(state: &mut CallState, tenant: &TenantConfig) -> Option<DiscoveryPrompt> {
    let steps = &tenant.discovery_flow.steps;
    let mut index = state.discovery.current_step_index;

    while index < steps.len() {
        let step = &steps[index];

        if state.confirmed_slots.contains_key(&step.slot_id) || state.is_refused(&step.slot_id) {
            index += 1;
            continue;
        }

        if let Some(pending) = state.pending_slots.get(&step.slot_id) {
            let slot_def = tenant.slots.get(step.slot_id.as_str());
            let always_confirm = slot_def
                .map(|d| d.confirm_mode == ConfirmMode::Always)
                .unwrap_or(false);
            if !always_confirm {
                // Pending value is usable context; discovery doesn't re-ask.
                let _ = pending;
                index += 1;
                continue;
            }
        }

        if state.reprompt_exhausted(&step.slot_id) {
            state.mark_refused(step.slot_id.clone());
            index += 1;
            continue;
        }

        state.discovery.current_step_index = index;
        state.bump_reprompt(&step.slot_id);
        return Some(DiscoveryPrompt {
            slot_id: step.slot_id.clone(),
            prompt: step.prompt_template.clone(),
        });
    }

    state.discovery.current_step_index = index;
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::{CallId, FlowConfig, FlowStep, SlotDefinition, SlotType, TenantId};

    fn tenant_with_steps() -> TenantConfig {
        let mut tenant = TenantConfig::default();
        tenant.discovery_flow = FlowConfig {
            steps: vec![
                FlowStep {
                    slot_id: SlotId::from("name"),
                    prompt_template: "What's your name?".to_string(),
                },
                FlowStep {
                    slot_id: SlotId::from("phone"),
                    prompt_template: "What's the best callback number?".to_string(),
                },
            ],
        };
        tenant.slots.insert(
            "phone".to_string(),
            SlotDefinition {
                id: SlotId::from("phone"),
                slot_type: SlotType::Phone,
                required: true,
                confirm_mode: frontdesk_core::ConfirmMode::Always,
                extractors: vec![],
            },
        );
        tenant
    }

    fn state() -> CallState {
        CallState::new(CallId::from("call-1"), TenantId::from("tenant-1"))
    }

    #[test]
    fn asks_first_unfilled_step() {
        let tenant = tenant_with_steps();
        let mut s = state();
        let prompt = run(&mut s, &tenant).unwrap();
        assert_eq!(prompt.slot_id, SlotId::from("name"));
    }

    #[test]
    fn pending_value_with_allow_pending_is_satisfied_without_reasking() {
        let tenant = tenant_with_steps();
        let mut s = state();
        s.set_pending_slot(SlotId::from("name"), "Alex", frontdesk_core::SlotSource::Extraction, 1);
        let prompt = run(&mut s, &tenant).unwrap();
        assert_eq!(prompt.slot_id, SlotId::from("phone"));
    }

    #[test]
    fn always_confirm_slot_is_still_asked_even_if_pending() {
        let tenant = tenant_with_steps();
        let mut s = state();
        s.set_pending_slot(SlotId::from("name"), "Alex", frontdesk_core::SlotSource::Extraction, 1);
        s.set_pending_slot(SlotId::from("phone"), "+14155550134", frontdesk_core::SlotSource::Extraction, 1);
        let prompt = run(&mut s, &tenant).unwrap();
        assert_eq!(prompt.slot_id, SlotId::from("phone"));
    }

    #[test]
    fn exhausted_reprompts_mark_refused_and_advance() {
        let tenant = tenant_with_steps();
        let mut s = state();
        run(&mut s, &tenant);
        run(&mut s, &tenant);
        // Third ask exhausts the bound (MAX_REPROMPTS_PER_SLOT = 2).
        let prompt = run(&mut s, &tenant).unwrap();
        assert!(s.is_refused(&SlotId::from("name")));
        assert_eq!(prompt.slot_id, SlotId::from("phone"));
    }

    #[test]
    fn all_steps_done_returns_none() {
        let tenant = tenant_with_steps();
        let mut s = state();
        s.confirmed_slots.insert(SlotId::from("name"), "Alex".to_string());
        s.confirmed_slots.insert(SlotId::from("phone"), "+14155550134".to_string());
        assert!(run(&mut s, &tenant).is_none());
    }
}
