//! Detection Trigger Engine (spec §4.5, C5). Four independent pattern sets,
//! each an ordered OR of case-insensitive substrings. Company-provided lists
//! override platform defaults when non-empty -- that merge already happened
//! in the config resolver (`PatternSet::resolve`); this module only matches
//! the resolved sets against one turn's text.

use frontdesk_core::{CallState, PatternSet, SlotId, TenantConfig};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResult {
    pub matched: bool,
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TriggerSignals {
    pub describing_problem: DetectionResult,
    pub trust_concern: DetectionResult,
    pub caller_feels_ignored: DetectionResult,
    pub refused_slot: DetectionResult,
}

fn match_set(text: &str, set: &PatternSet) -> DetectionResult {
    for pattern in &set.patterns {
        if text.contains(&pattern.to_lowercase()) {
            return DetectionResult {
                matched: true,
                pattern: Some(pattern.clone()),
            };
        }
    }
    DetectionResult::default()
}

/// Runs all four sets against `normalized_text` (already lowercased by C1,
/// matched case-insensitively anyway since patterns are lowercased here).
pub fn detect(normalized_text: &str, tenant: &TenantConfig) -> TriggerSignals {
    let triggers = &tenant.detection_triggers;
    TriggerSignals {
        describing_problem: match_set(normalized_text, &triggers.describing_problem),
        trust_concern: match_set(normalized_text, &triggers.trust_concern),
        caller_feels_ignored: match_set(normalized_text, &triggers.caller_feels_ignored),
        refused_slot: match_set(normalized_text, &triggers.refused_slot),
    }
}

/// Applies a `refusedSlot` match to call state: the slot currently being
/// asked (if any) is marked refused for the remainder of the call so the
/// Discovery Flow Runner does not re-ask it (spec §4.5, §9 open question).
pub fn apply_refused_slot(state: &mut CallState, signals: &TriggerSignals, asking_slot: Option<&SlotId>) {
    if signals.refused_slot.matched {
        if let Some(slot_id) = asking_slot {
            state.mark_refused(slot_id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::{CallId, TenantId};

    fn tenant_with_pattern(pattern: &str) -> TenantConfig {
        let mut tenant = TenantConfig::default();
        tenant.detection_triggers.trust_concern = PatternSet {
            patterns: vec![pattern.to_string()],
        };
        tenant
    }

    #[test]
    fn matches_a_configured_pattern() {
        let tenant = tenant_with_pattern("is this a scam");
        let signals = detect("wait, is this a scam call", &tenant);
        assert!(signals.trust_concern.matched);
        assert_eq!(signals.trust_concern.pattern.as_deref(), Some("is this a scam"));
    }

    #[test]
    fn no_match_leaves_default() {
        let tenant = tenant_with_pattern("is this a scam");
        let signals = detect("i need a plumber", &tenant);
        assert!(!signals.trust_concern.matched);
        assert!(!signals.describing_problem.matched);
    }

    #[test]
    fn refused_slot_marks_the_asking_slot() {
        let mut state = CallState::new(CallId::from("call-1"), TenantId::from("tenant-1"));
        let slot = SlotId::from("address");
        let signals = TriggerSignals {
            refused_slot: DetectionResult {
                matched: true,
                pattern: Some("i won't say".to_string()),
            },
            ..Default::default()
        };
        apply_refused_slot(&mut state, &signals, Some(&slot));
        assert!(state.is_refused(&slot));
    }
}
