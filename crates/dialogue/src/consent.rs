//! Consent Gate (spec §4.8, C8). Inspects normalized text for explicit
//! consent to proceed, and advances the call from Discovery into Booking.
//! Never produces response text itself -- it only mutates state.

use frontdesk_core::{CallState, Lane};

const EXPLICIT_CONSENT: &[&str] = &[
    "yes please book",
    "go ahead and book",
    "please schedule",
    "book it",
    "let's do it",
    "sounds good, book",
    "yes, please",
    "that works, book",
];

const DIRECT_INTENT: &[&str] = &["i want to book", "i'd like to schedule", "can you book", "set up an appointment"];

const EMERGENCY_FAST_PATH: &[&str] = &["emergency", "right now", "urgent", "flooding", "fire", "gas leak"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentTrigger {
    ExplicitConsent,
    DirectIntent,
    EmergencyFastPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsentOutcome {
    pub advanced: bool,
    pub trigger: Option<ConsentTrigger>,
}

fn matches_any(text: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| text.contains(p))
}

/// Checks `normalized_text` for a consent signal and, if found, transitions
/// `state.lane` from Discovery into Booking. A call already in Booking or
/// Terminated is left untouched (lane transitions are monotone, spec §3).
pub fn run(state: &mut CallState, normalized_text: &str) -> ConsentOutcome {
    if state.lane != Lane::Discovery {
        return ConsentOutcome {
            advanced: false,
            trigger: None,
        };
    }

    let trigger = if matches_any(normalized_text, EXPLICIT_CONSENT) {
        Some(ConsentTrigger::ExplicitConsent)
    } else if matches_any(normalized_text, EMERGENCY_FAST_PATH) {
        Some(ConsentTrigger::EmergencyFastPath)
    } else if matches_any(normalized_text, DIRECT_INTENT) {
        Some(ConsentTrigger::DirectIntent)
    } else {
        None
    };

    match trigger {
        Some(t) => {
            state.consent.asked_explicitly = matches!(t, ConsentTrigger::ExplicitConsent);
            state.consent.pending = false;
            let _ = state.try_transition_lane(Lane::Booking);
            ConsentOutcome {
                advanced: true,
                trigger: Some(t),
            }
        }
        None => ConsentOutcome {
            advanced: false,
            trigger: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::{CallId, TenantId};

    fn state() -> CallState {
        CallState::new(CallId::from("call-1"), TenantId::from("tenant-1"))
    }

    #[test]
    fn explicit_consent_advances_to_booking() {
        let mut s = state();
        let outcome = run(&mut s, "yes please book it for tomorrow");
        assert!(outcome.advanced);
        assert_eq!(outcome.trigger, Some(ConsentTrigger::ExplicitConsent));
        assert_eq!(s.lane, Lane::Booking);
        assert!(s.consent.asked_explicitly);
    }

    #[test]
    fn direct_intent_advances_without_explicit_flag() {
        let mut s = state();
        let outcome = run(&mut s, "i want to book a technician");
        assert!(outcome.advanced);
        assert_eq!(outcome.trigger, Some(ConsentTrigger::DirectIntent));
        assert!(!s.consent.asked_explicitly);
    }

    #[test]
    fn emergency_keywords_fast_path_to_booking() {
        let mut s = state();
        let outcome = run(&mut s, "there's a gas leak, this is an emergency");
        assert!(outcome.advanced);
        assert_eq!(outcome.trigger, Some(ConsentTrigger::EmergencyFastPath));
        assert_eq!(s.lane, Lane::Booking);
    }

    #[test]
    fn no_signal_leaves_lane_unchanged() {
        let mut s = state();
        let outcome = run(&mut s, "what are your hours");
        assert!(!outcome.advanced);
        assert_eq!(s.lane, Lane::Discovery);
    }

    #[test]
    fn already_booking_is_not_reprocessed() {
        let mut s = state();
        s.try_transition_lane(Lane::Booking).unwrap();
        let outcome = run(&mut s, "yes please book it");
        assert!(!outcome.advanced);
    }
}
