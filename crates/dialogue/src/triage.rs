//! Triage Signal Router (spec §4.4, C4). Produces signals only -- it never
//! generates response text. Uses rule patterns for intent classification and,
//! when a candidate card set is supplied, the scenario matcher's Tier-1
//! scoring to find a `matchedCardId`.

use frontdesk_core::{Scenario, ScenarioId, TenantConfig};
use frontdesk_matcher::tier1;
use frontdesk_text::Urgency;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentGuess {
    ServiceRequest,
    Pricing,
    Status,
    Complaint,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
}

#[derive(Debug, Clone)]
pub struct Signals {
    pub urgency: Urgency,
    pub symptoms: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TriageOutput {
    pub attempted: bool,
    pub skip_reason: Option<SkipReason>,
    pub intent_guess: Option<IntentGuess>,
    pub confidence: f32,
    pub call_reason_detail: String,
    pub signals: Option<Signals>,
    pub matched_card_id: Option<ScenarioId>,
}

impl TriageOutput {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            attempted: false,
            skip_reason: Some(reason),
            intent_guess: None,
            confidence: 0.0,
            call_reason_detail: String::new(),
            signals: None,
            matched_card_id: None,
        }
    }
}

const PRICING_PATTERNS: &[&str] = &["how much", "cost", "price", "quote", "estimate"];
const STATUS_PATTERNS: &[&str] = &["where is", "status", "update on", "eta", "on the way"];
const COMPLAINT_PATTERNS: &[&str] = &["unacceptable", "terrible", "angry", "still broken", "again"];

fn guess_intent(text: &str) -> (IntentGuess, f32) {
    if COMPLAINT_PATTERNS.iter().any(|p| text.contains(p)) {
        return (IntentGuess::Complaint, 0.8);
    }
    if PRICING_PATTERNS.iter().any(|p| text.contains(p)) {
        return (IntentGuess::Pricing, 0.75);
    }
    if STATUS_PATTERNS.iter().any(|p| text.contains(p)) {
        return (IntentGuess::Status, 0.75);
    }
    (IntentGuess::ServiceRequest, 0.5)
}

/// Runs the router. `urgency`/`symptoms` come from C1's entity extraction;
/// `cards` are the candidate scenarios eligible for triage matching (the
/// caller decides which subset, e.g. only FAQ/troubleshoot types).
pub fn run_triage(
    normalized_text: &str,
    urgency: Urgency,
    symptoms: Vec<String>,
    tenant: &TenantConfig,
    cards: &[Scenario],
) -> TriageOutput {
    if !tenant.triage.enabled {
        return TriageOutput::skipped(SkipReason::Disabled);
    }

    let (intent_guess, confidence) = guess_intent(normalized_text);

    let matched_card_id = if cards.is_empty() {
        None
    } else {
        let mut scored = tier1::score_candidates(normalized_text, cards);
        scored.sort_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap());
        scored
            .into_iter()
            .find(|(_, score)| *score >= tenant.triage.min_confidence)
            .map(|(i, _)| cards[i].id.clone())
    };

    TriageOutput {
        attempted: true,
        skip_reason: None,
        intent_guess: Some(intent_guess),
        confidence,
        call_reason_detail: normalized_text.chars().take(120).collect(),
        signals: Some(Signals { urgency, symptoms }),
        matched_card_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::{FollowUp, ReplyStrategy, ScenarioType, TriageConfig, WeightedReply};

    fn tenant(enabled: bool) -> TenantConfig {
        let mut t = TenantConfig::default();
        t.triage = TriageConfig {
            enabled,
            min_confidence: 0.5,
            auto_on_problem: false,
        };
        t
    }

    #[test]
    fn disabled_triage_short_circuits() {
        let out = run_triage("my heater is broken", Urgency::Normal, vec![], &tenant(false), &[]);
        assert!(!out.attempted);
        assert_eq!(out.skip_reason, Some(SkipReason::Disabled));
    }

    #[test]
    fn classifies_pricing_intent() {
        let out = run_triage("how much does a repair cost", Urgency::Normal, vec![], &tenant(true), &[]);
        assert_eq!(out.intent_guess, Some(IntentGuess::Pricing));
    }

    #[test]
    fn matches_a_candidate_card() {
        let card = Scenario {
            id: ScenarioId::from("hours"),
            scenario_type: ScenarioType::Faq,
            triggers: vec!["what are your hours".to_string()],
            negative_triggers: vec![],
            min_confidence: 0.5,
            reply_strategy: ReplyStrategy::QuickOnly,
            quick_replies: vec![WeightedReply { text: "9 to 5".into(), weight: 1.0 }],
            full_replies: vec![],
            follow_up: FollowUp::default(),
            priority: 0,
            declaration_order: 0,
            audio_url: None,
        };
        let out = run_triage(
            "what are your hours",
            Urgency::Normal,
            vec![],
            &tenant(true),
            std::slice::from_ref(&card),
        );
        assert_eq!(out.matched_card_id, Some(ScenarioId::from("hours")));
    }
}
