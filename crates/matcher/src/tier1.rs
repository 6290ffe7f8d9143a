//! Tier-1 rule-based matching (spec §4.3). Keyword coverage with
//! word-boundary matching, a negative-trigger veto, and `priority` as a
//! tie-breaker. No randomness; ties resolve by declaration order.

use frontdesk_core::Scenario;
use std::collections::HashSet;

/// One candidate's Tier-1 score, or `None` if a negative trigger vetoed it.
fn score_one(tokens: &HashSet<&str>, scenario: &Scenario) -> Option<f32> {
    for negative in &scenario.negative_triggers {
        if phrase_covered(tokens, negative) {
            return None;
        }
    }

    let mut best = 0.0f32;
    for trigger in &scenario.triggers {
        let coverage = phrase_coverage(tokens, trigger);
        if coverage > best {
            best = coverage;
        }
    }
    Some(best)
}

/// Fraction of a trigger phrase's words present as whole tokens in the text.
fn phrase_coverage(tokens: &HashSet<&str>, phrase: &str) -> f32 {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let matched = words.iter().filter(|w| tokens.contains(*w)).count();
    matched as f32 / words.len() as f32
}

/// A negative trigger vetoes only when every one of its words is present --
/// a partial match on a negative phrase should not disqualify a scenario.
fn phrase_covered(tokens: &HashSet<&str>, phrase: &str) -> bool {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    !words.is_empty() && words.iter().all(|w| tokens.contains(*w))
}

/// Scores every candidate against the normalized text. Returns
/// `(index_into_candidates, score)` pairs for candidates that weren't vetoed,
/// in the same order as `candidates`.
pub fn score_candidates(text: &str, candidates: &[Scenario]) -> Vec<(usize, f32)> {
    let tokens: HashSet<&str> = text.split_whitespace().collect();
    candidates
        .iter()
        .enumerate()
        .filter_map(|(i, s)| score_one(&tokens, s).map(|score| (i, score)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::{FollowUp, ReplyStrategy, ScenarioId, ScenarioType, WeightedReply};

    fn scenario(triggers: &[&str], negative: &[&str]) -> Scenario {
        Scenario {
            id: ScenarioId::from("s"),
            scenario_type: ScenarioType::Faq,
            triggers: triggers.iter().map(|s| s.to_string()).collect(),
            negative_triggers: negative.iter().map(|s| s.to_string()).collect(),
            min_confidence: 0.6,
            reply_strategy: ReplyStrategy::QuickOnly,
            quick_replies: vec![WeightedReply { text: "ok".into(), weight: 1.0 }],
            full_replies: vec![],
            follow_up: FollowUp::default(),
            priority: 0,
            declaration_order: 0,
            audio_url: None,
        }
    }

    #[test]
    fn full_phrase_match_scores_one() {
        let s = scenario(&["heater broken"], &[]);
        let scored = score_candidates("the heater broken today", std::slice::from_ref(&s));
        assert_eq!(scored, vec![(0, 1.0)]);
    }

    #[test]
    fn partial_phrase_match_scores_fractionally() {
        let s = scenario(&["heater broken today"], &[]);
        let scored = score_candidates("the heater is broken", std::slice::from_ref(&s));
        assert_eq!(scored.len(), 1);
        assert!((scored[0].1 - (2.0 / 3.0)).abs() < 1e-6);
    }

    #[test]
    fn negative_trigger_vetoes_regardless_of_positive_score() {
        let s = scenario(&["heater"], &["heater fixed"]);
        let scored = score_candidates("the heater is fixed now", std::slice::from_ref(&s));
        assert!(scored.is_empty());
    }

    #[test]
    fn negative_trigger_requires_full_phrase_to_veto() {
        let s = scenario(&["heater"], &["heater fixed"]);
        let scored = score_candidates("the heater is broken", std::slice::from_ref(&s));
        assert_eq!(scored, vec![(0, 1.0)]);
    }
}
