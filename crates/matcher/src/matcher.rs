//! The Scenario Matcher (C3) public surface: `match_scenario`, walking
//! Tier-1 (rule), Tier-2 (semantic), then optionally Tier-3 (remote LLM) in
//! order, stopping at the first tier that clears the confidence gate.

use frontdesk_core::{Scenario, ScenarioId, ScenarioType};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::tier1;
use crate::tier2::{normalize_score, Tier2Index};
use crate::tier3::{run_with_timeout, Tier3Backend};

const DEFAULT_TIER3_TIMEOUT_MS: u64 = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Tier1,
    Tier2,
    Tier3,
}

#[derive(Debug, Clone)]
pub struct MatchHit {
    pub scenario_id: ScenarioId,
    pub score: f32,
    pub tier: MatchTier,
}

/// Per-call matching options. `allow_tier3` is owned by the S4A layer
/// (spec §4.3): everything below the matcher treats it as opaque.
#[derive(Debug, Clone, Default)]
pub struct MatchOptions {
    pub allow_tier3: bool,
    pub tier3_timeout: Option<Duration>,
}

/// Holds one tenant's scenario set and the Tier-2 index built over it.
/// Callers rebuild this whenever the tenant's scenario list changes (the
/// config resolver's cache invalidation is the upstream signal).
pub struct ScenarioMatcher {
    scenarios: Vec<Scenario>,
    tier2_index: Tier2Index,
    tier3_backend: Option<Arc<dyn Tier3Backend>>,
}

impl ScenarioMatcher {
    pub fn new(scenarios: Vec<Scenario>) -> crate::Result<Self> {
        let tier2_index = Tier2Index::build(&scenarios)?;
        Ok(Self {
            scenarios,
            tier2_index,
            tier3_backend: None,
        })
    }

    pub fn with_tier3_backend(mut self, backend: Arc<dyn Tier3Backend>) -> Self {
        self.tier3_backend = Some(backend);
        self
    }

    fn candidates(&self, allowed_types: &[ScenarioType]) -> Vec<&Scenario> {
        if allowed_types.is_empty() {
            self.scenarios.iter().collect()
        } else {
            let allowed: HashSet<ScenarioType> = allowed_types.iter().copied().collect();
            self.scenarios
                .iter()
                .filter(|s| allowed.contains(&s.scenario_type))
                .collect()
        }
    }

    /// `match(text, candidates, minConfidence, allowedTypes, options)` from
    /// spec §4.3. `text` is already the normalized turn text (C1's output).
    pub async fn match_scenario(
        &self,
        text: &str,
        min_confidence: f32,
        allowed_types: &[ScenarioType],
        options: &MatchOptions,
    ) -> Option<MatchHit> {
        let candidates = self.candidates(allowed_types);
        if candidates.is_empty() {
            return None;
        }

        if let Some(hit) = self.tier1_best(text, &candidates, min_confidence) {
            return Some(hit);
        }

        if let Some(hit) = self.tier2_best(text, &candidates, min_confidence) {
            return Some(hit);
        }

        if options.allow_tier3 {
            if let Some(hit) = self
                .tier3_best(text, &candidates, min_confidence, options)
                .await
            {
                return Some(hit);
            }
        }

        None
    }

    fn tier1_best(
        &self,
        text: &str,
        candidates: &[&Scenario],
        min_confidence: f32,
    ) -> Option<MatchHit> {
        let owned: Vec<Scenario> = candidates.iter().map(|s| (*s).clone()).collect();
        let mut scored = tier1::score_candidates(text, &owned);
        // Highest score first; among ties, higher priority first; among
        // those ties, earlier declaration order first. No randomness.
        scored.sort_by(|(ia, sa), (ib, sb)| {
            sb.partial_cmp(sa)
                .unwrap()
                .then_with(|| owned[*ib].priority.cmp(&owned[*ia].priority))
                .then_with(|| owned[*ia].declaration_order.cmp(&owned[*ib].declaration_order))
        });

        for (i, score) in scored {
            let scenario = &owned[i];
            let threshold = min_confidence.max(scenario.min_confidence);
            if score >= threshold {
                return Some(MatchHit {
                    scenario_id: scenario.id.clone(),
                    score,
                    tier: MatchTier::Tier1,
                });
            }
        }
        None
    }

    fn tier2_best(
        &self,
        text: &str,
        candidates: &[&Scenario],
        min_confidence: f32,
    ) -> Option<MatchHit> {
        let candidate_ids: HashSet<&ScenarioId> = candidates.iter().map(|s| &s.id).collect();
        let hits = match self.tier2_index.search(text, candidates.len().max(8)) {
            Ok(hits) => hits,
            Err(err) => {
                tracing::warn!(error = %err, "tier-2 search failed, treating as no match");
                return None;
            }
        };

        let mut ranked: Vec<(f32, &Scenario)> = hits
            .into_iter()
            .filter(|h| candidate_ids.contains(&h.scenario_id))
            .filter_map(|h| {
                let scenario = candidates.iter().find(|s| s.id == h.scenario_id)?;
                Some((normalize_score(h.score), *scenario))
            })
            .collect();

        ranked.sort_by(|(sa, a), (sb, b)| {
            sb.partial_cmp(sa)
                .unwrap()
                .then_with(|| b.priority.cmp(&a.priority))
                .then_with(|| a.declaration_order.cmp(&b.declaration_order))
        });

        for (score, scenario) in ranked {
            let threshold = min_confidence.max(scenario.min_confidence);
            if score >= threshold {
                return Some(MatchHit {
                    scenario_id: scenario.id.clone(),
                    score,
                    tier: MatchTier::Tier2,
                });
            }
        }
        None
    }

    async fn tier3_best(
        &self,
        text: &str,
        candidates: &[&Scenario],
        min_confidence: f32,
        options: &MatchOptions,
    ) -> Option<MatchHit> {
        let backend = self.tier3_backend.as_ref()?;
        let ids: Vec<ScenarioId> = candidates.iter().map(|s| s.id.clone()).collect();
        let timeout = options
            .tier3_timeout
            .unwrap_or_else(|| Duration::from_millis(DEFAULT_TIER3_TIMEOUT_MS));

        let pick = run_with_timeout(backend.as_ref(), text, &ids, timeout).await?;
        let scenario = candidates.iter().find(|s| s.id == pick.scenario_id)?;
        let threshold = min_confidence.max(scenario.min_confidence);
        if pick.confidence >= threshold {
            Some(MatchHit {
                scenario_id: scenario.id.clone(),
                score: pick.confidence,
                tier: MatchTier::Tier3,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::{FollowUp, ReplyStrategy, WeightedReply};

    fn scenario(id: &str, triggers: &[&str], priority: i32, order: usize) -> Scenario {
        Scenario {
            id: ScenarioId::from(id),
            scenario_type: ScenarioType::Faq,
            triggers: triggers.iter().map(|s| s.to_string()).collect(),
            negative_triggers: vec![],
            min_confidence: 0.5,
            reply_strategy: ReplyStrategy::QuickOnly,
            quick_replies: vec![WeightedReply { text: "ok".into(), weight: 1.0 }],
            full_replies: vec![],
            follow_up: FollowUp::default(),
            priority,
            declaration_order: order,
            audio_url: None,
        }
    }

    #[tokio::test]
    async fn tier1_hit_short_circuits_tier2() {
        let matcher = ScenarioMatcher::new(vec![
            scenario("hours", &["what are your hours"], 0, 0),
        ])
        .unwrap();
        let hit = matcher
            .match_scenario("what are your hours", 0.5, &[], &MatchOptions::default())
            .await
            .unwrap();
        assert_eq!(hit.scenario_id, ScenarioId::from("hours"));
        assert_eq!(hit.tier, MatchTier::Tier1);
    }

    #[tokio::test]
    async fn tie_breaks_on_priority_then_declaration_order() {
        let matcher = ScenarioMatcher::new(vec![
            scenario("low", &["appointment"], 0, 0),
            scenario("high", &["appointment"], 10, 1),
        ])
        .unwrap();
        let hit = matcher
            .match_scenario("appointment", 0.5, &[], &MatchOptions::default())
            .await
            .unwrap();
        assert_eq!(hit.scenario_id, ScenarioId::from("high"));
    }

    #[tokio::test]
    async fn below_confidence_gate_is_no_match() {
        let matcher = ScenarioMatcher::new(vec![
            scenario("partial", &["reschedule my appointment please"], 0, 0),
        ])
        .unwrap();
        let hit = matcher
            .match_scenario("appointment", 0.9, &[], &MatchOptions::default())
            .await;
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn allowed_types_filters_candidates() {
        let mut emergency = scenario("fire", &["smell smoke"], 0, 0);
        emergency.scenario_type = ScenarioType::Emergency;
        let matcher = ScenarioMatcher::new(vec![emergency]).unwrap();
        let hit = matcher
            .match_scenario(
                "smell smoke",
                0.5,
                &[ScenarioType::Faq],
                &MatchOptions::default(),
            )
            .await;
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn tier3_disabled_by_default() {
        let matcher = ScenarioMatcher::new(vec![scenario("faq", &["totally unrelated"], 0, 0)])
            .unwrap();
        let hit = matcher
            .match_scenario("nothing matches this at all", 0.5, &[], &MatchOptions::default())
            .await;
        assert!(hit.is_none());
    }
}
