//! Bridges an [`LlmBackend`] to the matcher's `Tier3Backend` trait (spec
//! §4.3): build a compact classification prompt, ask the model to pick at
//! most one scenario id plus a rationale, parse its reply. Any parse failure
//! is treated as "no pick," never an error that blocks the turn.

use std::sync::Arc;

use async_trait::async_trait;
use frontdesk_core::ScenarioId;
use frontdesk_matcher::{MatcherError, Tier3Backend, Tier3Pick};
use serde::Deserialize;

use crate::backend::LlmBackend;

pub struct ScenarioPickerBackend {
    backend: Arc<dyn LlmBackend>,
}

impl ScenarioPickerBackend {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tier3Backend for ScenarioPickerBackend {
    async fn pick_scenario(
        &self,
        text: &str,
        candidates: &[ScenarioId],
    ) -> Result<Option<Tier3Pick>, MatcherError> {
        if candidates.is_empty() {
            return Ok(None);
        }

        let prompt = build_prompt(text, candidates);
        let raw = self
            .backend
            .generate(&prompt)
            .await
            .map_err(|e| MatcherError::Tier3(e.to_string()))?;

        Ok(parse_pick(&raw, candidates))
    }
}

fn build_prompt(text: &str, candidates: &[ScenarioId]) -> String {
    let ids: Vec<&str> = candidates.iter().map(|c| c.as_str()).collect();
    format!(
        "A caller said: \"{text}\"\n\
         Candidate scenario ids: {}\n\
         Pick at most one scenario id that best matches what the caller said. \
         Reply with a single line of JSON and nothing else: \
         {{\"scenario_id\": <id or null>, \"confidence\": <0.0-1.0>, \"rationale\": <short phrase>}}",
        ids.join(", ")
    )
}

#[derive(Debug, Deserialize)]
struct PickResponse {
    scenario_id: Option<String>,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    rationale: String,
}

fn parse_pick(raw: &str, candidates: &[ScenarioId]) -> Option<Tier3Pick> {
    let json_slice = raw.trim();
    let parsed: PickResponse = serde_json::from_str(json_slice).ok()?;
    let scenario_id = ScenarioId::from(parsed.scenario_id?.as_str());
    if !candidates.contains(&scenario_id) {
        tracing::warn!(%scenario_id, "tier-3 picked a scenario outside the candidate set, discarding");
        return None;
    }
    Some(Tier3Pick {
        scenario_id,
        confidence: parsed.confidence,
        rationale: parsed.rationale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_pick() {
        let candidates = vec![ScenarioId::from("billing"), ScenarioId::from("hours")];
        let raw = r#"{"scenario_id": "billing", "confidence": 0.8, "rationale": "asked about invoice"}"#;
        let pick = parse_pick(raw, &candidates).unwrap();
        assert_eq!(pick.scenario_id, ScenarioId::from("billing"));
        assert!((pick.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn null_scenario_id_is_no_pick() {
        let candidates = vec![ScenarioId::from("billing")];
        let raw = r#"{"scenario_id": null, "confidence": 0.0, "rationale": "no match"}"#;
        assert!(parse_pick(raw, &candidates).is_none());
    }

    #[test]
    fn pick_outside_candidate_set_is_discarded() {
        let candidates = vec![ScenarioId::from("billing")];
        let raw = r#"{"scenario_id": "hallucinated", "confidence": 0.9, "rationale": "x"}"#;
        assert!(parse_pick(raw, &candidates).is_none());
    }

    #[test]
    fn malformed_json_is_no_pick() {
        let candidates = vec![ScenarioId::from("billing")];
        assert!(parse_pick("not json at all", &candidates).is_none());
    }
}
