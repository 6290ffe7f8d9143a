//! Tier-3 remote LLM matching (spec §4.3). Disabled by default, only
//! invoked when the caller's [`crate::MatchOptions::allow_tier3`] is set
//! (the S4A layer is the one allowed to set it) and a backend is wired in.
//! A timeout or backend error degrades to "no match," never propagates.

use async_trait::async_trait;
use frontdesk_core::ScenarioId;
use std::time::Duration;

use crate::MatcherError;

/// What Tier-3 returned: at most one scenario, with a short rationale for
/// logging/debugging -- never surfaced to the caller of the voice turn.
#[derive(Debug, Clone)]
pub struct Tier3Pick {
    pub scenario_id: ScenarioId,
    pub confidence: f32,
    pub rationale: String,
}

/// Implemented by `frontdesk-llm`'s remote backend adapter. Kept as a trait
/// here rather than a direct dependency on the LLM crate, the same seam the
/// teacher uses between `rag` and `llm` (constructed and injected by the
/// pipeline/server wiring layer, not by this crate).
#[async_trait]
pub trait Tier3Backend: Send + Sync {
    async fn pick_scenario(
        &self,
        text: &str,
        candidates: &[ScenarioId],
    ) -> Result<Option<Tier3Pick>, MatcherError>;
}

/// Runs a backend under a hard deadline. A timeout is logged and treated
/// exactly like "no match," per spec §4.3 failure modes.
pub async fn run_with_timeout(
    backend: &dyn Tier3Backend,
    text: &str,
    candidates: &[ScenarioId],
    timeout: Duration,
) -> Option<Tier3Pick> {
    match tokio::time::timeout(timeout, backend.pick_scenario(text, candidates)).await {
        Ok(Ok(pick)) => pick,
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "tier-3 backend returned an error, treating as no match");
            None
        }
        Err(_) => {
            tracing::warn!("tier-3 backend timed out, treating as no match");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowBackend;

    #[async_trait]
    impl Tier3Backend for SlowBackend {
        async fn pick_scenario(
            &self,
            _text: &str,
            _candidates: &[ScenarioId],
        ) -> Result<Option<Tier3Pick>, MatcherError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(Some(Tier3Pick {
                scenario_id: ScenarioId::from("late"),
                confidence: 0.9,
                rationale: "too slow".into(),
            }))
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl Tier3Backend for FailingBackend {
        async fn pick_scenario(
            &self,
            _text: &str,
            _candidates: &[ScenarioId],
        ) -> Result<Option<Tier3Pick>, MatcherError> {
            Err(MatcherError::Tier3("upstream 500".into()))
        }
    }

    #[tokio::test]
    async fn timeout_degrades_to_no_match() {
        let backend = SlowBackend;
        let result =
            run_with_timeout(&backend, "text", &[], Duration::from_millis(5)).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn backend_error_degrades_to_no_match() {
        let backend = FailingBackend;
        let result =
            run_with_timeout(&backend, "text", &[], Duration::from_millis(50)).await;
        assert!(result.is_none());
    }
}
