use thiserror::Error;

use frontdesk_core::ErrorKind;

/// Construction-time and stage-internal failures. None of these ever reach
/// [`crate::orchestrator::Orchestrator::run_turn`]'s caller — every site
/// that produces one converts it to an [`ErrorKind`] and the orchestrator
/// degrades the turn instead of propagating (spec §7).
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to resolve scenario catalog: {0}")]
    ScenarioCatalog(String),

    #[error("failed to build scenario matcher: {0}")]
    Matcher(String),
}

impl From<PipelineError> for ErrorKind {
    fn from(err: PipelineError) -> Self {
        ErrorKind::MatcherFailure(err.to_string())
    }
}
