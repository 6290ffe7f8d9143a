//! Error kinds for the dialogue runtime.
//!
//! Spec kinds, not exception types: every stage maps its failures onto one
//! of these before returning. None of them ever reach the webhook boundary
//! as a raised error — the orchestrator always converts to a response
//! envelope (see `frontdesk-pipeline::orchestrator`).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// State store, journal, or config fetch hiccup. Retried with a small
    /// bounded budget inside the turn; on exhaustion, degrade gracefully.
    #[error("transient I/O failure: {0}")]
    TransientIo(String),

    /// A matcher tier failed to score candidates; treated as no match.
    #[error("scenario matcher failure: {0}")]
    MatcherFailure(String),

    /// Tier-3 LLM fallback unreachable or disabled; indistinguishable from
    /// no match, never fatal.
    #[error("tier-3 LLM unavailable: {0}")]
    Tier3Unavailable(String),

    /// A state invariant was about to be violated (e.g. slot in both
    /// pending and confirmed). Fail closed for the turn.
    #[error("state invariant violated: {0}")]
    InvariantViolation(String),

    /// Tenant config is missing a required flow or has zero scenarios.
    #[error("invalid tenant configuration: {0}")]
    ConfigInvalid(String),

    /// A stage or stage group exceeded its wall-clock budget.
    #[error("deadline breached: {0}")]
    DeadlineBreached(String),
}

pub type CoreResult<T> = Result<T, ErrorKind>;
