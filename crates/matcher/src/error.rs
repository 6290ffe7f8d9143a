//! Errors for the tiered scenario matcher. Matcher failures never propagate
//! to the orchestrator as turn failures (spec §4.3 "Failure modes") -- this
//! type exists for the tiers to report *why* a tier produced no match, which
//! callers log and then treat as a miss.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatcherError {
    #[error("tier-2 index error: {0}")]
    Index(String),

    #[error("tier-2 query error: {0}")]
    Search(String),

    #[error("tier-3 backend error: {0}")]
    Tier3(String),

    #[error("tier-3 request timed out")]
    Tier3Timeout,
}
