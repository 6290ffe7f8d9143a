//! Tiered Scenario Matcher (C3): a rule-based Tier-1, a BM25-style semantic
//! Tier-2 over an embedded `tantivy` index, and an optional remote-LLM
//! Tier-3, tried in that order and stopping at the first tier that clears
//! the confidence gate.

pub mod matcher;
pub mod tier1;
pub mod tier2;
pub mod tier3;

mod error;

pub use error::MatcherError;
pub use matcher::{MatchHit, MatchOptions, MatchTier, ScenarioMatcher};
pub use tier2::{Tier2Hit, Tier2Index};
pub use tier3::{Tier3Backend, Tier3Pick};

pub type Result<T> = std::result::Result<T, MatcherError>;
