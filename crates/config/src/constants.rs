//! Centralized constants for the receptionist runtime.
//!
//! Tenant-specific values (triage thresholds, vocabulary, scenario triggers)
//! are never hardcoded here — they come from tenant configuration, resolved
//! by [`crate::resolver`]. This module only holds generic operational
//! defaults: service endpoints, timeouts, and matcher tuning.

/// Service endpoints (env-overridable, generic infrastructure).
pub mod endpoints {
    use once_cell::sync::Lazy;

    /// Tier-3 LLM backend endpoint (env: FRONTDESK_LLM_URL).
    pub static LLM_DEFAULT: Lazy<String> = Lazy::new(|| {
        std::env::var("FRONTDESK_LLM_URL").unwrap_or_else(|_| "http://localhost:11434".to_string())
    });
}

/// Timeouts, in milliseconds unless noted.
pub mod timeouts {
    /// Default per-turn latency budget (spec §5).
    pub const TURN_BUDGET_MS: u64 = 1200;

    /// Tier-3 LLM request timeout. A breach here is a `Tier3Unavailable`
    /// error, never a hang (spec §7).
    pub const TIER3_REQUEST_MS: u64 = 800;

    /// Tier-2 semantic search timeout.
    pub const TIER2_SEARCH_MS: u64 = 150;
}

/// Matcher tuning defaults (spec §4.3).
pub mod matcher {
    /// Platform default minimum confidence for a scenario match to fire,
    /// when a scenario does not declare its own.
    pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.6;

    /// Tier-1 rule matches above this score skip Tier-2 entirely.
    pub const TIER1_SHORT_CIRCUIT_SCORE: f32 = 0.95;

    /// Default Tier-2 candidate pool size before reranking.
    pub const TIER2_TOP_K: usize = 8;
}
