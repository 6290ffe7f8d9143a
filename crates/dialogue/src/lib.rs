//! Dialogue components: the per-turn decision logic that sits between the
//! scenario matcher and the turn pipeline orchestrator (spec §4.4-§4.10).
//! Each module is a pure function over `CallState`/`TenantConfig`; none of
//! them emit `TurnEvent`s or final response text -- that is the
//! orchestrator's job.

mod error;

pub mod booking;
pub mod connection_quality;
pub mod consent;
pub mod discovery;
pub mod escalation;
pub mod greeting;
pub mod opener;
pub mod reply;
pub mod triage;
pub mod triggers;

pub use booking::BookingOutcome;
pub use connection_quality::QualityIssue;
pub use consent::{ConsentOutcome, ConsentTrigger};
pub use discovery::DiscoveryPrompt;
pub use error::DialogueError;
pub use reply::select_reply;
pub use triage::{IntentGuess, Signals, SkipReason, TriageOutput};
pub use triggers::{DetectionResult, TriggerSignals};

pub type Result<T> = std::result::Result<T, DialogueError>;
