//! Turn pipeline orchestrator: wires config resolution, per-tenant scenario
//! matching, dialogue components, and the call state store together into
//! the fixed per-turn stage sequence (spec §4.10).

pub mod error;
pub mod matcher_registry;
pub mod orchestrator;

pub use error::PipelineError;
pub use matcher_registry::MatcherRegistry;
pub use orchestrator::Orchestrator;
