//! Optional Tier-3 remote LLM backend for the scenario matcher. Disabled by
//! default; see `frontdesk-matcher`'s `MatchOptions::allow_tier3`.

pub mod backend;
pub mod factory;
pub mod tier3_adapter;

mod error;

pub use backend::{LlmBackend, LlmConfig, OllamaBackend};
pub use error::LlmError;
pub use factory::build_backend;
pub use tier3_adapter::ScenarioPickerBackend;
