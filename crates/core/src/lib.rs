//! Shared types for the receptionist dialogue runtime.
//!
//! This crate is the acyclic center of the workspace: tenant config,
//! scenarios, call state, and turn events. Everything else (matching,
//! text processing, the dialogue components, the orchestrator, the state
//! store, the server) depends on this crate; it depends on nothing else in
//! the workspace.

pub mod call_state;
pub mod error;
pub mod events;
pub mod ids;
pub mod model;
pub mod turn;

pub use call_state::{
    BookingProgress, CallState, ChangeSource, ConsentState, DiscoveryProgress, Lane, Owner,
    PendingSlot, SlotSource, StateChange,
};
pub use error::{CoreResult, ErrorKind};
pub use events::{TurnEvent, TurnEventType};
pub use ids::{CallId, ScenarioId, SlotId, TenantId};
pub use model::{
    ConfirmMode, ConnectionQualityConfig, DetectionTriggersConfig, DiscoveryConfig,
    EscalationConfig, FlowConfig, FlowStep, FollowUp, FollowUpMode, GreetingConfig, PatternSet,
    ReplyStrategy, Scenario, ScenarioType, SlotDefinition, SlotType, TenantConfig, TriageConfig,
    VocabularyConfig, WeightedReply,
};
pub use turn::{
    Channel, Directives, StageOutcome, StateView, TransferDirective, TurnOutcome, TurnRequest,
    TurnResponse,
};
