//! Tenant configuration and scenario data model (spec §3).

use crate::ids::{ScenarioId, SlotId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed slot value. Kept deliberately small and closed — no open class
/// hierarchy for slot types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    Text,
    Phone,
    Address,
    Name,
    Date,
    Number,
    Enum(Vec<String>),
}

/// Whether a slot must be re-confirmed on every sighting, or a pending
/// value is acceptable context until the Booking Flow Runner confirms it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmMode {
    Always,
    AllowPending,
}

impl Default for ConfirmMode {
    fn default() -> Self {
        ConfirmMode::AllowPending
    }
}

/// Registry entry for one slot (C2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotDefinition {
    pub id: SlotId,
    pub slot_type: SlotType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub confirm_mode: ConfirmMode,
    /// Names of extractors to run, in order, for this slot. The extractor
    /// registry (frontdesk-text) resolves these to functions.
    #[serde(default)]
    pub extractors: Vec<String>,
}

/// One step of a discovery or booking flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowStep {
    pub slot_id: SlotId,
    pub prompt_template: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowConfig {
    pub steps: Vec<FlowStep>,
}

/// Ordered, possibly-empty pattern list for one detection-trigger set.
/// Company-provided lists override platform defaults when non-empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternSet {
    pub patterns: Vec<String>,
}

impl PatternSet {
    pub fn resolve(tenant: &PatternSet, platform_default: &PatternSet) -> PatternSet {
        if tenant.patterns.is_empty() {
            platform_default.clone()
        } else {
            tenant.clone()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionTriggersConfig {
    pub describing_problem: PatternSet,
    pub trust_concern: PatternSet,
    pub caller_feels_ignored: PatternSet,
    pub refused_slot: PatternSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    #[serde(default)]
    pub auto_on_problem: bool,
}

fn default_min_confidence() -> f32 {
    0.6
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_confidence: default_min_confidence(),
            auto_on_problem: false,
        }
    }
}

/// The types of scenarios a tenant may allow to auto-respond during
/// discovery (spec §3 `discovery.autoReplyAllowedScenarioTypes`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioType {
    Faq,
    Troubleshoot,
    Emergency,
    SmallTalk,
    ActionFlow,
    SystemAck,
    InfoFaq,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub disable_scenario_auto_responses: bool,
    #[serde(default)]
    pub auto_reply_allowed_scenario_types: Vec<ScenarioType>,
    #[serde(default)]
    pub force_llm_discovery: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            disable_scenario_auto_responses: false,
            auto_reply_allowed_scenario_types: vec![
                ScenarioType::Faq,
                ScenarioType::Troubleshoot,
                ScenarioType::Emergency,
            ],
            force_llm_discovery: false,
        }
    }
}

/// S1.5 Connection Quality Gate thresholds (spec §4.10 S1.5): below
/// `min_stt_confidence`, or on a trouble-phrase hit ("you're breaking up"),
/// the turn short-circuits with a clarification prompt instead of running
/// the rest of the pipeline against a possibly-garbled transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionQualityConfig {
    #[serde(default = "default_min_stt_confidence")]
    pub min_stt_confidence: f32,
    #[serde(default)]
    pub trouble_phrases: Vec<String>,
    #[serde(default = "default_clarification_prompt")]
    pub clarification_prompt: String,
}

fn default_min_stt_confidence() -> f32 {
    0.4
}

fn default_clarification_prompt() -> String {
    "Sorry, the line's a little unclear -- could you say that again?".to_string()
}

impl Default for ConnectionQualityConfig {
    fn default() -> Self {
        Self {
            min_stt_confidence: default_min_stt_confidence(),
            trouble_phrases: vec!["you're breaking up".to_string(), "can't hear you".to_string()],
            clarification_prompt: default_clarification_prompt(),
        }
    }
}

/// S2.5 Escalation Detection (spec §4.10): hard-stop phrases that always
/// transfer to a human, independent of lane or scenario match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    #[serde(default)]
    pub hard_stop_phrases: Vec<String>,
    pub transfer_target: String,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            hard_stop_phrases: vec![
                "get me a human".to_string(),
                "speak to a person".to_string(),
                "talk to a manager".to_string(),
                "real person".to_string(),
            ],
            transfer_target: "default".to_string(),
        }
    }
}

/// GREET stage config (spec §4.10): phrases that are a greeting and nothing
/// else, and the fixed text spoken back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreetingConfig {
    #[serde(default)]
    pub greeting_only_phrases: Vec<String>,
    pub greeting_text: String,
}

impl Default for GreetingConfig {
    fn default() -> Self {
        Self {
            greeting_only_phrases: vec![
                "hello".to_string(),
                "hi".to_string(),
                "hey".to_string(),
                "good morning".to_string(),
                "good afternoon".to_string(),
            ],
            greeting_text: "Hi there, thanks for calling! How can I help you today?".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// Additive: platform defaults are always merged in, never replaced.
    pub synonyms: BTreeMap<String, String>,
    /// Additive, same rule as synonyms.
    pub fillers: Vec<String>,
}

/// The fully-resolved configuration for one tenant (platform defaults
/// overlaid with tenant overrides). See `frontdesk-config::resolver`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    #[serde(default)]
    pub triage: TriageConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub experimental_s4a: bool,
    #[serde(default)]
    pub detection_triggers: DetectionTriggersConfig,
    #[serde(default)]
    pub slots: BTreeMap<String, SlotDefinition>,
    #[serde(default)]
    pub discovery_flow: FlowConfig,
    #[serde(default)]
    pub booking_flow: FlowConfig,
    #[serde(default)]
    pub openers: Vec<String>,
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
    #[serde(default)]
    pub connection_quality: ConnectionQualityConfig,
    #[serde(default)]
    pub escalation: EscalationConfig,
    #[serde(default)]
    pub greeting: GreetingConfig,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            triage: TriageConfig::default(),
            discovery: DiscoveryConfig::default(),
            experimental_s4a: false,
            detection_triggers: DetectionTriggersConfig::default(),
            slots: BTreeMap::new(),
            discovery_flow: FlowConfig::default(),
            booking_flow: FlowConfig::default(),
            openers: vec!["Alright.".to_string(), "Got it.".to_string()],
            vocabulary: VocabularyConfig::default(),
            connection_quality: ConnectionQualityConfig::default(),
            escalation: EscalationConfig::default(),
            greeting: GreetingConfig::default(),
        }
    }
}

/// How a scenario's replies are chosen relative to `quickReplies`/`fullReplies`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplyStrategy {
    QuickOnly,
    FullOnly,
    QuickThenFull,
    Auto,
    LlmWrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FollowUpMode {
    None,
    AskFollowupQuestion,
    AskIfBook,
    Transfer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUp {
    pub mode: FollowUpMode,
    #[serde(default)]
    pub question_text: Option<String>,
    #[serde(default)]
    pub transfer_target: Option<String>,
}

impl Default for FollowUp {
    fn default() -> Self {
        Self {
            mode: FollowUpMode::None,
            question_text: None,
            transfer_target: None,
        }
    }
}

/// A weighted reply candidate. Reply text selection within a scenario is
/// weighted-random; matching itself is never randomized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedReply {
    pub text: String,
    #[serde(default = "default_weight")]
    pub weight: f32,
}

fn default_weight() -> f32 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    #[serde(rename = "type")]
    pub scenario_type: ScenarioType,
    pub triggers: Vec<String>,
    #[serde(default)]
    pub negative_triggers: Vec<String>,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    pub reply_strategy: ReplyStrategy,
    #[serde(default)]
    pub quick_replies: Vec<WeightedReply>,
    #[serde(default)]
    pub full_replies: Vec<WeightedReply>,
    #[serde(default)]
    pub follow_up: FollowUp,
    #[serde(default)]
    pub priority: i32,
    /// Declaration order within the tenant's scenario list, used as the
    /// final tiebreak after score and priority (spec §4.3 "Ordering").
    #[serde(default)]
    pub declaration_order: usize,
    /// Present iff the scenario has a pre-recorded audio artifact.
    #[serde(default)]
    pub audio_url: Option<String>,
}

impl Scenario {
    /// Invariant check (spec §3): at least one reply list non-empty; if the
    /// follow-up is TRANSFER, a transfer target must be supplied.
    pub fn validate(&self) -> Result<(), String> {
        if (0.0..=1.0).contains(&self.min_confidence) == false {
            return Err(format!(
                "scenario {}: minConfidence {} out of [0,1]",
                self.id, self.min_confidence
            ));
        }
        if self.quick_replies.is_empty() && self.full_replies.is_empty() {
            return Err(format!(
                "scenario {}: must declare at least one quick or full reply",
                self.id
            ));
        }
        if self.follow_up.mode == FollowUpMode::Transfer
            && self
                .follow_up
                .transfer_target
                .as_deref()
                .unwrap_or("")
                .is_empty()
        {
            return Err(format!(
                "scenario {}: followUp.mode=TRANSFER requires transferTarget",
                self.id
            ));
        }
        Ok(())
    }
}
