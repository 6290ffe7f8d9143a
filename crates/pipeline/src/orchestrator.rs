//! Turn Pipeline Orchestrator (spec §4.10, C10). Runs the fixed stage
//! sequence S1 -> S1.5 -> S2 -> S2.5 -> GREET -> S3 -> S3.5 -> S4A-1 ->
//! S4A-2 -> S4B -> S5 -> S6 over one turn. Every stage failure degrades to a
//! fallback response instead of propagating -- nothing thrown here ever
//! reaches the webhook boundary as an exception (spec §7).

use std::sync::Arc;
use std::time::Duration;

use frontdesk_config::ConfigResolver;
use frontdesk_core::{
    CallId, CallState, Channel, Directives, Lane, Owner, Scenario, ScenarioType, SlotId,
    SlotSource, TenantConfig, TenantId, TransferDirective, TurnEvent, TurnEventType, TurnOutcome,
    TurnRequest, TurnResponse,
};
use frontdesk_dialogue::{booking, connection_quality, consent, discovery, escalation, greeting, opener, select_reply, triage, triggers, BookingOutcome};
use frontdesk_matcher::MatchOptions;
use frontdesk_store::{CallLockTable, EventJournal, StateStore};
use frontdesk_text::{extract_entities, extract_slots, normalize};

use crate::matcher_registry::MatcherRegistry;

/// Wall-clock budget for S4A (triage + scenario match, Tier-3 included).
/// Breaching it emits `S4A_TIMED_OUT` and the turn proceeds with no match,
/// never blocking the caller past this point (spec §5, §7 `DeadlineBreached`).
const DEFAULT_S4A_BUDGET: Duration = Duration::from_millis(450);

pub struct Orchestrator {
    config_resolver: Arc<ConfigResolver>,
    matcher_registry: Arc<MatcherRegistry>,
    state_store: Arc<dyn StateStore>,
    journal: Arc<dyn EventJournal>,
    locks: Arc<CallLockTable>,
    default_min_confidence: f32,
    tier3_fallback_enabled: bool,
    tier3_timeout: Duration,
    s4a_budget: Duration,
}

/// Mutable scratch state threaded through the stage sequence. Not
/// persisted itself -- `state` is what gets written back via the store.
struct TurnContext {
    call_id: CallId,
    tenant_id: TenantId,
    state: CallState,
    previous_turn_index: Option<u64>,
    channel: Channel,
    normalized: frontdesk_text::NormalizedText,
    selected_text: String,
    events: Vec<TurnEvent>,
    seq: u64,
    directives: Directives,
}

impl TurnContext {
    fn emit(&mut self, event_type: TurnEventType, data: serde_json::Value) {
        let event = TurnEvent::new(
            self.call_id.clone(),
            self.tenant_id.clone(),
            self.state.turn_index,
            self.seq,
            event_type,
            data,
        );
        self.seq += 1;
        self.events.push(event);
    }
}

impl Orchestrator {
    pub fn new(
        config_resolver: Arc<ConfigResolver>,
        matcher_registry: Arc<MatcherRegistry>,
        state_store: Arc<dyn StateStore>,
        journal: Arc<dyn EventJournal>,
        locks: Arc<CallLockTable>,
        default_min_confidence: f32,
        tier3_fallback_enabled: bool,
        tier3_timeout: Duration,
    ) -> Self {
        Self {
            config_resolver,
            matcher_registry,
            state_store,
            journal,
            locks,
            default_min_confidence,
            tier3_fallback_enabled,
            tier3_timeout,
            s4a_budget: DEFAULT_S4A_BUDGET,
        }
    }

    /// Runs one turn end to end. Holds the per-call advisory lock for the
    /// duration so two concurrent webhook deliveries for the same call
    /// never interleave their load/persist cycle (spec §4.11/§5).
    pub async fn run_turn(&self, request: TurnRequest) -> TurnOutcome {
        let _guard = self.locks.lock(&request.call_id).await;

        let (tenant, _fell_back) = self.config_resolver.resolve(&request.tenant_id);
        let (mut ctx, response) = match self.load_context(&request, &tenant).await {
            Ok(mut ctx) => {
                let response = self.run_stages(&mut ctx, &tenant).await;
                (ctx, response)
            }
            Err((ctx, response)) => (ctx, response),
        };

        let previous_turn_index = ctx.previous_turn_index;
        if let Err(err) = self.state_store.persist(previous_turn_index, &ctx.state).await {
            ctx.emit(
                TurnEventType::StateInvariant,
                serde_json::json!({ "error": err.to_string() }),
            );
        }

        for event in ctx.events.clone() {
            if let Err(err) = self.journal.append(event).await {
                tracing::warn!(call_id = %ctx.call_id, error = %err, "event journal append failed");
            }
        }

        TurnOutcome {
            response,
            directives: ctx.directives,
            state: frontdesk_core::StateView {
                lane: ctx.state.lane,
                pending_slots: ctx
                    .state
                    .pending_slots
                    .iter()
                    .map(|(k, v)| (k.clone(), v.value.clone()))
                    .collect(),
                confirmed_slots: ctx.state.confirmed_slots.clone(),
            },
            events: ctx.events,
        }
    }

    async fn load_context(
        &self,
        request: &TurnRequest,
        tenant: &TenantConfig,
    ) -> Result<TurnContext, (TurnContext, TurnResponse)> {
        let state = match self.state_store.load(&request.call_id, &request.tenant_id).await {
            Ok(state) => state,
            Err(err) => {
                tracing::error!(call_id = %request.call_id, error = %err, "state load failed, starting fresh");
                CallState::new(request.call_id.clone(), request.tenant_id.clone())
            }
        };

        let previous_turn_index = if state.turn_index == 0 && state.last_response.is_none() {
            None
        } else {
            Some(state.turn_index)
        };

        let mut state = state;
        state.turn_index = request.turn_index.unwrap_or(state.turn_index + 1);

        let normalized = normalize(&request.transcript, tenant);

        let mut ctx = TurnContext {
            call_id: request.call_id.clone(),
            tenant_id: request.tenant_id.clone(),
            state,
            previous_turn_index,
            channel: request.channel,
            selected_text: normalized.normalized.clone(),
            normalized,
            events: Vec::new(),
            seq: 0,
            directives: Directives::default(),
        };

        ctx.emit(
            TurnEventType::S1RuntimeOwner,
            serde_json::json!({ "channel": request.channel, "turn_index": ctx.state.turn_index }),
        );

        // S1.5 Connection Quality Gate.
        if let Some(issue) = connection_quality::check(&ctx.selected_text, request.stt_confidence, &tenant.connection_quality) {
            ctx.emit(
                TurnEventType::S1_5ConnectionQualityGate,
                serde_json::json!({ "issue": format!("{:?}", issue) }),
            );
            return Err(self.finish_short_circuit(ctx, tenant.connection_quality.clarification_prompt.clone()));
        }

        // S2 Input Text Selected.
        let expanded = ctx.normalized.expanded.clone();
        ctx.emit(
            TurnEventType::InputTextSelected,
            serde_json::json!({ "normalized": ctx.selected_text, "expanded": expanded }),
        );

        Ok(ctx)
    }

    /// Wraps up a turn that short-circuited before reaching S6 proper (S1.5
    /// Connection Quality Gate). Still owes the caller the mandatory
    /// `S4BOwnerSelected` proof event (spec §4.10/§8) and an `S6Response`
    /// event, and still flows back through `run_turn`'s persist/journal
    /// step, same as the full path, so replay reproduces this turn too.
    fn finish_short_circuit(&self, mut ctx: TurnContext, text: String) -> (TurnContext, TurnResponse) {
        let owner = if ctx.state.lane == Lane::Booking { Owner::BookingFlow } else { Owner::DiscoveryFlow };
        ctx.state.last_owner = Some(owner);
        ctx.emit(TurnEventType::S4BOwnerSelected, serde_json::json!({ "owner": format!("{:?}", owner) }));
        ctx.emit(TurnEventType::S6Response, serde_json::json!({ "text": text, "short_circuit": true }));
        let response = TurnResponse { text, audio_url: None };
        (ctx, response)
    }

    async fn run_stages(&self, ctx: &mut TurnContext, tenant: &TenantConfig) -> TurnResponse {
        // S2.5 Escalation Detection.
        if let Some(target) = escalation::detect(&ctx.selected_text, &tenant.escalation) {
            ctx.emit(TurnEventType::S2_5EscalationDetected, serde_json::json!({ "target": target }));
            ctx.state.last_owner = Some(Owner::Transfer);
            ctx.directives.transfer = Some(TransferDirective { target: target.to_string() });
            ctx.directives.hangup = true;
            ctx.emit(
                TurnEventType::S4BOwnerSelected,
                serde_json::json!({ "owner": format!("{:?}", Owner::Transfer) }),
            );
            return TurnResponse {
                text: "One moment, I'll get you someone who can help.".to_string(),
                audio_url: None,
            };
        }

        // GREET.
        if let Some(text) = greeting::intercept(&ctx.selected_text, ctx.state.greeted_this_call, &tenant.greeting) {
            let text = text.to_string();
            ctx.emit(TurnEventType::GreetingIntercepted, serde_json::json!({ "text": text }));
            ctx.state.greeted_this_call = true;
            ctx.state.last_owner = Some(Owner::Greeting);
            ctx.state.last_response = Some(text.clone());
            ctx.emit(
                TurnEventType::S4BOwnerSelected,
                serde_json::json!({ "owner": format!("{:?}", Owner::Greeting) }),
            );
            return TurnResponse { text, audio_url: None };
        }
        ctx.state.greeted_this_call = true;

        let asking_slot = current_asking_slot(&ctx.state, tenant);

        // S3 Slot Extraction.
        let hints = extract_entities(&ctx.selected_text);
        let extracted = extract_slots(&ctx.normalized, &hints, tenant);
        ctx.emit(
            TurnEventType::S3SlotExtraction,
            serde_json::json!({ "slots_found": extracted.len() }),
        );
        let extracted_ids: Vec<String> = extracted.keys().map(|k| k.as_str().to_string()).collect();
        frontdesk_text::apply_extracted_slots(&mut ctx.state, extracted, ctx.state.turn_index);
        ctx.emit(
            TurnEventType::S3PendingSlotsStored,
            serde_json::json!({ "slot_ids": extracted_ids }),
        );

        // S3.5 Detection Trigger Engine.
        let signals = triggers::detect(&ctx.selected_text, tenant);
        if signals.describing_problem.matched {
            ctx.emit(TurnEventType::S3_5DescribingProblemDetected, serde_json::json!({ "pattern": signals.describing_problem.pattern }));
        }
        if signals.trust_concern.matched {
            ctx.emit(TurnEventType::S3_5TrustConcernDetected, serde_json::json!({ "pattern": signals.trust_concern.pattern }));
        }
        if signals.caller_feels_ignored.matched {
            ctx.emit(TurnEventType::S3_5CallerFeelsIgnoredDetected, serde_json::json!({ "pattern": signals.caller_feels_ignored.pattern }));
        }
        if signals.refused_slot.matched {
            ctx.emit(TurnEventType::S3_5RefusedSlotDetected, serde_json::json!({ "pattern": signals.refused_slot.pattern, "slot": asking_slot.as_ref().map(|s| s.as_str().to_string()) }));
        }
        triggers::apply_refused_slot(&mut ctx.state, &signals, asking_slot.as_ref());

        // S4A-1 Triage Signal Router.
        let scenarios = match self.matcher_registry.scenarios(&ctx.tenant_id) {
            Ok(s) => s,
            Err(err) => {
                ctx.emit(TurnEventType::ScenarioMatchError, serde_json::json!({ "error": err.to_string() }));
                Arc::new(Vec::new())
            }
        };
        let allowed_types = &tenant.discovery.auto_reply_allowed_scenario_types;
        let cards: Vec<Scenario> = scenarios
            .iter()
            .filter(|s| allowed_types.contains(&s.scenario_type))
            .cloned()
            .collect();
        let symptoms = if signals.describing_problem.matched {
            signals.describing_problem.pattern.clone().into_iter().collect()
        } else {
            Vec::new()
        };
        let triage_out = triage::run_triage(&ctx.selected_text, hints.urgency.unwrap_or(frontdesk_text::Urgency::Normal), symptoms, tenant, &cards);
        ctx.emit(
            TurnEventType::S4A1TriageSignals,
            serde_json::json!({ "attempted": triage_out.attempted, "confidence": triage_out.confidence }),
        );
        if triage_out.attempted && !triage_out.call_reason_detail.is_empty() {
            let turn_index = ctx.state.turn_index;
            ctx.state.set_pending_slot(
                SlotId::from("call_reason_detail"),
                triage_out.call_reason_detail.clone(),
                SlotSource::Triage,
                turn_index,
            );
        }

        // S4A-2 Scenario Match, under the wall-clock circuit breaker.
        let matched = self.run_s4a2(ctx, tenant, allowed_types).await;

        // S4B Discovery Owner Selected.
        let (owner, body, _owner_slot) = select_owner(&mut ctx.state, tenant, matched.as_ref(), ctx.channel, &ctx.selected_text);
        ctx.emit(
            TurnEventType::S4BOwnerSelected,
            serde_json::json!({ "owner": format!("{:?}", owner) }),
        );
        ctx.state.last_owner = Some(owner);

        // S5 Consent Gate.
        let consent_outcome = consent::run(&mut ctx.state, &ctx.selected_text);
        ctx.emit(
            TurnEventType::S5ConsentGate,
            serde_json::json!({ "advanced": consent_outcome.advanced, "trigger": consent_outcome.trigger.map(|t| format!("{:?}", t)) }),
        );

        // S6 Response.
        let suppress_opener = matches!(owner, Owner::Transfer | Owner::Greeting) || ctx.state.lane == Lane::Terminated;
        let text = opener::apply(&mut ctx.state, tenant, &body, suppress_opener);
        ctx.state.last_response = Some(text.clone());
        ctx.emit(TurnEventType::S6Response, serde_json::json!({ "text": text }));

        TurnResponse { text, audio_url: None }
    }

    async fn run_s4a2(
        &self,
        ctx: &mut TurnContext,
        tenant: &TenantConfig,
        allowed_types: &[ScenarioType],
    ) -> Option<Scenario> {
        let matcher = match self.matcher_registry.resolve(&ctx.tenant_id) {
            Ok(matcher) => matcher,
            Err(err) => {
                ctx.emit(TurnEventType::ScenarioMatchError, serde_json::json!({ "error": err.to_string() }));
                return None;
            }
        };

        let options = MatchOptions {
            allow_tier3: self.tier3_fallback_enabled && tenant.experimental_s4a,
            tier3_timeout: Some(self.tier3_timeout),
        };

        let hit = match tokio::time::timeout(
            self.s4a_budget,
            matcher.match_scenario(&ctx.selected_text, self.default_min_confidence, allowed_types, &options),
        )
        .await
        {
            Ok(hit) => hit,
            Err(_) => {
                ctx.emit(TurnEventType::S4ATimedOut, serde_json::json!({}));
                None
            }
        };

        match &hit {
            Some(hit) => ctx.emit(
                TurnEventType::S4A2ScenarioMatch,
                serde_json::json!({ "scenario_id": hit.scenario_id.as_str(), "score": hit.score, "tier": format!("{:?}", hit.tier) }),
            ),
            None => ctx.emit(TurnEventType::S4A2ScenarioMatch, serde_json::json!({ "scenario_id": null })),
        }

        let hit = hit?;
        self.matcher_registry.scenario(&ctx.tenant_id, &hit.scenario_id)
    }
}

/// Reconstructs which slot, if any, the previous turn was asking for --
/// used to let S3.5's `refusedSlot` trigger mark the right slot refused
/// (spec §4.5 open question: the asking slot is whatever the last owner's
/// flow step pointed at, not re-derived from this turn's text).
fn current_asking_slot(state: &CallState, tenant: &TenantConfig) -> Option<SlotId> {
    match state.last_owner {
        Some(Owner::DiscoveryFlow) => tenant
            .discovery_flow
            .steps
            .get(state.discovery.current_step_index)
            .map(|s| s.slot_id.clone()),
        Some(Owner::BookingFlow) => tenant
            .booking_flow
            .steps
            .get(state.booking.current_step_index)
            .map(|s| s.slot_id.clone()),
        _ => None,
    }
}

/// S4B: picks who owns this turn's response body. Booking takes priority
/// once the lane has advanced; otherwise a qualifying scenario match wins,
/// falling through to the Discovery Flow Runner's next open question.
fn select_owner(
    state: &mut CallState,
    tenant: &TenantConfig,
    matched: Option<&Scenario>,
    channel: Channel,
    normalized_text: &str,
) -> (Owner, String, Option<SlotId>) {
    if state.lane == Lane::Booking {
        return match booking::run(state, tenant, normalized_text) {
            BookingOutcome::Confirm { slot_id, prompt } => (Owner::BookingFlow, prompt, Some(slot_id)),
            BookingOutcome::Ask { slot_id, prompt } => (Owner::BookingFlow, prompt, Some(slot_id)),
            BookingOutcome::Completed => (
                Owner::BookingFlow,
                "You're all set, thanks for calling -- we'll see you then.".to_string(),
                None,
            ),
            BookingOutcome::Idle => (Owner::BookingFlow, "Is there anything else I can help with?".to_string(), None),
        };
    }

    if !tenant.discovery.disable_scenario_auto_responses {
        if let Some(scenario) = matched {
            if tenant.discovery.auto_reply_allowed_scenario_types.contains(&scenario.scenario_type) {
                if let Some(text) = select_reply(scenario, channel) {
                    return (Owner::TriageScenario, text, None);
                }
            }
        }
    }

    match discovery::run(state, tenant) {
        Some(prompt) => (Owner::DiscoveryFlow, prompt.prompt, Some(prompt.slot_id)),
        None => (Owner::DiscoveryFlow, "Is there anything else I can help with?".to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_config::ConfigResolver;
    use frontdesk_core::{CallId, TenantId};
    use frontdesk_store::{CallLockTable, InMemoryEventJournal, InMemoryStateStore};
    use std::sync::Arc;

    fn orchestrator(tmp: &std::path::Path) -> Orchestrator {
        let config_resolver = Arc::new(ConfigResolver::new(tmp));
        let scenario_resolver = Arc::new(frontdesk_config::ScenarioResolver::new(tmp));
        let registry = Arc::new(MatcherRegistry::new(scenario_resolver, None));
        Orchestrator::new(
            config_resolver,
            registry,
            Arc::new(InMemoryStateStore::new()),
            Arc::new(InMemoryEventJournal::new()),
            Arc::new(CallLockTable::new()),
            0.6,
            false,
            Duration::from_millis(500),
        )
    }

    fn request(call_id: &str, text: &str) -> TurnRequest {
        TurnRequest {
            tenant_id: TenantId::from("acme"),
            call_id: CallId::from(call_id),
            turn_index: None,
            transcript: text.to_string(),
            stt_confidence: 0.95,
            channel: Channel::Voice,
            metadata: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn greeting_only_turn_is_intercepted() {
        let dir = tempfile_dir();
        let orchestrator = orchestrator(dir.path());
        let outcome = orchestrator.run_turn(request("call-1", "hello")).await;
        assert!(outcome.response.text.contains("calling"));
    }

    #[tokio::test]
    async fn low_confidence_turn_asks_for_clarification() {
        let dir = tempfile_dir();
        let orchestrator = orchestrator(dir.path());
        let mut req = request("call-2", "i need a plumber");
        req.stt_confidence = 0.1;
        let outcome = orchestrator.run_turn(req).await;
        assert!(outcome.response.text.to_lowercase().contains("unclear"));
    }

    #[tokio::test]
    async fn escalation_phrase_transfers() {
        let dir = tempfile_dir();
        let orchestrator = orchestrator(dir.path());
        let outcome = orchestrator.run_turn(request("call-3", "get me a human right now")).await;
        assert!(outcome.directives.transfer.is_some());
        assert!(outcome.directives.hangup);
    }

    #[tokio::test]
    async fn content_bearing_first_turn_falls_through_to_discovery() {
        let dir = tempfile_dir();
        let orchestrator = orchestrator(dir.path());
        let outcome = orchestrator.run_turn(request("call-4", "hi my heater is broken")).await;
        assert_eq!(outcome.state.lane, Lane::Discovery);
    }

    #[tokio::test]
    async fn greeting_only_turn_still_emits_mandatory_owner_event() {
        let dir = tempfile_dir();
        let orchestrator = orchestrator(dir.path());
        let outcome = orchestrator.run_turn(request("call-5", "hello")).await;
        let owner_events: Vec<_> =
            outcome.events.iter().filter(|e| e.event_type == TurnEventType::S4BOwnerSelected).collect();
        assert_eq!(owner_events.len(), 1, "exactly one S4BOwnerSelected event per turn");
        assert_eq!(owner_events[0].data["owner"], "Greeting");
    }

    #[tokio::test]
    async fn escalation_turn_still_emits_mandatory_owner_event() {
        let dir = tempfile_dir();
        let orchestrator = orchestrator(dir.path());
        let outcome = orchestrator.run_turn(request("call-6", "get me a human right now")).await;
        let owner_events: Vec<_> =
            outcome.events.iter().filter(|e| e.event_type == TurnEventType::S4BOwnerSelected).collect();
        assert_eq!(owner_events.len(), 1, "exactly one S4BOwnerSelected event per turn");
        assert_eq!(owner_events[0].data["owner"], "Transfer");
    }

    #[tokio::test]
    async fn connection_quality_short_circuit_still_emits_mandatory_owner_event_and_journals() {
        let dir = tempfile_dir();
        let orchestrator = orchestrator(dir.path());
        let mut req = request("call-7", "i need a plumber");
        req.stt_confidence = 0.1;
        let outcome = orchestrator.run_turn(req).await;
        let owner_events: Vec<_> =
            outcome.events.iter().filter(|e| e.event_type == TurnEventType::S4BOwnerSelected).collect();
        assert_eq!(owner_events.len(), 1, "S1.5 short-circuit must not skip the proof event");
        assert_eq!(owner_events[0].data["owner"], "DiscoveryFlow");
    }

    #[tokio::test]
    async fn triage_stores_call_reason_detail_in_pending_slots() {
        let dir = tempfile_dir();
        let tenant_path = dir.path().join("acme.json");
        std::fs::write(&tenant_path, r#"{"triage": {"enabled": true}}"#).unwrap();
        let orchestrator = orchestrator(dir.path());
        let outcome = orchestrator.run_turn(request("call-8", "AC is down")).await;
        let slot_id = SlotId::from("call_reason_detail");
        assert_eq!(outcome.state.pending_slots.get(&slot_id).map(String::as_str), Some("ac is down"));
    }

    fn tempfile_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }
}
