//! Slot Registry & Extractor (spec §4.2, C2).
//!
//! Extractors are a closed set dispatched by name (spec §9: no open class
//! hierarchy for extensible behavior) rather than a trait-object registry.
//! A tenant's `SlotDefinition.extractors` names, in order, which of these to
//! try; the first one to produce a value wins.

use crate::entities::EntityHints;
use crate::normalizer::NormalizedText;
use frontdesk_core::{CallState, SlotId, SlotSource, TenantConfig};
use std::collections::HashMap;

/// A value an extractor produced, with provenance (spec §4.2, consumed by
/// the Discovery/Booking Flow Runners to decide confirmation behavior).
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedSlot {
    pub value: String,
    pub source: SlotSource,
}

/// Named extractor kinds a `SlotDefinition` may reference. Unknown names are
/// skipped, not an error — a tenant typo in config should degrade to "slot
/// not extracted this turn," never crash the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractorKind {
    FirstName,
    LastName,
    Phone,
    Address,
    ServiceType,
    Verbatim,
}

fn parse_extractor_name(name: &str) -> Option<ExtractorKind> {
    match name {
        "first_name" => Some(ExtractorKind::FirstName),
        "last_name" => Some(ExtractorKind::LastName),
        "phone" => Some(ExtractorKind::Phone),
        "address" => Some(ExtractorKind::Address),
        "service_type" => Some(ExtractorKind::ServiceType),
        "verbatim" => Some(ExtractorKind::Verbatim),
        _ => None,
    }
}

/// Runs one named extractor. Side-effect-free: reads only its arguments,
/// returns `None` rather than a malformed value on uncertainty.
fn run_extractor(
    kind: ExtractorKind,
    normalized: &NormalizedText,
    hints: &EntityHints,
) -> Option<String> {
    match kind {
        ExtractorKind::FirstName => hints.first_name.clone(),
        ExtractorKind::LastName => hints.last_name.clone(),
        ExtractorKind::Phone => hints.phone_e164.clone(),
        ExtractorKind::Address => hints.address_fragments.first().cloned(),
        ExtractorKind::ServiceType => hints.service_type.clone(),
        ExtractorKind::Verbatim => {
            let trimmed = normalized.normalized.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
    }
}

/// Runs every configured slot's extractor chain over one turn's normalized
/// text. Returns only slots that produced a value; callers decide whether
/// and how to write these into [`CallState`] (spec §4.6/§4.7: a fresh
/// extraction never overwrites an already-confirmed slot).
pub fn extract_slots(
    normalized: &NormalizedText,
    hints: &EntityHints,
    tenant: &TenantConfig,
) -> HashMap<SlotId, ExtractedSlot> {
    let mut out = HashMap::new();

    for (slot_id_str, definition) in &tenant.slots {
        let slot_id = SlotId::from(slot_id_str.as_str());
        for extractor_name in &definition.extractors {
            let Some(kind) = parse_extractor_name(extractor_name) else {
                continue;
            };
            if let Some(value) = run_extractor(kind, normalized, hints) {
                out.insert(
                    slot_id.clone(),
                    ExtractedSlot {
                        value,
                        source: SlotSource::Extraction,
                    },
                );
                break;
            }
        }
    }

    out
}

/// Writes extracted slots into call state, respecting the "never downgrade
/// a confirmed slot" rule enforced by [`CallState::set_pending_slot`].
pub fn apply_extracted_slots(
    state: &mut CallState,
    extracted: HashMap<SlotId, ExtractedSlot>,
    turn: u64,
) {
    for (slot_id, extracted) in extracted {
        state.set_pending_slot(slot_id, extracted.value, extracted.source, turn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use frontdesk_core::{CallId, ConfirmMode, SlotDefinition, SlotType, TenantId};

    fn tenant_with_slots() -> TenantConfig {
        let mut tenant = TenantConfig::default();
        tenant.slots.insert(
            "caller_phone".to_string(),
            SlotDefinition {
                id: SlotId::from("caller_phone"),
                slot_type: SlotType::Phone,
                required: true,
                confirm_mode: ConfirmMode::AllowPending,
                extractors: vec!["phone".to_string()],
            },
        );
        tenant
    }

    #[test]
    fn extracts_configured_slot() {
        let tenant = tenant_with_slots();
        let normalized = normalize("call me back at 415-555-0134", &tenant);
        let hints = crate::entities::extract_entities(&normalized.normalized);
        let extracted = extract_slots(&normalized, &hints, &tenant);
        assert_eq!(
            extracted.get(&SlotId::from("caller_phone")).map(|e| e.value.as_str()),
            Some("+14155550134")
        );
    }

    #[test]
    fn unknown_extractor_name_is_skipped_not_an_error() {
        let mut tenant = TenantConfig::default();
        tenant.slots.insert(
            "mystery".to_string(),
            SlotDefinition {
                id: SlotId::from("mystery"),
                slot_type: SlotType::Text,
                required: false,
                confirm_mode: ConfirmMode::AllowPending,
                extractors: vec!["not_a_real_extractor".to_string()],
            },
        );
        let normalized = normalize("hello", &tenant);
        let hints = crate::entities::extract_entities(&normalized.normalized);
        let extracted = extract_slots(&normalized, &hints, &tenant);
        assert!(extracted.get(&SlotId::from("mystery")).is_none());
    }

    #[test]
    fn extraction_never_downgrades_a_confirmed_slot() {
        let mut state = CallState::new(CallId::from("call-1"), TenantId::from("tenant-1"));
        let slot = SlotId::from("caller_phone");
        state.set_pending_slot(slot.clone(), "+14155550134", SlotSource::Extraction, 1);
        state.confirm_slot(&slot).unwrap();

        let mut extracted = HashMap::new();
        extracted.insert(
            slot.clone(),
            ExtractedSlot {
                value: "+19995550000".to_string(),
                source: SlotSource::Extraction,
            },
        );
        apply_extracted_slots(&mut state, extracted, 2);

        assert_eq!(state.confirmed_slots.get(&slot).unwrap(), "+14155550134");
        assert!(!state.pending_slots.contains_key(&slot));
    }
}
