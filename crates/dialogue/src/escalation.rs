//! Escalation Detection (spec §4.10 S2.5). Hard-stop phrases that always
//! transfer to a human, independent of lane or scenario match.

use frontdesk_core::EscalationConfig;

/// Returns the configured transfer target on a hard-stop phrase match.
pub fn detect<'a>(normalized_text: &str, config: &'a EscalationConfig) -> Option<&'a str> {
    config
        .hard_stop_phrases
        .iter()
        .any(|p| normalized_text.contains(p.as_str()))
        .then_some(config.transfer_target.as_str())
}
