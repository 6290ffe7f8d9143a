//! Connection Quality Gate (spec §4.10 S1.5). Below-threshold STT confidence
//! or a trouble phrase short-circuits the turn with a clarification prompt
//! rather than running the rest of the pipeline against a garbled
//! transcript.

use frontdesk_core::ConnectionQualityConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityIssue {
    LowConfidence,
    TroublePhrase(String),
}

/// `Some` means the gate should fire this turn; the caller short-circuits
/// with `config.clarification_prompt`.
pub fn check(normalized_text: &str, stt_confidence: f32, config: &ConnectionQualityConfig) -> Option<QualityIssue> {
    if stt_confidence < config.min_stt_confidence {
        return Some(QualityIssue::LowConfidence);
    }
    config
        .trouble_phrases
        .iter()
        .find(|p| normalized_text.contains(p.as_str()))
        .map(|p| QualityIssue::TroublePhrase(p.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_confidence_fires_the_gate() {
        let config = ConnectionQualityConfig::default();
        let issue = check("i need a plumber", 0.1, &config);
        assert_eq!(issue, Some(QualityIssue::LowConfidence));
    }

    #[test]
    fn trouble_phrase_fires_the_gate() {
        let config = ConnectionQualityConfig::default();
        let issue = check("sorry, you're breaking up", 0.9, &config);
        assert_eq!(issue, Some(QualityIssue::TroublePhrase("you're breaking up".to_string())));
    }

    #[test]
    fn clean_turn_passes() {
        let config = ConnectionQualityConfig::default();
        assert!(check("i need a plumber", 0.9, &config).is_none());
    }
}
