//! Platform defaults overlaid under every tenant's configuration (spec §3,
//! §9 "Configuration layering").

use frontdesk_core::{DetectionTriggersConfig, PatternSet, TenantConfig, VocabularyConfig};

/// The configuration a tenant gets before any override is applied. Tenant
/// files only need to declare what differs from this.
pub fn platform_default() -> TenantConfig {
    TenantConfig {
        detection_triggers: default_detection_triggers(),
        vocabulary: default_vocabulary(),
        ..TenantConfig::default()
    }
}

fn default_detection_triggers() -> DetectionTriggersConfig {
    DetectionTriggersConfig {
        describing_problem: PatternSet {
            patterns: vec![
                "it's not working".to_string(),
                "it stopped working".to_string(),
                "broken".to_string(),
                "won't turn on".to_string(),
            ],
        },
        trust_concern: PatternSet {
            patterns: vec![
                "are you a bot".to_string(),
                "is this a robot".to_string(),
                "am i talking to a person".to_string(),
            ],
        },
        caller_feels_ignored: PatternSet {
            patterns: vec![
                "i already said".to_string(),
                "i just told you".to_string(),
                "you're not listening".to_string(),
            ],
        },
        refused_slot: PatternSet {
            patterns: vec![
                "i'd rather not say".to_string(),
                "i don't want to give".to_string(),
                "do i have to".to_string(),
            ],
        },
    }
}

fn default_vocabulary() -> VocabularyConfig {
    let mut synonyms = std::collections::BTreeMap::new();
    synonyms.insert("phone".to_string(), "phone number".to_string());
    synonyms.insert("cell".to_string(), "phone number".to_string());
    synonyms.insert("fix it".to_string(), "repair".to_string());
    synonyms.insert("schedule".to_string(), "book".to_string());

    VocabularyConfig {
        synonyms,
        fillers: vec![
            "um".to_string(),
            "uh".to_string(),
            "like".to_string(),
            "you know".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_default_has_nonempty_triggers() {
        let cfg = platform_default();
        assert!(!cfg.detection_triggers.describing_problem.patterns.is_empty());
        assert!(!cfg.detection_triggers.refused_slot.patterns.is_empty());
    }

    #[test]
    fn platform_default_has_fillers_and_synonyms() {
        let cfg = platform_default();
        assert!(!cfg.vocabulary.fillers.is_empty());
        assert!(!cfg.vocabulary.synonyms.is_empty());
    }
}
