//! Rule-pattern entity extraction (spec §4.1). No probabilistic NER: every
//! hint is either confidently present or absent, never guessed.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Normal,
    Urgent,
    Emergency,
}

/// Entity hints produced by the normalizer and consumed by the slot
/// extractors (spec §4.1/§4.2). Absence of a field means "not found," never
/// a best-effort guess.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityHints {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// E.164 when normalization succeeds; absent (not malformed) otherwise.
    pub phone_e164: Option<String>,
    pub address_fragments: Vec<String>,
    pub urgency: Option<Urgency>,
    pub service_type: Option<String>,
}

static NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\b(?:my name is|i am|i'm|this is|call me)\s+([A-Z][a-zA-Z'-]+)(?:\s+([A-Z][a-zA-Z'-]+))?").unwrap(),
    ]
});

static PHONE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\+?1?[-.\s]?\(?(\d{3})\)?[-.\s]?(\d{3})[-.\s]?(\d{4})\b").unwrap(),
    ]
});

static ADDRESS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\b(\d+\s+[a-z0-9'.\s]{2,40}?\s+(?:street|st|avenue|ave|road|rd|drive|dr|lane|ln|boulevard|blvd|way|court|ct))\b").unwrap(),
        Regex::new(r"(?i)\b(apt\.?|apartment|unit|suite)\s*#?\s*(\w+)\b").unwrap(),
    ]
});

static URGENCY_PATTERNS: Lazy<Vec<(Regex, Urgency)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"(?i)\b(emergency|flooding|gas leak|fire|sparking|no heat and freezing)\b").unwrap(), Urgency::Emergency),
        (Regex::new(r"(?i)\b(urgent|asap|right away|as soon as possible|today please)\b").unwrap(), Urgency::Urgent),
    ]
});

static SERVICE_TYPE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"(?i)\b(repair|fix|broken|not working|stopped working)\b").unwrap(), "repair"),
        (Regex::new(r"(?i)\b(install|installation|new unit|replace)\b").unwrap(), "installation"),
        (Regex::new(r"(?i)\b(maintenance|tune[- ]?up|annual service|checkup)\b").unwrap(), "maintenance"),
        (Regex::new(r"(?i)\b(inspect|inspection|quote|estimate)\b").unwrap(), "inspection"),
    ]
});

/// Extracts entity hints from already-normalized text.
pub fn extract_entities(normalized: &str) -> EntityHints {
    EntityHints {
        first_name: extract_first_name(normalized),
        last_name: extract_last_name(normalized),
        phone_e164: extract_phone(normalized),
        address_fragments: extract_address_fragments(normalized),
        urgency: extract_urgency(normalized),
        service_type: extract_service_type(normalized),
    }
}

fn extract_first_name(text: &str) -> Option<String> {
    NAME_PATTERNS
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn extract_last_name(text: &str) -> Option<String> {
    NAME_PATTERNS
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Normalizes to E.164 assuming a North American Numbering Plan number when
/// no country code is present. Returns `None` rather than a malformed value
/// (spec §4.2) when the match does not carry exactly 10 digits.
fn extract_phone(text: &str) -> Option<String> {
    let caps = PHONE_PATTERNS.iter().find_map(|re| re.captures(text))?;
    let digits: String = (1..=3)
        .filter_map(|i| caps.get(i).map(|m| m.as_str()))
        .collect();
    if digits.len() == 10 {
        Some(format!("+1{}", digits))
    } else {
        None
    }
}

fn extract_address_fragments(text: &str) -> Vec<String> {
    ADDRESS_PATTERNS
        .iter()
        .filter_map(|re| re.captures(text))
        .map(|caps| caps.get(0).unwrap().as_str().trim().to_string())
        .collect()
}

fn extract_urgency(text: &str) -> Option<Urgency> {
    URGENCY_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, urgency)| *urgency)
}

fn extract_service_type(text: &str) -> Option<String> {
    SERVICE_TYPE_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, kind)| kind.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_name() {
        let hints = extract_entities("hi, my name is John Carter and my heater broke");
        assert_eq!(hints.first_name.as_deref(), Some("John"));
        assert_eq!(hints.last_name.as_deref(), Some("Carter"));
    }

    #[test]
    fn extracts_phone_to_e164() {
        let hints = extract_entities("you can reach me at 415-555-0134");
        assert_eq!(hints.phone_e164.as_deref(), Some("+14155550134"));
    }

    #[test]
    fn absent_phone_is_none_not_malformed() {
        let hints = extract_entities("call me whenever");
        assert!(hints.phone_e164.is_none());
    }

    #[test]
    fn extracts_emergency_urgency() {
        let hints = extract_entities("there's a gas leak, please hurry");
        assert_eq!(hints.urgency, Some(Urgency::Emergency));
    }

    #[test]
    fn extracts_service_type() {
        let hints = extract_entities("the AC stopped working yesterday");
        assert_eq!(hints.service_type.as_deref(), Some("repair"));
    }
}
