//! Text Normalizer (spec §4.1, C1). Deterministic, idempotent, pure: same
//! input and tenant vocabulary always produce the same output, and
//! normalizing already-normalized text is a no-op.

use frontdesk_core::TenantConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Platform-default filler words, merged with tenant-provided ones. Kept
/// separate from [`frontdesk_config::defaults`] since this crate has no
/// dependency on the config crate — normalization only needs the resolved
/// tenant config the caller already has in hand.
const PLATFORM_FILLERS: &[&str] = &["um", "uh", "like", "you know", "i mean", "kind of"];

/// Default shorthand-to-canonical-form substitutions (spec §4.1c). Applied
/// before tenant synonyms so a tenant synonym can still match the
/// canonical form.
static SHORTHAND: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("a/c", "air conditioning"),
        ("ac", "air conditioning"),
        ("hvac", "heating and cooling"),
        ("asap", "as soon as possible"),
        ("apt", "apartment"),
    ])
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,.!?;:]").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedText {
    pub original: String,
    /// Final text after filler removal, vocabulary expansion, and synonym
    /// mapping. What every downstream component reads.
    pub normalized: String,
    /// Parallel view retaining both the original and expanded form of each
    /// ambiguous substitution (spec §4.1 edge policy), used only by the
    /// matcher to avoid losing a trigger phrase to an over-eager expansion.
    pub expanded: String,
}

pub fn normalize(text: &str, tenant: &TenantConfig) -> NormalizedText {
    let lowered = lowercase_and_collapse(text);
    let defilled = remove_fillers(&lowered, &tenant.vocabulary.fillers);
    let (expanded, substituted) = expand_vocabulary(&defilled);
    let final_text = apply_synonyms(&substituted, &tenant.vocabulary.synonyms);

    NormalizedText {
        original: text.to_string(),
        normalized: final_text,
        expanded,
    }
}

fn lowercase_and_collapse(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let stripped = PUNCTUATION.replace_all(&lowered, "");
    WHITESPACE.replace_all(stripped.trim(), " ").into_owned()
}

fn remove_fillers(text: &str, tenant_fillers: &[String]) -> String {
    let tokens: Vec<&str> = text.split(' ').collect();
    let is_filler = |tok: &str| {
        PLATFORM_FILLERS.contains(&tok) || tenant_fillers.iter().any(|f| f == tok)
    };
    let kept: Vec<&str> = tokens.into_iter().filter(|t| !is_filler(t)).collect();
    if kept.is_empty() {
        // Never drop content-bearing tokens: an all-filler utterance keeps
        // its original text rather than collapsing to nothing.
        text.to_string()
    } else {
        kept.join(" ")
    }
}

/// Returns `(expanded_view, substituted_text)`. `substituted_text` has every
/// shorthand fully replaced; `expanded_view` keeps both forms side by side.
fn expand_vocabulary(text: &str) -> (String, String) {
    let mut expanded_tokens = Vec::new();
    let mut substituted_tokens = Vec::new();

    for token in text.split(' ') {
        match SHORTHAND.get(token) {
            Some(canonical) => {
                expanded_tokens.push(format!("{} ({})", token, canonical));
                substituted_tokens.push((*canonical).to_string());
            }
            None => {
                expanded_tokens.push(token.to_string());
                substituted_tokens.push(token.to_string());
            }
        }
    }

    (expanded_tokens.join(" "), substituted_tokens.join(" "))
}

fn apply_synonyms(text: &str, synonyms: &BTreeMap<String, String>) -> String {
    if synonyms.is_empty() {
        return text.to_string();
    }
    text.split(' ')
        .map(|tok| synonyms.get(tok).map(|s| s.as_str()).unwrap_or(tok))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant() -> TenantConfig {
        TenantConfig::default()
    }

    #[test]
    fn lowercases_and_collapses_whitespace() {
        let out = normalize("  Hello   World  ", &tenant());
        assert_eq!(out.normalized, "hello world");
    }

    #[test]
    fn removes_fillers_without_dropping_content() {
        let out = normalize("um, the heater is broken", &tenant());
        assert_eq!(out.normalized, "the heater is broken");
    }

    #[test]
    fn all_filler_utterance_is_preserved() {
        let out = normalize("um uh like", &tenant());
        assert_eq!(out.normalized, "um uh like");
    }

    #[test]
    fn expands_shorthand_and_keeps_expanded_view() {
        let out = normalize("the a/c is broken", &tenant());
        assert!(out.normalized.contains("air conditioning"));
        assert!(out.expanded.contains("a/c (air conditioning)"));
    }

    #[test]
    fn applies_tenant_synonyms_after_expansion() {
        let mut tenant = tenant();
        tenant
            .vocabulary
            .synonyms
            .insert("broken".to_string(), "not working".to_string());
        let out = normalize("the heater is broken", &tenant);
        assert!(out.normalized.contains("not working"));
    }

    #[test]
    fn is_idempotent() {
        let tenant = tenant();
        let once = normalize("The A/C is Broken!", &tenant);
        let twice = normalize(&once.normalized, &tenant);
        assert_eq!(once.normalized, twice.normalized);
    }
}
