//! Greeting Intercept (spec §4.10 GREET). Resolved open question (spec §9):
//! greeting short-circuits only on a pure greeting utterance with no other
//! content -- not merely because it's the call's first turn. A first turn
//! that already carries a request ("hi, my heater is broken") falls through
//! to slot extraction instead of being swallowed by a canned greeting.

use frontdesk_core::GreetingConfig;

/// A small tail allowance so "hi there" / "hello there" still count as
/// greeting-only without requiring an exact phrase match.
const GREETING_TAILS: &[&str] = &["there", "guys", "everyone"];

fn is_greeting_only(normalized_text: &str, phrases: &[String]) -> bool {
    let trimmed = normalized_text.trim();
    if phrases.iter().any(|p| p == trimmed) {
        return true;
    }
    phrases.iter().any(|p| {
        trimmed
            .strip_prefix(p.as_str())
            .map(|rest| {
                let rest = rest.trim();
                rest.is_empty() || GREETING_TAILS.contains(&rest)
            })
            .unwrap_or(false)
    })
}

/// `Some(greeting_text)` fires the intercept this turn.
pub fn intercept(normalized_text: &str, already_greeted: bool, config: &GreetingConfig) -> Option<&str> {
    if already_greeted {
        return None;
    }
    is_greeting_only(normalized_text, &config.greeting_only_phrases).then_some(config.greeting_text.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_greeting_intercepts() {
        let config = GreetingConfig::default();
        assert!(intercept("hello", false, &config).is_some());
    }

    #[test]
    fn greeting_with_tail_still_intercepts() {
        let config = GreetingConfig::default();
        assert!(intercept("hi there", false, &config).is_some());
    }

    #[test]
    fn greeting_with_real_content_does_not_intercept() {
        let config = GreetingConfig::default();
        assert!(intercept("hi my heater is broken", false, &config).is_none());
    }

    #[test]
    fn already_greeted_never_intercepts_again() {
        let config = GreetingConfig::default();
        assert!(intercept("hello", true, &config).is_none());
    }
}
