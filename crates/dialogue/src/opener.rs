//! Opener Engine (spec §4.9, C9). Picks a weighted-random micro-ack
//! ("Alright.", "Got it.") from `tenant.openers` to prefix a turn response.
//! Never applied to terminal or transfer responses.

use frontdesk_core::{CallState, TenantConfig};
use rand::Rng;

/// Picks an opener, avoiding `state.last_opener` when the pool has more
/// than one candidate (spec §4.9 anti-repetition guard). Returns `None`
/// for an empty pool.
pub fn pick(state: &mut CallState, tenant: &TenantConfig) -> Option<String> {
    let pool: Vec<&String> = tenant
        .openers
        .iter()
        .filter(|o| tenant.openers.len() == 1 || Some(o.as_str()) != state.last_opener.as_deref())
        .collect();

    if pool.is_empty() {
        return None;
    }

    let mut rng = rand::thread_rng();
    let index = rng.gen_range(0..pool.len());
    let chosen = pool[index].clone();
    state.last_opener = Some(chosen.clone());
    Some(chosen)
}

/// Applies an opener as a prefix, unless `suppress` is set (terminal or
/// transfer turns never get one).
pub fn apply(state: &mut CallState, tenant: &TenantConfig, body: &str, suppress: bool) -> String {
    if suppress {
        return body.to_string();
    }
    match pick(state, tenant) {
        Some(opener) => format!("{} {}", opener, body),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::{CallId, TenantId};

    fn state() -> CallState {
        CallState::new(CallId::from("call-1"), TenantId::from("tenant-1"))
    }

    #[test]
    fn single_opener_pool_reuses_the_same_opener() {
        let mut tenant = TenantConfig::default();
        tenant.openers = vec!["Alright.".to_string()];
        let mut s = state();
        s.last_opener = Some("Alright.".to_string());
        let picked = pick(&mut s, &tenant).unwrap();
        assert_eq!(picked, "Alright.");
    }

    #[test]
    fn multi_opener_pool_avoids_immediate_repeat() {
        let mut tenant = TenantConfig::default();
        tenant.openers = vec!["Alright.".to_string(), "Got it.".to_string()];
        let mut s = state();
        s.last_opener = Some("Alright.".to_string());
        for _ in 0..20 {
            let picked = pick(&mut s, &tenant).unwrap();
            assert_ne!(picked, "Alright.");
            s.last_opener = Some("Alright.".to_string());
        }
    }

    #[test]
    fn empty_pool_yields_no_opener() {
        let mut tenant = TenantConfig::default();
        tenant.openers = vec![];
        let mut s = state();
        assert!(pick(&mut s, &tenant).is_none());
    }

    #[test]
    fn suppressed_terminal_response_has_no_opener_prefix() {
        let mut tenant = TenantConfig::default();
        tenant.openers = vec!["Alright.".to_string()];
        let mut s = state();
        let text = apply(&mut s, &tenant, "Goodbye.", true);
        assert_eq!(text, "Goodbye.");
    }

    #[test]
    fn non_suppressed_response_gets_an_opener_prefix() {
        let mut tenant = TenantConfig::default();
        tenant.openers = vec!["Alright.".to_string()];
        let mut s = state();
        let text = apply(&mut s, &tenant, "Your appointment is confirmed.", false);
        assert_eq!(text, "Alright. Your appointment is confirmed.");
    }
}
