//! Scenario reply selection (spec §4.10 S6, §9 "Reply text selection within
//! a scenario is weighted-random over quickReplies/fullReplies per
//! replyStrategy; for voice channels, if both exist, fullReplies are
//! strongly preferred"). Matching itself (C3) is never randomized; only the
//! final wording is.

use frontdesk_core::{Channel, ReplyStrategy, Scenario, WeightedReply};
use rand::Rng;

fn weighted_pick(replies: &[WeightedReply]) -> Option<&str> {
    if replies.is_empty() {
        return None;
    }
    let total: f32 = replies.iter().map(|r| r.weight.max(0.0)).sum();
    if total <= 0.0 {
        return replies.first().map(|r| r.text.as_str());
    }
    let mut roll = rand::thread_rng().gen_range(0.0..total);
    for reply in replies {
        roll -= reply.weight.max(0.0);
        if roll <= 0.0 {
            return Some(reply.text.as_str());
        }
    }
    replies.last().map(|r| r.text.as_str())
}

/// Picks the reply text a matched scenario should speak this turn. `None`
/// only when `replyStrategy` names a reply list the scenario declared empty
/// (a scenario with both lists empty fails [`Scenario::validate`] and can
/// never reach matching, so this is effectively unreachable in practice).
pub fn select_reply(scenario: &Scenario, channel: Channel) -> Option<String> {
    let quick = &scenario.quick_replies;
    let full = &scenario.full_replies;

    let chosen = match scenario.reply_strategy {
        ReplyStrategy::QuickOnly => weighted_pick(quick),
        ReplyStrategy::FullOnly => weighted_pick(full),
        ReplyStrategy::QuickThenFull => weighted_pick(quick).or_else(|| weighted_pick(full)),
        // LLM-paraphrased wrapping is out of the real-time turn budget (spec
        // §5 T_turn <= 500ms for non-Tier-3 paths); fall back to the same
        // channel-aware selection Auto uses.
        ReplyStrategy::Auto | ReplyStrategy::LlmWrap => {
            if channel == Channel::Voice && !full.is_empty() {
                weighted_pick(full)
            } else {
                weighted_pick(quick).or_else(|| weighted_pick(full))
            }
        }
    };

    chosen.map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::{FollowUp, ScenarioId, ScenarioType};

    fn scenario(strategy: ReplyStrategy, quick: Vec<&str>, full: Vec<&str>) -> Scenario {
        Scenario {
            id: ScenarioId::from("s"),
            scenario_type: ScenarioType::Faq,
            triggers: vec![],
            negative_triggers: vec![],
            min_confidence: 0.5,
            reply_strategy: strategy,
            quick_replies: quick.into_iter().map(|t| WeightedReply { text: t.into(), weight: 1.0 }).collect(),
            full_replies: full.into_iter().map(|t| WeightedReply { text: t.into(), weight: 1.0 }).collect(),
            follow_up: FollowUp::default(),
            priority: 0,
            declaration_order: 0,
            audio_url: None,
        }
    }

    #[test]
    fn quick_only_never_picks_full() {
        let s = scenario(ReplyStrategy::QuickOnly, vec!["q1", "q2"], vec!["f1"]);
        for _ in 0..20 {
            let picked = select_reply(&s, Channel::Chat).unwrap();
            assert!(picked == "q1" || picked == "q2");
        }
    }

    #[test]
    fn voice_channel_prefers_full_when_both_present() {
        let s = scenario(ReplyStrategy::Auto, vec!["q1"], vec!["f1"]);
        for _ in 0..20 {
            assert_eq!(select_reply(&s, Channel::Voice).unwrap(), "f1");
        }
    }

    #[test]
    fn chat_channel_prefers_quick_when_both_present() {
        let s = scenario(ReplyStrategy::Auto, vec!["q1"], vec!["f1"]);
        for _ in 0..20 {
            assert_eq!(select_reply(&s, Channel::Chat).unwrap(), "q1");
        }
    }

    #[test]
    fn full_only_falls_through_to_full_list() {
        let s = scenario(ReplyStrategy::FullOnly, vec!["q1"], vec!["f1", "f2"]);
        let picked = select_reply(&s, Channel::Chat).unwrap();
        assert!(picked == "f1" || picked == "f2");
    }

    #[test]
    fn empty_declared_list_for_strategy_falls_back() {
        let s = scenario(ReplyStrategy::QuickOnly, vec![], vec!["f1"]);
        assert!(select_reply(&s, Channel::Chat).is_none());
    }
}
