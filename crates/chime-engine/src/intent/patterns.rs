//! Regex-based intent classification.
//!
//! Rules are evaluated in order and the first match wins. When no rule
//! matches, a keyword containment pass picks a coarser intent.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Intent;

/// A single compiled regex linked to an intent.
pub struct IntentRule {
    pub regex: Regex,
    pub intent: Intent,
}

static INTENT_RULES: LazyLock<Vec<IntentRule>> = LazyLock::new(|| {
    let rules: [(&str, Intent); 5] = [
        (
            r"(?i)\b(set|start|create|make)\s+(a\s+)?(timer|countdown)",
            Intent::SetTimer,
        ),
        (
            r"(?i)\b(set|create|make)\s+(an?\s+)?(alarm|wake)",
            Intent::SetAlarm,
        ),
        (r"(?i)\b(cancel|stop|delete|remove|clear)", Intent::Cancel),
        (
            r"(?i)\b(list|show|display|what|check)\s+(timer|alarm)",
            Intent::List,
        ),
        (r"(?i)\b(cancel|stop|clear)\s+(all|everything)", Intent::CancelAll),
    ];

    rules
        .into_iter()
        .map(|(pat, intent)| IntentRule {
            regex: Regex::new(pat).expect("Invalid intent regex"),
            intent,
        })
        .collect()
});

const KEYWORD_FALLBACKS: &[(&[&str], Intent)] = &[
    (&["timer", "countdown"], Intent::SetTimer),
    (&["alarm", "wake"], Intent::SetAlarm),
    (&["cancel", "stop", "clear"], Intent::Cancel),
    (&["list", "show", "what"], Intent::List),
];

/// Classify a command into one of the fixed intents.
pub fn classify_intent(text: &str) -> Intent {
    if let Some(rule) = INTENT_RULES.iter().find(|rule| rule.regex.is_match(text)) {
        return rule.intent;
    }

    let lowered = text.to_lowercase();
    KEYWORD_FALLBACKS
        .iter()
        .find(|(words, _)| words.iter().any(|w| lowered.contains(w)))
        .map(|(_, intent)| *intent)
        .unwrap_or(Intent::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_timer_rule() {
        assert_eq!(classify_intent("set a timer for 5 minutes"), Intent::SetTimer);
        assert_eq!(classify_intent("start countdown 10 min"), Intent::SetTimer);
        assert_eq!(classify_intent("Create a Timer called pasta"), Intent::SetTimer);
    }

    #[test]
    fn test_set_alarm_rule() {
        assert_eq!(classify_intent("set an alarm for 7 am"), Intent::SetAlarm);
        assert_eq!(classify_intent("make alarm at 19:30"), Intent::SetAlarm);
    }

    #[test]
    fn test_cancel_rule() {
        assert_eq!(classify_intent("cancel my timer"), Intent::Cancel);
        assert_eq!(classify_intent("please stop"), Intent::Cancel);
        // The general cancel rule comes before cancel_all.
        assert_eq!(classify_intent("cancel all"), Intent::Cancel);
    }

    #[test]
    fn test_list_rule() {
        assert_eq!(classify_intent("show timers"), Intent::List);
        assert_eq!(classify_intent("what alarms are set"), Intent::List);
    }

    #[test]
    fn test_rule_order_first_match_wins() {
        // Matches both set_timer and cancel; set_timer is earlier.
        assert_eq!(classify_intent("set a timer to stop the oven"), Intent::SetTimer);
    }

    #[test]
    fn test_keyword_fallbacks() {
        assert_eq!(classify_intent("5 minute timer please"), Intent::SetTimer);
        assert_eq!(classify_intent("wake me up at 7 am"), Intent::SetAlarm);
        assert_eq!(classify_intent("alarm at 6"), Intent::SetAlarm);
        assert_eq!(classify_intent("show me everything"), Intent::List);
        assert_eq!(classify_intent("what is running"), Intent::List);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(classify_intent("hello there"), Intent::Unknown);
        assert_eq!(classify_intent(""), Intent::Unknown);
    }
}
