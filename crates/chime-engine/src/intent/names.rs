//! Entry name extraction.

use std::sync::LazyLock;

use chime_core::types::EntryKind;
use regex::Regex;

struct NamePatterns {
    timer: Vec<Regex>,
    alarm: Vec<Regex>,
}

static NAME_PATTERNS: LazyLock<NamePatterns> = LazyLock::new(|| {
    let mk = |pats: &[&str]| -> Vec<Regex> {
        pats.iter()
            .map(|p| Regex::new(p).expect("Invalid name regex"))
            .collect()
    };

    NamePatterns {
        timer: mk(&[
            r"(?i)timer\s+for\s+(\w+)",
            r"(?i)(\w+)\s+timer",
            r"(?i)called\s+(\w+)",
            r"(?i)named\s+(\w+)",
        ]),
        alarm: mk(&[
            r"(?i)alarm\s+for\s+(\w+)",
            r"(?i)(\w+)\s+alarm",
            r"(?i)wake\s+up\s+for\s+(\w+)",
            r"(?i)called\s+(\w+)",
            r"(?i)named\s+(\w+)",
        ]),
    }
});

/// The first name token the command gives the entry, capitalized.
pub fn find_name(text: &str, kind: EntryKind) -> Option<String> {
    let patterns = match kind {
        EntryKind::Timer => &NAME_PATTERNS.timer,
        EntryKind::Alarm => &NAME_PATTERNS.alarm,
    };
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| capitalize(m.as_str()))
}

/// Like [`find_name`], falling back to "Timer" or "Alarm".
pub fn extract_name(text: &str, kind: EntryKind) -> String {
    find_name(text, kind).unwrap_or_else(|| kind.default_label().to_string())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_for_name() {
        assert_eq!(extract_name("set a timer for pasta", EntryKind::Timer), "Pasta");
    }

    #[test]
    fn test_name_before_kind() {
        assert_eq!(extract_name("start the egg timer", EntryKind::Timer), "Egg");
        assert_eq!(extract_name("set work alarm for 7 am", EntryKind::Alarm), "7");
        assert_eq!(extract_name("make a gym alarm at 6 am", EntryKind::Alarm), "Gym");
    }

    #[test]
    fn test_called_and_named() {
        assert_eq!(
            extract_name("5 minutes called TEA please", EntryKind::Timer),
            "Tea"
        );
        assert_eq!(extract_name("7 am named standup", EntryKind::Alarm), "Standup");
    }

    #[test]
    fn test_wake_up_for() {
        assert_eq!(extract_name("wake up for school at 7 am", EntryKind::Alarm), "School");
    }

    #[test]
    fn test_first_token_after_for_is_taken_literally() {
        assert_eq!(
            extract_name("set a timer for 5 minutes", EntryKind::Timer),
            "5"
        );
    }

    #[test]
    fn test_defaults() {
        assert_eq!(extract_name("5 minutes", EntryKind::Timer), "Timer");
        assert_eq!(extract_name("7 am", EntryKind::Alarm), "Alarm");
        assert_eq!(find_name("7 am", EntryKind::Alarm), None);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("pASTA"), "Pasta");
        assert_eq!(capitalize("é"), "É");
        assert_eq!(capitalize(""), "");
    }
}
