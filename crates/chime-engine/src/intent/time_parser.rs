//! Duration and clock-time extraction from command text.
//!
//! Each grammar is a compiled regex plus a conversion from its captures.
//! Grammars are tried in order and the first one whose regex matches
//! decides the result. A matched grammar whose values are out of range or
//! too large to represent yields nothing, unless it is marked to fall
//! through to the next grammar.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use regex::{Captures, Regex};

struct Grammar<T> {
    regex: Regex,
    convert: fn(&Captures<'_>) -> Option<T>,
    /// Try the next grammar when conversion fails after a match.
    falls_through: bool,
}

impl<T> Grammar<T> {
    fn new(pattern: &str, convert: fn(&Captures<'_>) -> Option<T>) -> Self {
        Self {
            regex: Regex::new(pattern).expect("Invalid time grammar regex"),
            convert,
            falls_through: false,
        }
    }

    fn falling_through(mut self) -> Self {
        self.falls_through = true;
        self
    }
}

fn first_match<T>(grammars: &[Grammar<T>], text: &str) -> Option<T> {
    for grammar in grammars {
        let Some(caps) = grammar.regex.captures(text) else {
            continue;
        };
        match (grammar.convert)(&caps) {
            Some(value) => return Some(value),
            None if grammar.falls_through => continue,
            None => return None,
        }
    }
    None
}

fn number(caps: &Captures<'_>, group: usize) -> Option<u64> {
    caps.get(group)?.as_str().parse().ok()
}

fn scaled(count: u64, unit_secs: u64) -> Option<Duration> {
    count.checked_mul(unit_secs).map(Duration::from_secs)
}

fn unit_secs(unit: &str) -> Option<u64> {
    match unit {
        "hour" | "hr" | "h" => Some(3600),
        "minute" | "min" | "m" => Some(60),
        "second" | "sec" | "s" => Some(1),
        _ => None,
    }
}

// =============================================================================
// Durations
// =============================================================================

static DURATION_GRAMMARS: LazyLock<Vec<Grammar<Duration>>> = LazyLock::new(|| {
    vec![
        // "1 hour and 30 minutes", "2 hrs", "1h 15m"
        Grammar::new(
            r"(?i)(\d+)\s*(?:hour|hr|h)s?\s*(?:and\s*)?(?:(\d+)\s*(?:minute|min|m)s?)?",
            |caps| {
                let hours = scaled(number(caps, 1)?, 3600)?;
                let minutes = match caps.get(2) {
                    Some(_) => scaled(number(caps, 2)?, 60)?,
                    None => Duration::ZERO,
                };
                hours.checked_add(minutes)
            },
        ),
        Grammar::new(r"(?i)(\d+)\s*(?:minute|min|m)s?", |caps| {
            scaled(number(caps, 1)?, 60)
        }),
        Grammar::new(r"(?i)(\d+)\s*(?:second|sec|s)s?", |caps| {
            scaled(number(caps, 1)?, 1)
        }),
        // "in 3 min"
        Grammar::new(
            r"(?i)in\s+(\d+)\s*(hour|minute|second|hr|min|sec|h|m|s)s?",
            |caps| {
                let unit = caps.get(2)?.as_str().to_lowercase();
                scaled(number(caps, 1)?, unit_secs(&unit)?)
            },
        ),
    ]
});

/// Extract a countdown length such as "5 minutes" or "1 hour and 30 minutes".
pub fn extract_duration(text: &str) -> Option<Duration> {
    first_match(&DURATION_GRAMMARS, text)
}

// =============================================================================
// Clock times
// =============================================================================

static CLOCK_GRAMMARS: LazyLock<Vec<Grammar<NaiveTime>>> = LazyLock::new(|| {
    vec![
        // "7 am", "7:30 p.m."
        Grammar::new(
            r"(?i)(\d{1,2})(?::(\d{2}))?\s*(am|pm|a\.m\.|p\.m\.)",
            |caps| {
                let mut hour = number(caps, 1)?;
                let minute = match caps.get(2) {
                    Some(_) => number(caps, 2)?,
                    None => 0,
                };
                let period = caps.get(3)?.as_str().to_lowercase();
                if period.starts_with('p') && hour != 12 {
                    hour += 12;
                } else if period.starts_with('a') && hour == 12 {
                    hour = 0;
                }
                clock_time(hour, minute)
            },
        ),
        // "19:30"; an invalid one may still read as "N o'clock"
        Grammar::new(r"(\d{1,2}):(\d{2})", |caps| {
            clock_time(number(caps, 1)?, number(caps, 2)?)
        })
        .falling_through(),
        // "7 o'clock": small hours read as afternoon, 6 to 11 as morning.
        Grammar::new(r"(?i)(\d{1,2})\s*o'?clock", |caps| {
            let hour = match number(caps, 1)? {
                h @ 6..=11 => h,
                h @ 1..=5 => h + 12,
                12 => 12,
                _ => return None,
            };
            clock_time(hour, 0)
        }),
    ]
});

fn clock_time(hour: u64, minute: u64) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(u32::try_from(hour).ok()?, u32::try_from(minute).ok()?, 0)
}

/// Extract a clock time and resolve it to its next occurrence after `now`.
///
/// A time equal to or earlier than `now` today resolves to tomorrow.
pub fn extract_alarm_time(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let time = first_match(&CLOCK_GRAMMARS, text)?;
    next_occurrence(time, now)
}

/// The first instant strictly after `now` showing `time` on the clock.
pub fn next_occurrence(time: NaiveTime, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let today = now.date().and_time(time);
    if today > now {
        Some(today)
    } else {
        today.checked_add_signed(TimeDelta::days(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn tomorrow(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn mins(m: u64) -> Option<Duration> {
        Some(Duration::from_secs(m * 60))
    }

    // =====================================================================
    // Durations
    // =====================================================================

    #[test]
    fn test_hours_and_minutes() {
        assert_eq!(extract_duration("1 hour and 30 minutes"), mins(90));
        assert_eq!(extract_duration("2 hrs 15 min"), mins(135));
        assert_eq!(extract_duration("1h30m"), mins(90));
        assert_eq!(extract_duration("3 hours"), mins(180));
    }

    #[test]
    fn test_minutes_only() {
        assert_eq!(extract_duration("set timer for 5 minutes"), mins(5));
        assert_eq!(extract_duration("10 min"), mins(10));
    }

    #[test]
    fn test_seconds_only() {
        assert_eq!(extract_duration("30 seconds"), Some(Duration::from_secs(30)));
        assert_eq!(extract_duration("45 sec"), Some(Duration::from_secs(45)));
    }

    #[test]
    fn test_relative_phrase() {
        assert_eq!(extract_duration("in 2 hours"), Some(Duration::from_secs(7200)));
    }

    #[test]
    fn test_no_duration() {
        assert_eq!(extract_duration("set a timer"), None);
        assert_eq!(extract_duration(""), None);
    }

    #[test]
    fn test_overflow_yields_none() {
        assert_eq!(extract_duration("99999999999999999999 minutes"), None);
        assert_eq!(extract_duration("9999999999999999 hours"), None);
    }

    #[test]
    fn test_overflowing_hours_do_not_fall_back_to_minutes() {
        assert_eq!(extract_duration("99999999999999999999 hours 5 minutes"), None);
        assert_eq!(extract_duration("9999999999999999 hours and 5 min"), None);
    }

    // =====================================================================
    // Clock times
    // =====================================================================

    #[test]
    fn test_twelve_hour_next_occurrence() {
        assert_eq!(extract_alarm_time("7 am", at(8, 0)), Some(tomorrow(7, 0)));
        assert_eq!(extract_alarm_time("7 am", at(6, 0)), Some(at(7, 0)));
        assert_eq!(extract_alarm_time("7:30 pm", at(6, 0)), Some(at(19, 30)));
        assert_eq!(extract_alarm_time("wake me at 6 a.m.", at(5, 0)), Some(at(6, 0)));
    }

    #[test]
    fn test_twelve_hour_noon_and_midnight() {
        assert_eq!(extract_alarm_time("12 pm", at(8, 0)), Some(at(12, 0)));
        assert_eq!(extract_alarm_time("12 am", at(8, 0)), Some(tomorrow(0, 0)));
    }

    #[test]
    fn test_equal_to_now_rolls_over() {
        assert_eq!(extract_alarm_time("7 am", at(7, 0)), Some(tomorrow(7, 0)));
    }

    #[test]
    fn test_twelve_hour_out_of_range() {
        assert_eq!(extract_alarm_time("7:75 pm", at(6, 0)), None);
        assert_eq!(extract_alarm_time("13 pm", at(6, 0)), None);
    }

    #[test]
    fn test_twelve_hour_out_of_range_is_not_read_as_twenty_four_hour() {
        assert_eq!(extract_alarm_time("wake me at 13:30 pm", at(8, 0)), None);
        assert_eq!(extract_alarm_time("13 pm or 19:30", at(8, 0)), None);
    }

    #[test]
    fn test_invalid_twenty_four_hour_falls_through_to_oclock() {
        assert_eq!(extract_alarm_time("99:99 at 7 o'clock", at(5, 0)), Some(at(7, 0)));
    }

    #[test]
    fn test_twenty_four_hour() {
        assert_eq!(extract_alarm_time("19:30", at(8, 0)), Some(at(19, 30)));
        assert_eq!(extract_alarm_time("00:15", at(8, 0)), Some(tomorrow(0, 15)));
        assert_eq!(extract_alarm_time("25:00", at(8, 0)), None);
        assert_eq!(extract_alarm_time("12:60", at(8, 0)), None);
    }

    #[test]
    fn test_oclock_heuristic() {
        assert_eq!(extract_alarm_time("7 o'clock", at(5, 0)), Some(at(7, 0)));
        assert_eq!(extract_alarm_time("3 oclock", at(5, 0)), Some(at(15, 0)));
        assert_eq!(extract_alarm_time("12 o'clock", at(5, 0)), Some(at(12, 0)));
        assert_eq!(extract_alarm_time("0 o'clock", at(5, 0)), None);
        assert_eq!(extract_alarm_time("13 o'clock", at(5, 0)), None);
    }

    #[test]
    fn test_no_time() {
        assert_eq!(extract_alarm_time("set an alarm", at(8, 0)), None);
    }
}
