//! Command interpreter: raw text in, typed [`Action`] out.
//!
//! Interpretation never fails. Anything that cannot be understood comes
//! back as [`Action::Unknown`] with a hint for the user.

use std::sync::Arc;

use chime_core::config::InterpreterConfig;
use chime_core::types::EntryKind;
use chrono::{DateTime, Local, TimeZone};
use tracing::debug;

use crate::clock::Clock;
use crate::intent::{classify_intent, extract_alarm_time, extract_duration, find_name};
use crate::types::{Action, Intent};

pub const EMPTY_COMMAND: &str = "Empty command received";
pub const UNKNOWN_DURATION: &str =
    "Could not understand the duration. Try saying '5 minutes' or '1 hour and 30 minutes'";
pub const UNKNOWN_TIME: &str =
    "Could not understand the time. Try saying '7 AM' or '19:30' or '7:30 PM'";
pub const UNKNOWN_COMMAND: &str =
    "Could not understand the command. Try saying 'set timer for 5 minutes' or 'set alarm for 7 AM'";

pub struct CommandInterpreter {
    config: InterpreterConfig,
    clock: Arc<dyn Clock>,
}

impl CommandInterpreter {
    pub fn new(config: InterpreterConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    /// Interpret `text` against the current local time.
    pub fn process_command(&self, text: &str) -> Action {
        let now = self.clock.now().with_timezone(&Local);
        self.process_command_at(text, now)
    }

    /// Interpret `text` as if it were spoken at `now`.
    pub fn process_command_at(&self, text: &str, now: DateTime<Local>) -> Action {
        let text = normalize(text);
        if text.is_empty() {
            return Action::unknown(EMPTY_COMMAND);
        }

        let intent = classify_intent(&text);
        debug!(command = %text, intent = %intent, "Classified command");

        match intent {
            Intent::SetTimer => match extract_duration(&text) {
                Some(duration) => Action::SetTimer {
                    duration,
                    name: self.name_for(&text, EntryKind::Timer),
                },
                None => Action::unknown(UNKNOWN_DURATION),
            },
            Intent::SetAlarm => {
                let target = extract_alarm_time(&text, now.naive_local())
                    .and_then(|naive| Local.from_local_datetime(&naive).earliest());
                match target {
                    Some(target_time) => Action::SetAlarm {
                        target_time,
                        name: self.name_for(&text, EntryKind::Alarm),
                    },
                    None => Action::unknown(UNKNOWN_TIME),
                }
            }
            // Both cancel forms clear everything; single-entry cancel goes by id.
            Intent::Cancel | Intent::CancelAll => Action::CancelAll,
            Intent::List => Action::ListTimers,
            Intent::Unknown => Action::unknown(UNKNOWN_COMMAND),
        }
    }

    fn name_for(&self, text: &str, kind: EntryKind) -> String {
        find_name(text, kind).unwrap_or_else(|| match kind {
            EntryKind::Timer => self.config.default_timer_name.clone(),
            EntryKind::Alarm => self.config.default_alarm_name.clone(),
        })
    }
}

/// Trim, collapse runs of whitespace, and lowercase.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
