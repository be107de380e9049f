//! Core types and value objects for the timer engine.
//!
//! Defines intents, interpreted actions, registry entries, their outbound
//! snapshots, and fire notifications.

use std::fmt;
use std::time::Duration;

use chime_core::types::{EntryId, EntryKind, EntryState};
use chrono::{DateTime, Local, TimeDelta, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::SchedulerError;
use crate::scheduler::state_machine::validate_transition;

// =============================================================================
// Enums
// =============================================================================

/// Command categories the interpreter can classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    SetTimer,
    SetAlarm,
    Cancel,
    CancelAll,
    List,
    Unknown,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::SetTimer => write!(f, "set_timer"),
            Intent::SetAlarm => write!(f, "set_alarm"),
            Intent::Cancel => write!(f, "cancel"),
            Intent::CancelAll => write!(f, "cancel_all"),
            Intent::List => write!(f, "list"),
            Intent::Unknown => write!(f, "unknown"),
        }
    }
}

/// Whether a fire notification reports an expired timer or a ringing alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FireKind {
    Expired,
    Triggered,
}

impl FireKind {
    pub fn for_entry(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Timer => FireKind::Expired,
            EntryKind::Alarm => FireKind::Triggered,
        }
    }
}

impl fmt::Display for FireKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FireKind::Expired => write!(f, "expired"),
            FireKind::Triggered => write!(f, "triggered"),
        }
    }
}

// =============================================================================
// Actions
// =============================================================================

/// The typed result of interpreting one command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    SetTimer {
        #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
        duration: Duration,
        name: String,
    },
    SetAlarm {
        target_time: DateTime<Local>,
        name: String,
    },
    CancelAll,
    ListTimers,
    Unknown {
        reason: String,
    },
}

impl Action {
    pub fn unknown(reason: impl Into<String>) -> Self {
        Action::Unknown {
            reason: reason.into(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Action::Unknown { .. })
    }

    /// Wire name of the action, matching its serialized tag.
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetTimer { .. } => "set_timer",
            Action::SetAlarm { .. } => "set_alarm",
            Action::CancelAll => "cancel_all",
            Action::ListTimers => "list_timers",
            Action::Unknown { .. } => "unknown",
        }
    }

    /// User-facing confirmation for the action.
    pub fn describe(&self) -> String {
        match self {
            Action::SetTimer { duration, .. } => {
                format!("Timer set for {}", format_duration(*duration))
            }
            Action::SetAlarm { target_time, .. } => {
                format!("Alarm set for {}", target_time.format("%I:%M %p"))
            }
            Action::CancelAll => "Cancelled timers".to_string(),
            Action::ListTimers => "Listing timers".to_string(),
            Action::Unknown { reason } => reason.clone(),
        }
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_secs())
}

// =============================================================================
// Entries
// =============================================================================

/// A timer or alarm tracked by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: EntryId,
    pub name: String,
    pub kind: EntryKind,
    pub created_at: DateTime<Utc>,
    pub target_time: DateTime<Utc>,
    /// Requested countdown, timers only.
    pub duration: Option<Duration>,
    pub state: EntryState,
}

impl Entry {
    pub fn is_active(&self) -> bool {
        self.state == EntryState::Scheduled
    }

    /// Move to `next`, rejecting anything the lifecycle does not allow.
    pub fn transition(&mut self, next: EntryState) -> Result<(), SchedulerError> {
        validate_transition(self.state, next)?;
        self.state = next;
        Ok(())
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> EntrySnapshot {
        let remaining = if self.is_active() {
            RemainingTime::until(Some(self.target_time), now)
        } else {
            RemainingTime::Expired
        };

        EntrySnapshot {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            created_at: self.created_at,
            target_time: Some(self.target_time),
            duration: self.duration.map(format_clock),
            remaining_time: remaining.to_string(),
            is_active: self.is_active(),
        }
    }
}

/// Serialized view of an entry handed to listeners and transports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySnapshot {
    pub id: EntryId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub created_at: DateTime<Utc>,
    pub target_time: Option<DateTime<Utc>>,
    pub duration: Option<String>,
    pub remaining_time: String,
    pub is_active: bool,
}

/// Display form of the time left on an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingTime {
    Left(u64),
    Expired,
    Unknown,
}

impl RemainingTime {
    /// Whole seconds left, rounded up so a live entry never reads as expired.
    pub fn until(target: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(target) = target else {
            return RemainingTime::Unknown;
        };
        let delta = target - now;
        if delta <= TimeDelta::zero() {
            return RemainingTime::Expired;
        }
        let whole = delta.num_seconds();
        let partial = delta - TimeDelta::seconds(whole) > TimeDelta::zero();
        RemainingTime::Left(whole as u64 + u64::from(partial))
    }
}

impl fmt::Display for RemainingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemainingTime::Left(secs) => {
                let hours = secs / 3600;
                let minutes = (secs % 3600) / 60;
                let seconds = secs % 60;
                if hours > 0 {
                    write!(f, "{:02}:{:02}:{:02}", hours, minutes, seconds)
                } else {
                    write!(f, "{:02}:{:02}", minutes, seconds)
                }
            }
            RemainingTime::Expired => write!(f, "Expired"),
            RemainingTime::Unknown => write!(f, "Unknown"),
        }
    }
}

impl Serialize for RemainingTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// Fire notifications
// =============================================================================

/// Delivered exactly once to an entry's listener when it fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireEvent {
    #[serde(rename = "event")]
    pub kind: FireKind,
    pub message: String,
    #[serde(rename = "timer")]
    pub entry: EntrySnapshot,
}

impl FireEvent {
    pub fn new(entry: EntrySnapshot) -> Self {
        let message = match entry.kind {
            EntryKind::Timer => format!("Timer '{}' has expired!", entry.name),
            EntryKind::Alarm => format!("Alarm '{}' is ringing!", entry.name),
        };
        Self {
            kind: FireKind::for_entry(entry.kind),
            message,
            entry,
        }
    }
}

// =============================================================================
// Formatting
// =============================================================================

/// Human phrasing such as "1 hour and 30 minutes". Seconds only show when
/// the duration is under an hour.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(plural(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(plural(minutes, "minute"));
    }
    if seconds > 0 && hours == 0 {
        parts.push(plural(seconds, "second"));
    }

    match parts.len() {
        0 => "0 seconds".to_string(),
        1 => parts.remove(0),
        _ => parts.join(" and "),
    }
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("{} {}", count, unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

/// Clock form "H:MM:SS", prefixed with "N day(s), " past a day.
pub fn format_clock(duration: Duration) -> String {
    let total = duration.as_secs();
    let days = total / 86_400;
    let rest = total % 86_400;
    let clock = format!("{}:{:02}:{:02}", rest / 3600, (rest % 3600) / 60, rest % 60);
    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        n => format!("{} days, {}", n, clock),
    }
}
