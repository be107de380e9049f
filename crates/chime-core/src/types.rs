use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque identifier of a timer or alarm entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for EntryId {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

// =============================================================================
// Enums
// =============================================================================

/// What kind of entry is scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Countdown relative to creation time.
    Timer,
    /// Absolute wall-clock time.
    Alarm,
}

impl EntryKind {
    /// Generic label used when a command names nothing.
    pub fn default_label(&self) -> &'static str {
        match self {
            EntryKind::Timer => "Timer",
            EntryKind::Alarm => "Alarm",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Timer => write!(f, "timer"),
            EntryKind::Alarm => write!(f, "alarm"),
        }
    }
}

impl std::str::FromStr for EntryKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timer" => Ok(EntryKind::Timer),
            "alarm" => Ok(EntryKind::Alarm),
            _ => Err(format!("Unknown entry kind: {}", s)),
        }
    }
}

/// Entry lifecycle states. `Fired` and `Cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    Scheduled,
    Fired,
    Cancelled,
}

impl EntryState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EntryState::Scheduled)
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryState::Scheduled => write!(f, "scheduled"),
            EntryState::Fired => write!(f, "fired"),
            EntryState::Cancelled => write!(f, "cancelled"),
        }
    }
}
