//! Timer and alarm engine for Chime.
//!
//! Interprets free-form commands into typed actions, schedules one-shot
//! timers and alarms, and dispatches fire notifications to per-entry
//! listeners exactly once.

pub mod clock;
pub mod dispatch;
pub mod error;
pub mod intent;
pub mod interpreter;
pub mod scheduler;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatch::{listener_fn, FireListener, FireOutcome};
pub use error::{ListenerError, SchedulerError};
pub use interpreter::CommandInterpreter;
pub use scheduler::wakeup::{ManualWakeups, TokioWakeups, WakeupSubstrate};
pub use scheduler::Scheduler;
pub use types::{Action, Entry, EntrySnapshot, FireEvent, FireKind, Intent, RemainingTime};
