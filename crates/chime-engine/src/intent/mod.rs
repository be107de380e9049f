//! Command interpretation grammars.
//!
//! Classifies raw command text into an intent and extracts durations,
//! clock times, and entry names from it.

pub mod names;
pub mod patterns;
pub mod time_parser;

pub use names::{extract_name, find_name};
pub use patterns::classify_intent;
pub use time_parser::{extract_alarm_time, extract_duration};
