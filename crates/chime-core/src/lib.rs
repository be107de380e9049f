pub mod config;
pub mod error;
pub mod types;

pub use config::ChimeConfig;
pub use error::{ChimeError, Result};
pub use types::*;
