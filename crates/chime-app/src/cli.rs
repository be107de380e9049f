//! CLI argument definitions for the Chime application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::{Path, PathBuf};

use chime_core::config::ChimeConfig;
use chime_core::error::{ChimeError, Result};
use clap::{Parser, Subcommand};

/// Chime: spoken-style timers and alarms over HTTP.
#[derive(Parser, Debug)]
#[command(name = "chime", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port", global = true)]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Interpret a command and print the resulting action as JSON.
    Parse {
        /// Command text, e.g. `set a timer for 5 minutes`.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Write a default configuration file to the resolved config path.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

impl CliArgs {
    /// Explicitly requested config path: --config flag, then CHIME_CONFIG.
    pub fn explicit_config_path(&self) -> Option<PathBuf> {
        if let Some(ref p) = self.config {
            return Some(p.clone());
        }
        std::env::var("CHIME_CONFIG").ok().map(PathBuf::from)
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CHIME_CONFIG env var > ~/.chime/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.explicit_config_path().unwrap_or_else(default_config_path)
    }

    /// Load configuration. A config file that was asked for explicitly must
    /// load cleanly; the default location falls back to defaults.
    pub fn load_config(&self) -> Result<ChimeConfig> {
        match self.explicit_config_path() {
            Some(path) => ChimeConfig::load(&path),
            None => Ok(ChimeConfig::load_or_default(&default_config_path())),
        }
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > CHIME_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("CHIME_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        config_port
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

/// Write the default configuration to `path`, refusing to replace an
/// existing file unless `force` is set.
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(ChimeError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    ChimeConfig::default().save(path)
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".chime").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".chime").join("config.toml");
    }
    PathBuf::from("config.toml")
}
