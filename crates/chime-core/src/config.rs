use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ChimeError, Result};

/// Top-level configuration for the Chime service.
///
/// Loaded from `~/.chime/config.toml` by default. Every section falls back
/// to its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChimeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub interpreter: InterpreterConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl ChimeConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ChimeConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values the scheduler cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.general.port == 0 {
            return Err(ChimeError::Config("general.port must be non-zero".to_string()));
        }
        if self.scheduler.timer_grace_secs == 0 || self.scheduler.alarm_grace_secs == 0 {
            return Err(ChimeError::Config(
                "scheduler grace windows must be at least one second".to_string(),
            ));
        }
        if self.scheduler.max_active_entries == 0 {
            return Err(ChimeError::Config(
                "scheduler.max_active_entries must be at least 1".to_string(),
            ));
        }
        if self.scheduler.sweep_interval_secs == 0 {
            return Err(ChimeError::Config(
                "scheduler.sweep_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// General service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Address the HTTP server binds to.
    pub host: String,
    /// HTTP server port.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8001,
        }
    }
}

/// Scheduling engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// How late a timer wake-up may run and still count as on time.
    pub timer_grace_secs: u64,
    /// How late an alarm wake-up may run and still count as on time.
    pub alarm_grace_secs: u64,
    /// Registrations beyond this many live entries are rejected.
    pub max_active_entries: usize,
    /// Period of the background stale-entry sweep.
    pub sweep_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timer_grace_secs: 30,
            alarm_grace_secs: 60,
            max_active_entries: 1000,
            sweep_interval_secs: 60,
        }
    }
}

/// Command interpreter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    pub default_timer_name: String,
    pub default_alarm_name: String,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            default_timer_name: "Timer".to_string(),
            default_alarm_name: "Alarm".to_string(),
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Allowed CORS origins. `"*"` allows any origin.
    pub cors_origins: Vec<String>,
    /// Capacity of the fire-notification broadcast channel.
    pub event_buffer: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec!["*".to_string()],
            event_buffer: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = ChimeConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.host, "127.0.0.1");
        assert_eq!(config.general.port, 8001);
        assert_eq!(config.scheduler.timer_grace_secs, 30);
        assert_eq!(config.scheduler.alarm_grace_secs, 60);
        assert_eq!(config.scheduler.max_active_entries, 1000);
        assert_eq!(config.scheduler.sweep_interval_secs, 60);
        assert_eq!(config.interpreter.default_timer_name, "Timer");
        assert_eq!(config.interpreter.default_alarm_name, "Alarm");
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert_eq!(config.api.event_buffer, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"
port = 9000

[scheduler]
timer_grace_secs = 10
max_active_entries = 5
"#;
        let file = create_temp_config(content);
        let config = ChimeConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.port, 9000);
        // Unspecified fields keep their defaults.
        assert_eq!(config.general.host, "127.0.0.1");
        assert_eq!(config.scheduler.timer_grace_secs, 10);
        assert_eq!(config.scheduler.alarm_grace_secs, 60);
        assert_eq!(config.scheduler.max_active_entries, 5);
        assert_eq!(config.interpreter.default_alarm_name, "Alarm");
    }

    #[test]
    fn test_load_empty_file_gives_defaults() {
        let file = create_temp_config("");
        let config = ChimeConfig::load(file.path()).unwrap();
        assert_eq!(config.general.port, 8001);
        assert_eq!(config.scheduler.alarm_grace_secs, 60);
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is not [valid toml");
        let err = ChimeConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ChimeError::Config(_)));
    }

    #[test]
    fn test_load_rejects_zero_grace() {
        let file = create_temp_config("[scheduler]\ntimer_grace_secs = 0\n");
        let err = ChimeConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("grace"));
    }

    #[test]
    fn test_validate_rejects_zero_capacity_and_port() {
        let mut config = ChimeConfig::default();
        config.scheduler.max_active_entries = 0;
        assert!(config.validate().is_err());

        let mut config = ChimeConfig::default();
        config.general.port = 0;
        assert!(config.validate().is_err());

        let mut config = ChimeConfig::default();
        config.scheduler.sweep_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = ChimeConfig::load_or_default(Path::new("/does/not/exist/config.toml"));
        assert_eq!(config.general.port, 8001);
        assert_eq!(config.scheduler.timer_grace_secs, 30);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ChimeConfig::default();
        config.general.port = 8123;
        config.interpreter.default_timer_name = "Countdown".to_string();
        config.save(&path).unwrap();

        let loaded = ChimeConfig::load(&path).unwrap();
        assert_eq!(loaded.general.port, 8123);
        assert_eq!(loaded.interpreter.default_timer_name, "Countdown");
    }
}
