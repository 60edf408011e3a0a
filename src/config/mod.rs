//! Configuration module - environment variable parsing

pub mod limits;

pub use limits::{ActionLimits, AntiCheatConfig, MovementLimits};

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Host configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Admin bridge binding address
    pub admin_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Shared secret admin clients must present; open bridge when unset
    pub admin_token: Option<String>,
    /// How often the host loop asks for maintenance (the sweep itself is gated)
    pub maintenance_tick_ms: u64,
    /// Optional JSON file with threshold overrides
    pub anticheat_config_path: Option<PathBuf>,
    /// Resolved thresholds
    pub anticheat: AntiCheatConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let admin_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("ADMIN_ADDR").unwrap_or_else(|_| "0.0.0.0:8090".to_string())
        };

        let maintenance_tick_ms = match env::var("MAINTENANCE_TICK_MS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("MAINTENANCE_TICK_MS"))?,
            Err(_) => 1_000,
        };

        let anticheat_config_path = env::var("ANTICHEAT_CONFIG").ok().map(PathBuf::from);
        let anticheat = match &anticheat_config_path {
            Some(path) => load_thresholds(path)?,
            None => AntiCheatConfig::default(),
        };

        Ok(Self {
            admin_addr: admin_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            admin_token: env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
            maintenance_tick_ms,
            anticheat_config_path,
            anticheat,
        })
    }
}

/// Read threshold overrides from a JSON file
pub fn load_thresholds(path: &Path) -> Result<AntiCheatConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_thresholds(&raw)
}

/// Parse threshold overrides; omitted fields keep their defaults
pub fn parse_thresholds(raw: &str) -> Result<AntiCheatConfig, ConfigError> {
    let config: AntiCheatConfig = serde_json::from_str(raw)?;
    let actions = &config.actions;
    // Window counts come from the action ring buffer and cannot exceed it
    if actions.max_actions_per_second > actions.history_capacity {
        return Err(ConfigError::Invalid("actions.max_actions_per_second"));
    }
    if actions.burst_threshold > actions.history_capacity {
        return Err(ConfigError::Invalid("actions.burst_threshold"));
    }
    Ok(config)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    Invalid(&'static str),

    #[error("Invalid admin address format")]
    InvalidAddress,

    #[error("Failed to read threshold file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed threshold file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_thresholds_are_rejected() {
        let err = parse_thresholds("{ \"actions\": 12 }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn empty_object_is_defaults() {
        assert_eq!(parse_thresholds("{}").unwrap(), AntiCheatConfig::default());
    }

    #[test]
    fn limits_beyond_history_capacity_are_rejected() {
        let err = parse_thresholds(r#"{ "actions": { "history_capacity": 16 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("actions.max_actions_per_second")));

        let raw = r#"{ "actions": { "history_capacity": 40, "burst_threshold": 41 } }"#;
        assert!(matches!(
            parse_thresholds(raw).unwrap_err(),
            ConfigError::Invalid("actions.burst_threshold")
        ));

        let raw = r#"{ "actions": { "history_capacity": 20, "max_actions_per_second": 20, "burst_threshold": 20 } }"#;
        assert!(parse_thresholds(raw).is_ok());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_thresholds(Path::new("/nonexistent/voxel_guard.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/voxel_guard.json"));
    }
}
