//! Application-level configuration loading: game rules and storage backend.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "KARMA_SUITS_CONFIG_PATH";

/// Where lobby snapshots are persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreConfig {
    /// Process memory only.
    #[default]
    Memory,
    /// A JSON file at the given path.
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// In-game players required to start.
    pub min_players: usize,
    /// Round length when the facilitator does not pick one.
    pub default_round_duration: Duration,
    /// Shortest round the facilitator may request.
    pub min_round_duration: Duration,
    /// Longest round the facilitator may request.
    pub max_round_duration: Duration,
    /// Advance elapsed rounds when the public status is read.
    pub auto_advance: bool,
    /// Persistence backend.
    pub store: StoreConfig,
    /// Buffered events per SSE subscriber.
    pub sse_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        min_players = app_config.min_players,
                        store = ?app_config.store,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Round length for a facilitator request, clamped to the configured bounds.
    pub fn round_duration(&self, requested_secs: Option<u64>) -> Duration {
        requested_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_round_duration)
            .clamp(self.min_round_duration, self.max_round_duration)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    min_players: usize,
    default_round_duration_seconds: u64,
    min_round_duration_seconds: u64,
    max_round_duration_seconds: u64,
    auto_advance: bool,
    store: StoreConfig,
    sse_capacity: usize,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            min_players: 3,
            default_round_duration_seconds: 600,
            min_round_duration_seconds: 60,
            max_round_duration_seconds: 3600,
            auto_advance: false,
            store: StoreConfig::Memory,
            sse_capacity: 16,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let min = value.min_round_duration_seconds.max(1);
        let max = value.max_round_duration_seconds.max(min);
        Self {
            min_players: value.min_players.max(1),
            default_round_duration: Duration::from_secs(
                value.default_round_duration_seconds.clamp(min, max),
            ),
            min_round_duration: Duration::from_secs(min),
            max_round_duration: Duration::from_secs(max),
            auto_advance: value.auto_advance,
            store: value.store,
            sse_capacity: value.sse_capacity.max(1),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let raw: RawConfig =
            serde_json::from_str(r#"{ "min_players": 4, "store": { "file": "data/lobby.json" } }"#)
                .unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.min_players, 4);
        assert_eq!(config.store, StoreConfig::File("data/lobby.json".into()));
        assert_eq!(config.default_round_duration, Duration::from_secs(600));
        assert!(!config.auto_advance);
    }

    #[test]
    fn memory_store_is_a_plain_string() {
        let raw: RawConfig = serde_json::from_str(r#"{ "store": "memory" }"#).unwrap();
        assert_eq!(AppConfig::from(raw).store, StoreConfig::Memory);
    }

    #[test]
    fn requested_durations_are_clamped() {
        let config = AppConfig::default();
        assert_eq!(config.round_duration(None), Duration::from_secs(600));
        assert_eq!(config.round_duration(Some(5)), Duration::from_secs(60));
        assert_eq!(config.round_duration(Some(90)), Duration::from_secs(90));
        assert_eq!(config.round_duration(Some(99_999)), Duration::from_secs(3600));
    }
}
