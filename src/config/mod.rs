//! # Configuration Management Module
//!
//! Centralized, type-safe configuration for the relay server, the model client,
//! the reveal engine and the terminal client.
//!
//! ## Configuration Structure
//!
//! - [`ServerConfig`] - Relay HTTP listener
//! - [`ModelConfig`] - Hosted model API settings
//! - [`RevealConfig`] - Segmentation thresholds and typewriter pacing
//! - [`GameConfig`] - Client shell settings (time limit, history window)
//! - [`LoggingConfig`] - Logging level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use escaperoom::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?.with_env_overrides();
//!     println!("Relay listening on {}", config.server.bind_addr());
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 3001
//!
//! [model]
//! api_key = ""
//! base_url = "https://api.anthropic.com"
//! model = "claude-haiku-4-5-20251001"
//!
//! [reveal]
//! max_segment_chars = 70
//! flush_threshold_chars = 40
//! chars_per_tick = 2
//! tick_interval_ms = 30
//! ```
//!
//! ## Environment Integration
//!
//! Precedence: CLI args > Environment > Config file > Defaults. The API key is
//! normally supplied through `ANTHROPIC_API_KEY` (optionally from a `.env`
//! file) rather than written to disk.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;

use crate::story::reveal::DEFAULT_CHARS_PER_TICK;
use crate::story::segmenter::{DEFAULT_FLUSH_THRESHOLD, DEFAULT_MAX_LENGTH};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Usually left empty in the file and supplied via `ANTHROPIC_API_KEY`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Value sent as the `anthropic-version` header
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-haiku-4-5-20251001".to_string(),
            max_tokens: 4000, // generous, long scenes were getting truncated
            temperature: 0.8,
            timeout_seconds: 120,
            api_version: default_api_version(),
        }
    }
}

impl ModelConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Segmentation thresholds and typewriter pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Upper bound for one displayed segment (characters).
    pub max_segment_chars: usize,
    /// A buffer this long is flushed at the next sentence terminator.
    pub flush_threshold_chars: usize,
    pub chars_per_tick: usize,
    pub tick_interval_ms: u64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            max_segment_chars: DEFAULT_MAX_LENGTH,
            flush_threshold_chars: DEFAULT_FLUSH_THRESHOLD,
            chars_per_tick: DEFAULT_CHARS_PER_TICK,
            tick_interval_ms: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Relay the terminal client talks to.
    pub relay_url: String,
    pub time_limit_minutes: u64,
    /// Number of recent history entries sent with each action.
    pub history_window: usize,
    pub difficulty: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            relay_url: "http://127.0.0.1:3001".to_string(),
            time_limit_minutes: 30,
            history_window: 5,
            difficulty: "普通".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

/// Strip whitespace and one layer of surrounding quotes pasted along with a key.
pub fn sanitize_api_key(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix('"')
        .or_else(|| trimmed.strip_prefix('\''))
        .unwrap_or(trimmed);
    let trimmed = trimmed
        .strip_suffix('"')
        .or_else(|| trimmed.strip_suffix('\''))
        .unwrap_or(trimmed);
    trimmed.trim().to_string()
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
        Self::from_toml(path, &content)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub async fn load_or_default(path: &str) -> Result<Self, ConfigError> {
        match fs::try_exists(path).await {
            Ok(true) => Self::load(path).await,
            _ => Ok(Self::default()),
        }
    }

    fn from_toml(path: &str, content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(&Config::default())?;
        fs::write(path, content)
            .await
            .map_err(|source| ConfigError::Write {
                path: path.to_string(),
                source,
            })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reveal.max_segment_chars == 0 {
            return Err(ConfigError::Invalid {
                field: "reveal.max_segment_chars",
                reason: "must be positive".to_string(),
            });
        }
        if self.reveal.flush_threshold_chars > self.reveal.max_segment_chars {
            return Err(ConfigError::Invalid {
                field: "reveal.flush_threshold_chars",
                reason: format!(
                    "must not exceed max_segment_chars ({})",
                    self.reveal.max_segment_chars
                ),
            });
        }
        if self.reveal.chars_per_tick == 0 {
            return Err(ConfigError::Invalid {
                field: "reveal.chars_per_tick",
                reason: "must be positive".to_string(),
            });
        }
        if self.reveal.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "reveal.tick_interval_ms",
                reason: "must be positive".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.model.temperature) {
            return Err(ConfigError::Invalid {
                field: "model.temperature",
                reason: format!("{} is outside 0.0..=1.0", self.model.temperature),
            });
        }
        Ok(())
    }

    /// Apply `ANTHROPIC_API_KEY`, `ANTHROPIC_BASE_URL`, `ESCAPEROOM_MODEL` and `PORT`.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::with_env_overrides`] with an injectable lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup("ANTHROPIC_API_KEY") {
            self.model.api_key = key;
        }
        self.model.api_key = sanitize_api_key(&self.model.api_key);
        if let Some(url) = lookup("ANTHROPIC_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.model.base_url = url.trim().to_string();
        }
        if let Some(model) = lookup("ESCAPEROOM_MODEL").filter(|m| !m.trim().is_empty()) {
            self.model.model = model.trim().to_string();
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.reveal.max_segment_chars, 70);
        assert_eq!(config.reveal.flush_threshold_chars, 40);
        assert_eq!(config.reveal.chars_per_tick, 2);
        assert_eq!(config.game.time_limit_minutes, 30);
        assert_eq!(config.game.history_window, 5);
        assert!(!config.model.has_api_key());
    }

    #[test]
    fn test_toml_round_trip_skips_empty_key() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        assert!(!serialized.contains("api_key"));
        let parsed = Config::from_toml("mem", &serialized).unwrap();
        assert_eq!(parsed.model.model, config.model.model);
        assert_eq!(parsed.reveal.tick_interval_ms, 30);
    }

    #[test]
    fn test_partial_file_uses_section_defaults() {
        let parsed = Config::from_toml("mem", "[server]\nhost = \"127.0.0.1\"\nport = 8080\n").unwrap();
        assert_eq!(parsed.server.bind_addr(), "127.0.0.1:8080");
        assert_eq!(parsed.reveal.max_segment_chars, 70);
        assert_eq!(parsed.model.api_version, "2023-06-01");
    }

    #[test]
    fn test_rejects_zero_max_segment() {
        let err = Config::from_toml(
            "mem",
            "[reveal]\nmax_segment_chars = 0\nflush_threshold_chars = 0\nchars_per_tick = 2\ntick_interval_ms = 30\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "reveal.max_segment_chars",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_threshold_above_max() {
        let mut config = Config::default();
        config.reveal.flush_threshold_chars = 80;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sanitize_api_key() {
        assert_eq!(sanitize_api_key("  \"sk-abc\"  "), "sk-abc");
        assert_eq!(sanitize_api_key("'sk-abc'"), "sk-abc");
        assert_eq!(sanitize_api_key("sk-abc\n"), "sk-abc");
        assert_eq!(sanitize_api_key("   "), "");
    }

    #[test]
    fn test_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("ANTHROPIC_API_KEY", "'sk-test'"),
            ("ANTHROPIC_BASE_URL", "http://proxy.local/"),
            ("PORT", "4000"),
        ]
        .into_iter()
        .collect();
        let config = Config::default().with_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.model.api_key, "sk-test");
        assert_eq!(config.model.base_url, "http://proxy.local/");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.model.model, "claude-haiku-4-5-20251001");
    }

    #[test]
    fn test_bad_port_override_is_ignored() {
        let config = Config::default().with_overrides(|k| (k == "PORT").then(|| "nope".to_string()));
        assert_eq!(config.server.port, 3001);
    }

    #[test]
    fn test_logging_level_filter() {
        let logging = LoggingConfig {
            level: "debug".into(),
            file: None,
        };
        assert_eq!(logging.level_filter(), log::LevelFilter::Debug);
        let bad = LoggingConfig {
            level: "loud".into(),
            file: None,
        };
        assert_eq!(bad.level_filter(), log::LevelFilter::Info);
    }

    #[tokio::test]
    async fn test_create_default_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();
        Config::create_default(path).await.unwrap();
        let loaded = Config::load(path).await.unwrap();
        assert_eq!(loaded.server.port, 3001);
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let loaded = Config::load_or_default(path.to_str().unwrap()).await.unwrap();
        assert_eq!(loaded.server.port, 3001);
        assert!(matches!(
            Config::load(path.to_str().unwrap()).await,
            Err(ConfigError::Read { .. })
        ));
    }
}
