//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/careerscope/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/careerscope/` (~/.config/careerscope/)
//! - Data: `$XDG_DATA_HOME/careerscope/` (~/.local/share/careerscope/)
//! - State/Logs: `$XDG_STATE_HOME/careerscope/` (~/.local/state/careerscope/)

use crate::error::{Error, Result};
use crate::types::TimeRange;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Env var consulted when `store.api_key` is not set
pub const STORE_API_KEY_ENV: &str = "CAREERSCOPE_STORE_API_KEY";
/// Env var consulted when `store.access_token` is not set
pub const ACCESS_TOKEN_ENV: &str = "CAREERSCOPE_ACCESS_TOKEN";
/// Env var consulted when `insights.api_key` is not set
pub const INSIGHTS_API_KEY_ENV: &str = "CAREERSCOPE_INSIGHTS_API_KEY";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Row store connection
    #[serde(default)]
    pub store: StoreConfig,

    /// Signed-in user when no auth token is configured
    #[serde(default)]
    pub user: UserConfig,

    /// Career insight generation
    #[serde(default)]
    pub insights: InsightsConfig,

    /// Dashboard defaults
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Supported row store backends
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// PostgREST-compatible HTTP API
    #[default]
    Postgrest,
    /// Local SQLite mirror
    Sqlite,
}

/// Row store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Which backend to query
    #[serde(default)]
    pub backend: StoreBackend,

    /// Project URL (e.g., `https://project.example.co`)
    pub url: Option<String>,

    /// Public API key sent as `apikey` (can also use env var)
    pub api_key: Option<String>,

    /// User access token sent as bearer (can also use env var)
    pub access_token: Option<String>,

    /// SQLite file for the local backend
    pub sqlite_path: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: None,
            api_key: None,
            access_token: None,
            sqlite_path: None,
            timeout_secs: default_store_timeout(),
        }
    }
}

impl StoreConfig {
    /// API key from config, falling back to the environment
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(STORE_API_KEY_ENV).ok())
    }

    /// Access token from config, falling back to the environment
    pub fn resolved_access_token(&self) -> Option<String> {
        self.access_token
            .clone()
            .or_else(|| std::env::var(ACCESS_TOKEN_ENV).ok())
    }

    /// SQLite path from config, falling back to the XDG data directory
    pub fn resolved_sqlite_path(&self) -> PathBuf {
        self.sqlite_path
            .clone()
            .unwrap_or_else(Config::database_path)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.backend == StoreBackend::Sqlite {
            return Ok(());
        }

        if self.url.is_none() {
            return Err(Error::Config(
                "store.url is required for the postgrest backend".to_string(),
            ));
        }
        if self.resolved_api_key().is_none() {
            return Err(Error::Config(format!(
                "store.api_key (or {}) is required for the postgrest backend",
                STORE_API_KEY_ENV
            )));
        }
        Ok(())
    }
}

fn default_store_timeout() -> u64 {
    30
}

/// Statically configured user identity
#[derive(Debug, Deserialize, Clone, Default)]
pub struct UserConfig {
    /// User id the rows are filtered by
    pub id: Option<String>,
    /// Email, used for the greeting fallback
    pub email: Option<String>,
}

/// Career insight configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InsightsConfig {
    /// Enable/disable automatic insight generation
    #[serde(default = "default_insights_enabled")]
    pub enabled: bool,

    /// Streaming chat endpoint
    pub endpoint: Option<String>,

    /// Model name forwarded to the endpoint (optional)
    pub model: Option<String>,

    /// Bearer token for the endpoint (can also use env var)
    pub api_key: Option<String>,

    /// Whole-request timeout in seconds; unset means no timeout
    pub timeout_secs: Option<u64>,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            enabled: default_insights_enabled(),
            endpoint: None,
            model: None,
            api_key: None,
            timeout_secs: None,
        }
    }
}

impl InsightsConfig {
    /// Check if insights are enabled and have somewhere to go
    pub fn is_ready(&self) -> bool {
        self.enabled && self.endpoint.is_some()
    }

    /// API key from config, falling back to the environment
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(INSIGHTS_API_KEY_ENV).ok())
    }
}

fn default_insights_enabled() -> bool {
    true
}

/// Dashboard defaults
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    /// Range selected on startup
    #[serde(default)]
    pub default_range: TimeRange,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Validate every section that has hard requirements
    pub fn validate(&self) -> Result<()> {
        self.store.validate()?;
        if self.insights.enabled && self.insights.endpoint.is_none() {
            tracing::debug!("insights enabled without an endpoint; generation stays off");
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/careerscope/config.toml` (~/.config/careerscope/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("careerscope").join("config.toml")
    }

    /// Returns the data directory path (for the local SQLite store)
    ///
    /// `$XDG_DATA_HOME/careerscope/` (~/.local/share/careerscope/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("careerscope")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/careerscope/` (~/.local/state/careerscope/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("careerscope")
    }

    /// Returns the local database file path
    ///
    /// `$XDG_DATA_HOME/careerscope/data.db` (~/.local/share/careerscope/data.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store.backend, StoreBackend::Postgrest);
        assert_eq!(config.store.timeout_secs, 30);
        assert!(config.insights.enabled);
        assert!(!config.insights.is_ready());
        assert_eq!(config.dashboard.default_range, TimeRange::Last30Days);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[store]
backend = "postgrest"
url = "https://project.example.co"
api_key = "anon-key"

[user]
id = "user-1"
email = "ada@example.com"

[insights]
endpoint = "http://localhost:3000/api/openai/chat"
model = "gpt-4o-mini"

[dashboard]
default_range = "90days"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.store.url.as_deref(), Some("https://project.example.co"));
        assert_eq!(config.user.id.as_deref(), Some("user-1"));
        assert!(config.insights.is_ready());
        assert_eq!(config.insights.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.dashboard.default_range, TimeRange::Last90Days);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_postgrest_requires_url() {
        let config = StoreConfig {
            api_key: Some("anon-key".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sqlite_backend_needs_nothing_else() {
        let toml = r#"
[store]
backend = "sqlite"
sqlite_path = "/tmp/careerscope-test.db"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert!(config.store.validate().is_ok());
        assert_eq!(
            config.store.resolved_sqlite_path(),
            PathBuf::from("/tmp/careerscope-test.db")
        );
    }

    #[test]
    fn test_disabled_insights_are_not_ready() {
        let config = InsightsConfig {
            enabled: false,
            endpoint: Some("http://localhost:3000/api/openai/chat".to_string()),
            ..Default::default()
        };
        assert!(!config.is_ready());
    }
}
