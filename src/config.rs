//! Configuration System
//!
//! Loads configuration from a TOML file with environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Local persistence
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// SQLite file for the chat server, relative to `data_dir`
    #[serde(default = "default_chat_db")]
    pub chat_db: String,

    /// SQLite file for the projects board, relative to `data_dir`
    #[serde(default = "default_projects_db")]
    pub projects_db: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("nexus").to_string_lossy().to_string())
        .unwrap_or_else(|| "./nexus_data".to_string())
}

fn default_chat_db() -> String {
    "chat.db".to_string()
}

fn default_projects_db() -> String {
    "projects.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            chat_db: default_chat_db(),
            projects_db: default_projects_db(),
        }
    }
}

impl StorageConfig {
    pub fn chat_db_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.chat_db)
    }

    pub fn projects_db_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.projects_db)
    }
}

/// HTTP/WebSocket server
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Empty means any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Chat client
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// WebSocket base, the user id is appended as `/ws/{id}`
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// HTTP base for history and read receipts
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_server_url() -> String {
    "ws://localhost:8000".to_string()
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_reconnect_delay() -> u64 {
    1000
}

fn default_request_timeout() -> u64 {
    5000
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            api_url: default_api_url(),
            reconnect_delay_ms: default_reconnect_delay(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl ChatConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Channel URL for a user session
    pub fn channel_url(&self, user_id: i64) -> String {
        format!("{}/ws/{}", self.server_url.trim_end_matches('/'), user_id)
    }
}

/// Analytics dashboard
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    /// Key of the snapshot blob (file stem under `storage.data_dir`)
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    #[serde(default = "default_export_dir")]
    pub export_dir: String,
}

fn default_storage_key() -> String {
    "analytics".to_string()
}

fn default_export_dir() -> String {
    "./exports".to_string()
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            export_dir: default_export_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from the first default location that exists, else the environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("nexus").join("config.toml")),
            Some(PathBuf::from("/etc/nexus/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!(path = ?path, "Loaded config");
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!(path = ?path, error = %e, "Failed to load config");
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(data_dir) = std::env::var("NEXUS_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        if let Ok(host) = std::env::var("NEXUS_API_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = std::env::var("NEXUS_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        if let Ok(url) = std::env::var("NEXUS_CHAT_SERVER_URL") {
            self.chat.server_url = url;
        }
        if let Ok(url) = std::env::var("NEXUS_CHAT_API_URL") {
            self.chat.api_url = url;
        }
        if let Ok(delay) = std::env::var("NEXUS_RECONNECT_DELAY_MS") {
            if let Ok(ms) = delay.parse() {
                self.chat.reconnect_delay_ms = ms;
            }
        }

        if let Ok(level) = std::env::var("NEXUS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("NEXUS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Nexus Configuration
#
# Environment variables override these settings:
# - NEXUS_DATA_DIR
# - NEXUS_API_HOST
# - NEXUS_API_PORT
# - NEXUS_CHAT_SERVER_URL
# - NEXUS_CHAT_API_URL
# - NEXUS_RECONNECT_DELAY_MS
# - NEXUS_LOG_LEVEL
# - NEXUS_LOG_FORMAT

[storage]
# Directory for the analytics snapshot and the SQLite databases
data_dir = "./nexus_data"

# Chat server SQLite file, relative to data_dir
chat_db = "chat.db"

# Projects board SQLite file, relative to data_dir
projects_db = "projects.db"

[api]
host = "0.0.0.0"
port = 8000

# Allowed CORS origins (empty allows any)
cors_origins = []

[chat]
# WebSocket base; sessions connect to {server_url}/ws/{user_id}
server_url = "ws://localhost:8000"

# HTTP base for history and read receipts
api_url = "http://localhost:8000"

# Fixed delay before every reconnect attempt (ms)
reconnect_delay_ms = 1000

# HTTP request timeout (ms)
request_timeout_ms = 5000

[analytics]
# Snapshot key, stored as {data_dir}/{storage_key}.json
storage_key = "analytics"

# Where dashboard exports are written
export_dir = "./exports"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.port, 8000);
        assert_eq!(config.chat.reconnect_delay(), Duration::from_secs(1));
        assert_eq!(config.analytics.storage_key, "analytics");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.storage.data_dir, "./nexus_data");
        assert_eq!(config.chat.server_url, "ws://localhost:8000");
        assert_eq!(config.chat.request_timeout_ms, 5000);
        assert_eq!(config.analytics.export_dir, "./exports");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse("[chat]\nreconnect_delay_ms = 250\n").unwrap();
        assert_eq!(config.chat.reconnect_delay_ms, 250);
        assert_eq!(config.chat.api_url, "http://localhost:8000");
        assert_eq!(config.api.host, "0.0.0.0");
    }

    #[test]
    fn test_channel_url() {
        let chat = ChatConfig {
            server_url: "ws://example.com:9000/".to_string(),
            ..ChatConfig::default()
        };
        assert_eq!(chat.channel_url(4), "ws://example.com:9000/ws/4");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nport = 9100\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().api.port, 9100);

        std::fs::write(&path, "[api\n").unwrap();
        assert!(matches!(
            Config::load(&path).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn test_chat_db_path() {
        let storage = StorageConfig {
            data_dir: "/tmp/nexus".to_string(),
            chat_db: "chat.db".to_string(),
            projects_db: "boards/projects.db".to_string(),
        };
        assert_eq!(storage.chat_db_path(), PathBuf::from("/tmp/nexus/chat.db"));
        assert_eq!(
            storage.projects_db_path(),
            PathBuf::from("/tmp/nexus/boards/projects.db")
        );
    }
}
