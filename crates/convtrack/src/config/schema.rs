use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub version: String,
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub downloads: DownloadConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Minimal configuration pointing at `base_url`, everything else default.
    pub fn for_server(base_url: &str) -> Self {
        Self {
            version: "1.0".to_string(),
            server: ServerConfig {
                base_url: base_url.to_string(),
                connect_timeout_secs: default_connect_timeout(),
                request_timeout_secs: default_request_timeout(),
            },
            polling: PollingConfig::default(),
            credentials: CredentialsConfig::default(),
            downloads: DownloadConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Root URL of the conversion service, e.g. `https://transcribe.example.com`.
    pub base_url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

impl ServerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Period of the status re-check while any job is still active.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Upper bound of records fetched per refresh.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

fn default_interval_ms() -> u64 {
    3000
}

fn default_page_limit() -> u32 {
    100
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            page_limit: default_page_limit(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default = "default_token_file")]
    pub token_file: Option<String>,
    #[serde(default = "default_token_env_var")]
    pub token_env_var: Option<String>,
}

fn default_token_file() -> Option<String> {
    dirs::config_dir().map(|p| {
        p.join("convtrack")
            .join("token")
            .to_string_lossy()
            .to_string()
    })
}

fn default_token_env_var() -> Option<String> {
    Some("CONVTRACK_TOKEN".to_string())
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            token_file: default_token_file(),
            token_env_var: default_token_env_var(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    #[serde(default = "default_download_dir")]
    pub directory: String,
}

fn default_download_dir() -> String {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string())
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            directory: default_download_dir(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            if path == "~" {
                return home.to_string_lossy().into_owned();
            }
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
