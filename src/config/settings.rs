use super::{default_log_path, ConfigError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8448";
pub const DEFAULT_ARTIFACT_PROXY_PATH: &str = "/api/artifact-proxy";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub artifact_proxy: ArtifactProxyConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            polling: PollingConfig::default(),
            http: HttpConfig::default(),
            stream: StreamConfig::default(),
            logging: LoggingConfig::default(),
            artifact_proxy: ArtifactProxyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    #[serde(default = "default_run_interval_ms")]
    pub run_interval_ms: u64,
    #[serde(default = "default_timeline_interval_ms")]
    pub timeline_interval_ms: u64,
    #[serde(default = "default_artifacts_interval_ms")]
    pub artifacts_interval_ms: u64,
    #[serde(default = "default_block_artifacts_interval_ms")]
    pub block_artifacts_interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            run_interval_ms: default_run_interval_ms(),
            timeline_interval_ms: default_timeline_interval_ms(),
            artifacts_interval_ms: default_artifacts_interval_ms(),
            block_artifacts_interval_ms: default_block_artifacts_interval_ms(),
        }
    }
}

impl PollingConfig {
    pub fn run_interval(&self) -> Duration {
        Duration::from_millis(self.run_interval_ms)
    }

    pub fn timeline_interval(&self) -> Duration {
        Duration::from_millis(self.timeline_interval_ms)
    }

    pub fn artifacts_interval(&self) -> Duration {
        Duration::from_millis(self.artifacts_interval_ms)
    }

    pub fn block_artifacts_interval(&self) -> Duration {
        Duration::from_millis(self.block_artifacts_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_reconnect_attempts: default_max_reconnect_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtifactProxyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_artifact_proxy_path")]
    pub path: String,
}

impl Default for ArtifactProxyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_artifact_proxy_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_artifact_proxy_path() -> String {
    DEFAULT_ARTIFACT_PROXY_PATH.to_string()
}

fn default_run_interval_ms() -> u64 {
    2000
}

fn default_timeline_interval_ms() -> u64 {
    3000
}

fn default_artifacts_interval_ms() -> u64 {
    5000
}

fn default_block_artifacts_interval_ms() -> u64 {
    3000
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_reconnect_attempts() -> u32 {
    10
}

fn default_base_backoff_ms() -> u64 {
    1000
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Settings(
                "`api_url` must start with http:// or https://".to_string(),
            ));
        }
        let intervals = [
            ("polling.run_interval_ms", self.polling.run_interval_ms),
            ("polling.timeline_interval_ms", self.polling.timeline_interval_ms),
            ("polling.artifacts_interval_ms", self.polling.artifacts_interval_ms),
            (
                "polling.block_artifacts_interval_ms",
                self.polling.block_artifacts_interval_ms,
            ),
            ("http.timeout_ms", self.http.timeout_ms),
            ("stream.base_backoff_ms", self.stream.base_backoff_ms),
        ];
        for (field, value) in intervals {
            if value == 0 {
                return Err(ConfigError::Settings(format!(
                    "`{field}` must be greater than zero"
                )));
            }
        }
        if self.stream.max_backoff_ms < self.stream.base_backoff_ms {
            return Err(ConfigError::Settings(
                "`stream.max_backoff_ms` must not be lower than `stream.base_backoff_ms`"
                    .to_string(),
            ));
        }
        if self.artifact_proxy.enabled && !self.artifact_proxy.path.starts_with('/') {
            return Err(ConfigError::Settings(
                "`artifact_proxy.path` must be an absolute path".to_string(),
            ));
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http.timeout_ms)
    }

    /// Event log location; falls back to the state directory when unset.
    pub fn resolve_log_path(&self) -> Option<PathBuf> {
        self.logging
            .path
            .clone()
            .or_else(|| default_log_path().ok())
    }

    /// Proxy path used to rewrite cloud storage URLs, if rewriting is on.
    pub fn artifact_proxy_path(&self) -> Option<&str> {
        self.artifact_proxy
            .enabled
            .then_some(self.artifact_proxy.path.as_str())
    }
}
