use crate::config::{PollingConfig, Settings, StreamConfig, DEFAULT_API_URL};
use crate::stream::ReconnectPolicy;
use crate::view::ArtifactUrlProxy;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub api_base: String,
    pub api_key: Option<String>,
    pub polling: PollingConfig,
    pub stream_enabled: bool,
    /// How often a dropped live stream is re-opened while the run is still
    /// active. Terminal statuses and unavailable streams are never retried.
    pub stream_retry: ReconnectPolicy,
    pub proxy: ArtifactUrlProxy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_URL.to_string(),
            api_key: None,
            polling: PollingConfig::default(),
            stream_enabled: true,
            stream_retry: ReconnectPolicy::from_config(&StreamConfig::default()),
            proxy: ArtifactUrlProxy::default(),
        }
    }
}

impl SessionOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_base: settings.api_url.clone(),
            api_key: settings.api_key.clone(),
            polling: settings.polling.clone(),
            stream_enabled: settings.stream.enabled,
            stream_retry: ReconnectPolicy::from_config(&settings.stream),
            proxy: ArtifactUrlProxy::from_settings(settings),
        }
    }
}
