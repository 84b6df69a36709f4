pub mod error;
pub mod load;
pub mod paths;
pub mod settings;

pub use error::ConfigError;
pub use load::{load_global_settings, load_settings_from};
pub use paths::{
    default_global_config_path, default_log_path, resolve_config_path, API_KEY_ENV,
    CONFIG_PATH_ENV, GLOBAL_SETTINGS_FILE_NAME, GLOBAL_STATE_DIR,
};
pub use settings::{
    ArtifactProxyConfig, HttpConfig, LoggingConfig, PollingConfig, Settings, StreamConfig,
    DEFAULT_API_URL, DEFAULT_ARTIFACT_PROXY_PATH,
};
