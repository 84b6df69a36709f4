use super::{resolve_config_path, ConfigError, Settings, API_KEY_ENV};
use std::path::Path;

/// Loads the settings file if one exists, applies environment overrides and
/// validates the result. A missing file yields the defaults.
pub fn load_global_settings() -> Result<Settings, ConfigError> {
    let path = resolve_config_path()?;
    load_settings_from(&path, |name| std::env::var(name).ok())
}

pub fn load_settings_from<F>(path: &Path, env: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = if path.exists() {
        Settings::from_path(path)?
    } else {
        Settings::default()
    };
    if let Some(key) = env(API_KEY_ENV).filter(|key| !key.trim().is_empty()) {
        settings.api_key = Some(key);
    }
    settings.validate()?;
    Ok(settings)
}
