use super::{ConfigError, Settings};
use std::path::Path;

/// An absent file means defaults.
pub fn load_settings_or_default(path: &Path) -> Result<Settings, ConfigError> {
    let settings = if path.exists() {
        Settings::from_path(path)?
    } else {
        Settings::default()
    };
    settings.validate()?;
    Ok(settings)
}
