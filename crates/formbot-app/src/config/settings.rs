//! Settings parser for .formbot/config.toml

use std::path::{Path, PathBuf};

use super::types::Settings;
use formbot_core::prelude::*;

pub const CONFIG_FILENAME: &str = "config.toml";
pub const FORMBOT_DIR: &str = ".formbot";

/// The `.formbot/` directory of a project
pub fn config_dir(project_path: &Path) -> PathBuf {
    project_path.join(FORMBOT_DIR)
}

/// Where the JSON state store lives, or `None` when persistence is disabled
pub fn state_file_path(project_path: &Path, settings: &Settings) -> Option<PathBuf> {
    settings
        .state
        .enabled
        .then(|| config_dir(project_path).join(&settings.state.file))
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Load settings from .formbot/config.toml
///
/// Returns default settings if file doesn't exist or can't be parsed.
pub fn load_settings(project_path: &Path) -> Settings {
    let config_path = config_dir(project_path).join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Create the default config file in .formbot/ directory
pub fn init_config_dir(project_path: &Path) -> Result<()> {
    let formbot_dir = config_dir(project_path);

    if !formbot_dir.exists() {
        std::fs::create_dir_all(&formbot_dir)
            .map_err(|e| Error::config(format!("Failed to create .formbot dir: {}", e)))?;
    }

    let config_path = formbot_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        let default_content = r#"# formbot configuration

[dispatch]
system_calls = ["/start"]   # Commands offered to subscribers before forms
verbose = false             # Emit an event for every received message

[state]
enabled = false             # Persist sessions across restarts
file = "state.json"         # Relative to .formbot/
restore_on_start = true
save_on_stop = true

[client]
device_id = 1               # Console chat id
request_timeout_secs = 30

[logging]
level = "info"              # Overridden by FORMBOT_LOG
# directory = "/var/log/formbot"
"#;
        std::fs::write(&config_path, default_content)
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
    }

    Ok(())
}

/// Save settings to .formbot/config.toml
///
/// Uses atomic write (temp file + rename).
pub fn save_settings(project_path: &Path, settings: &Settings) -> Result<()> {
    let formbot_dir = config_dir(project_path);

    if !formbot_dir.exists() {
        std::fs::create_dir_all(&formbot_dir)
            .map_err(|e| Error::config(format!("Failed to create .formbot dir: {}", e)))?;
    }

    let config_path = formbot_dir.join(CONFIG_FILENAME);
    let temp_path = formbot_dir.join(".config.toml.tmp");

    let content = toml::to_string_pretty(settings)
        .map_err(|e| Error::config(format!("Failed to serialize settings: {}", e)))?;
    let full_content = format!("# formbot configuration\n\n{}", content);

    // Atomic write: write to temp, then rename
    std::fs::write(&temp_path, &full_content)
        .map_err(|e| Error::config(format!("Failed to write temp file: {}", e)))?;

    std::fs::rename(&temp_path, &config_path)
        .map_err(|e| Error::config(format!("Failed to rename temp file: {}", e)))?;

    info!("Saved settings to {:?}", config_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_config_uses_defaults() {
        let temp = tempdir().unwrap();
        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_load_invalid_config_uses_defaults() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(config_dir(temp.path())).unwrap();
        std::fs::write(
            config_dir(temp.path()).join(CONFIG_FILENAME),
            "[dispatch\nverbose = ",
        )
        .unwrap();

        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_init_config_dir_writes_loadable_defaults() {
        let temp = tempdir().unwrap();
        init_config_dir(temp.path()).unwrap();

        assert!(config_dir(temp.path()).join(CONFIG_FILENAME).exists());
        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_init_config_dir_keeps_existing_file() {
        let temp = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.dispatch.verbose = true;
        save_settings(temp.path(), &settings).unwrap();

        init_config_dir(temp.path()).unwrap();
        assert!(load_settings(temp.path()).dispatch.verbose);
    }

    #[test]
    fn test_save_settings_roundtrip() {
        let temp = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.dispatch.system_calls = vec!["/start".to_string(), "/help".to_string()];
        settings.state.enabled = true;
        settings.client.device_id = 99;

        save_settings(temp.path(), &settings).unwrap();

        assert_eq!(load_settings(temp.path()), settings);
        assert!(!config_dir(temp.path()).join(".config.toml.tmp").exists());
    }

    #[test]
    fn test_state_file_path() {
        let temp = tempdir().unwrap();
        let mut settings = Settings::default();
        assert!(state_file_path(temp.path(), &settings).is_none());

        settings.state.enabled = true;
        assert_eq!(
            state_file_path(temp.path(), &settings),
            Some(temp.path().join(".formbot").join("state.json"))
        );
    }
}
