//! Default paths for dutyguard components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/dutyguard/config.toml` or `~/.config/dutyguard/config.toml`
//! - Data: `$XDG_DATA_HOME/dutyguard` or `~/.local/share/dutyguard`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const DUTYGUARD_CONFIG_ENV: &str = "DUTYGUARD_CONFIG";

/// Environment variable for overriding the data directory
pub const DUTYGUARD_DATA_DIR_ENV: &str = "DUTYGUARD_DATA_DIR";

/// Database filename within the data directory
pub const DATABASE_FILENAME: &str = "dutyguard.db";

const CONFIG_FILENAME: &str = "config.toml";

/// Application subdirectory name
const APP_DIR: &str = "dutyguard";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$DUTYGUARD_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/dutyguard/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/dutyguard/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(DUTYGUARD_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_path_without_env()
}

/// Get the config path without checking the DUTYGUARD_CONFIG env var.
pub fn config_path_without_env() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/tmp").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$DUTYGUARD_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/dutyguard` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/dutyguard` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(DUTYGUARD_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking the DUTYGUARD_DATA_DIR env var.
/// Used for default values in configs where the env var is checked separately.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_contains_dutyguard() {
        let path = config_path_without_env();
        assert!(path.to_string_lossy().contains("dutyguard"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn data_dir_contains_dutyguard() {
        let path = data_dir_without_env();
        assert!(path.to_string_lossy().contains("dutyguard"));
    }
}
