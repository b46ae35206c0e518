//! Configuration parsing and validation for dutyguard
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Crew defaults (acclimatization, augmented crew)
//! - Live countdown cadence and FDP warnings
//! - Validation with clear error messages

mod schema;
mod settings;
mod validation;

pub use schema::*;
pub use settings::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load configuration, falling back to defaults when the file does not exist
pub fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(Settings::default());
    }

    let settings = load_config(path)?;
    info!(
        path = %path.display(),
        warnings = settings.countdown.warnings.len(),
        "Configuration loaded"
    );
    Ok(settings)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Settings> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Settings::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;
    use dutyguard_api::{Acclimatization, CrewComposition};
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn parse_minimal_config() {
        let settings = parse_config("config_version = 1").unwrap();
        assert_eq!(settings.countdown.warnings.len(), 3);
        assert_eq!(settings.crew.crew, CrewComposition::Standard);
    }

    #[test]
    fn parse_crew_defaults() {
        let config = r#"
            config_version = 1

            [service]
            data_dir = "/tmp/dutyguard-test"

            [crew]
            acclimatized = false
            augmented = true
        "#;

        let settings = parse_config(config).unwrap();
        assert_eq!(settings.crew.acclimatization, Acclimatization::Unacclimatized);
        assert_eq!(settings.crew.crew, CrewComposition::Augmented);
        assert_eq!(
            settings.service.data_dir,
            PathBuf::from("/tmp/dutyguard-test")
        );
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_warnings() {
        let config = r#"
            config_version = 1

            [[countdown.warnings]]
            minutes_before = 20

            [[countdown.warnings]]
            minutes_before = 20
        "#;

        match parse_config(config) {
            Err(ConfigError::ValidationFailed { errors }) => {
                assert_eq!(errors, vec![ValidationError::DuplicateWarning(20)]);
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn reject_malformed_toml() {
        assert!(matches!(
            parse_config("config_version = "),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "config_version = 1").unwrap();
        writeln!(file, "[countdown]").unwrap();
        writeln!(file, "poll_interval_seconds = 15").unwrap();

        let settings = load_config(file.path()).unwrap();
        assert_eq!(settings.countdown.poll_interval.as_secs(), 15);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.countdown, CountdownPolicy::default());

        assert!(matches!(
            load_config(dir.path().join("absent.toml")),
            Err(ConfigError::ReadError(_))
        ));
    }
}
