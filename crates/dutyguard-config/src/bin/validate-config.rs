//! Config validation CLI tool
//!
//! Validates a dutyguard configuration file and reports any errors.

use dutyguard_api::WarningSeverity;
use dutyguard_util::{default_config_path, format_duration};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a dutyguard configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            eprintln!("  validate-config config.example.toml");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match dutyguard_config::load_config(&config_path) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", dutyguard_config::CURRENT_CONFIG_VERSION);
            println!("  Data directory: {}", settings.service.data_dir.display());
            println!(
                "  Crew: {}, {}",
                if settings.crew.acclimatization.is_acclimatized() {
                    "acclimatized"
                } else {
                    "unacclimatized"
                },
                settings.crew.crew
            );
            println!(
                "  Poll interval: {}s",
                settings.countdown.poll_interval.as_secs()
            );

            if !settings.countdown.warnings.is_empty() {
                println!();
                println!("FDP warnings:");
                for warning in &settings.countdown.warnings {
                    let severity = match warning.severity {
                        WarningSeverity::Info => "info",
                        WarningSeverity::Warn => "warn",
                        WarningSeverity::Critical => "critical",
                    };
                    println!(
                        "  - {} before FDP end [{}]: {}",
                        format_duration(warning.minutes_before),
                        severity,
                        warning.message_template.as_deref().unwrap_or("(default message)")
                    );
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                dutyguard_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                dutyguard_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                dutyguard_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                dutyguard_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        dutyguard_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
