//! Configuration loading: defaults, file, environment, then CLI overrides

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::types::{ExportCadence, GpsPolicy};

/// Build the effective configuration from all sources
///
/// Precedence, lowest to highest: built-in defaults, the JSON config file,
/// environment variables (with `.env` support), CLI arguments.
pub fn load_config(cli: &Cli) -> Result<Config> {
    // Load .env before reading the environment; a missing file is fine
    let _ = dotenv::dotenv();

    let mut config = Config::load_or_create(&cli.config)?;

    config.merge_from_env()?;

    apply_cli_overrides(&mut config, cli);

    config.validate()?;

    Ok(config)
}

/// Apply CLI argument overrides to the configuration
fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(ref destination) = cli.destination {
        config.base_station_destination = destination.clone();
    }

    if cli.strict_gps {
        config.gps_policy = GpsPolicy::Strict;
    }

    if cli.export_on_shutdown {
        config.export_cadence = ExportCadence::OnShutdown;
    }

    if cli.no_color {
        config.enable_color = false;
    } else if cli.color {
        config.enable_color = true;
    } else if !cli.use_colors() {
        // No flag given: the file setting stands unless the terminal
        // cannot do color at all
        config.enable_color = false;
    }

    if cli.verbose {
        config.verbose = true;
    }
    if cli.debug {
        config.debug = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn cli_with(dir: &TempDir, args: &[&str]) -> Cli {
        let config_path = dir.path().join("client_config.json");
        let mut full = vec!["mrt".to_string(), "--config".to_string(), config_path.display().to_string()];
        full.extend(args.iter().map(|s| s.to_string()));
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_cli_destination_overrides_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("client_config.json"),
            r#"{"base_station_destination": "file-host:1"}"#,
        )
        .unwrap();

        let cli = cli_with(&dir, &["cli-host:2"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.base_station_destination, "cli-host:2");
    }

    #[test]
    fn test_policy_flags_override_defaults() {
        let dir = TempDir::new().unwrap();
        let cli = cli_with(&dir, &["--strict-gps", "--export-on-shutdown"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.gps_policy, GpsPolicy::Strict);
        assert_eq!(config.export_cadence, ExportCadence::OnShutdown);
    }

    #[test]
    fn test_file_values_survive_absent_flags() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("client_config.json"),
            r#"{"verbose": true, "debug": true, "enable_color": false}"#,
        )
        .unwrap();

        let cli = cli_with(&dir, &[]);
        let config = load_config(&cli).unwrap();

        // File beats absent CLI flags; only a passed flag overrides
        assert!(config.verbose);
        assert!(config.debug);
        assert!(!config.enable_color);
    }

    #[test]
    fn test_defaults_without_overrides() {
        let dir = TempDir::new().unwrap();
        let cli = cli_with(&dir, &["--no-color"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.gps_policy, GpsPolicy::Lenient);
        assert_eq!(config.export_cadence, ExportCadence::Incremental);
        assert!(!config.enable_color);
    }
}
