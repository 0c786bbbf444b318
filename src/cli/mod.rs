//! Command-line interface module

use crate::error::{AppError, Result};
use crate::types::ExportFormat;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Mesh Range Tester - round-trip latency measurement over a mesh transport
#[derive(Parser, Debug, Clone)]
#[command(name = "mesh-range-tester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Destination address of the base station (host:port for the UDP
    /// transport); overrides the configured base_station_destination
    pub destination: Option<String>,

    /// Formats copied to the downloads folder on shutdown
    /// (csv|json|geojson|kml|html|all; repeatable or comma-joined)
    #[arg(long = "export", value_delimiter = ',', action = ArgAction::Append)]
    pub export: Vec<String>,

    /// Path to the JSON configuration file
    #[arg(long, default_value = "client_config.json")]
    pub config: PathBuf,

    /// Run against an in-process echo responder instead of a real transport
    #[arg(long)]
    pub loopback: bool,

    /// Run as a base station responder instead of a probe client
    #[arg(long)]
    pub serve: bool,

    /// Address the responder binds to
    #[arg(long, default_value = "0.0.0.0:4403")]
    pub bind: String,

    /// Discard measurements that lack a geolocation fix
    #[arg(long)]
    pub strict_gps: bool,

    /// Skip the location provider entirely
    #[arg(long)]
    pub no_gps: bool,

    /// Render export files only at shutdown instead of after every entry
    #[arg(long)]
    pub export_on_shutdown: bool,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<()> {
        if self.color && self.no_color {
            return Err(AppError::validation("Cannot specify both --color and --no-color"));
        }

        if self.serve && self.loopback {
            return Err(AppError::validation("Cannot specify both --serve and --loopback"));
        }

        if self.strict_gps && self.no_gps {
            return Err(AppError::validation("Cannot specify both --strict-gps and --no-gps"));
        }

        // Surface format typos at startup rather than at shutdown
        self.export_formats()?;

        Ok(())
    }

    /// Resolve the requested export formats, expanding `all`
    ///
    /// An empty selection means no downloads copy is made; the export
    /// directory itself always receives every format.
    pub fn export_formats(&self) -> Result<Vec<ExportFormat>> {
        let mut formats = Vec::new();
        for raw in &self.export {
            if raw.eq_ignore_ascii_case("all") {
                return Ok(ExportFormat::ALL.to_vec());
            }
            let format: ExportFormat = raw.parse()?;
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
        Ok(formats)
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            supports_color()
        }
    }
}

/// Detect whether the terminal supports colored output
fn supports_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }
    true
}
