//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Export formats supported by the exporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    GeoJson,
    Kml,
    Html,
}

impl ExportFormat {
    /// All formats, in the order they are written
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Csv,
        ExportFormat::Json,
        ExportFormat::GeoJson,
        ExportFormat::Kml,
        ExportFormat::Html,
    ];

    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::GeoJson => "geojson",
            ExportFormat::Kml => "kml",
            ExportFormat::Html => "html",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "geojson" => Ok(ExportFormat::GeoJson),
            "kml" => Ok(ExportFormat::Kml),
            "html" => Ok(ExportFormat::Html),
            _ => Err(AppError::validation(format!(
                "Unknown export format '{}' (expected csv|json|geojson|kml|html|all)",
                s
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Policy for measurements that arrive without a geolocation fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpsPolicy {
    /// Discard entries lacking geolocation
    Strict,
    /// Record entries with the geolocation fields absent
    Lenient,
}

impl Default for GpsPolicy {
    fn default() -> Self {
        GpsPolicy::Lenient
    }
}

/// When the export files are (re)rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportCadence {
    /// Rewrite the export files after every appended measurement
    Incremental,
    /// Render only once, during shutdown
    OnShutdown,
}

impl Default for ExportCadence {
    fn default() -> Self {
        ExportCadence::Incremental
    }
}

/// Link quality classification based on round-trip time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalQuality {
    /// Good link (< 500 ms)
    Good,
    /// Usable link (500-2000 ms)
    Ok,
    /// Poor link (> 2000 ms)
    Poor,
}

impl SignalQuality {
    /// Classify a round-trip time
    pub fn from_rtt(rtt: Duration) -> Self {
        let ms = rtt.as_secs_f64() * 1000.0;
        if ms < 500.0 {
            Self::Good
        } else if ms < 2000.0 {
            Self::Ok
        } else {
            Self::Poor
        }
    }

    /// KML style identifier for this quality level
    pub fn kml_style(&self) -> &'static str {
        match self {
            Self::Good => "goodSignal",
            Self::Ok => "okSignal",
            Self::Poor => "poorSignal",
        }
    }

    /// Marker color used by the HTML map
    pub fn marker_color(&self) -> &'static str {
        match self {
            Self::Good => "green",
            Self::Ok => "yellow",
            Self::Poor => "red",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("GeoJSON".parse::<ExportFormat>().unwrap(), ExportFormat::GeoJson);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_signal_quality_thresholds() {
        assert_eq!(SignalQuality::from_rtt(Duration::from_millis(120)), SignalQuality::Good);
        assert_eq!(SignalQuality::from_rtt(Duration::from_millis(499)), SignalQuality::Good);
        assert_eq!(SignalQuality::from_rtt(Duration::from_millis(500)), SignalQuality::Ok);
        assert_eq!(SignalQuality::from_rtt(Duration::from_millis(1999)), SignalQuality::Ok);
        assert_eq!(SignalQuality::from_rtt(Duration::from_millis(2000)), SignalQuality::Poor);
    }

    #[test]
    fn test_policy_defaults() {
        assert_eq!(GpsPolicy::default(), GpsPolicy::Lenient);
        assert_eq!(ExportCadence::default(), ExportCadence::Incremental);
    }
}
