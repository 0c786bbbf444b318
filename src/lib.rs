//! Mesh Range Tester
//!
//! Measures round-trip latency over a delay-tolerant mesh transport by
//! exchanging correlated probe/response pairs, optionally annotating each
//! measurement with device location and radio link quality, and exporting
//! the measurement stream as CSV, JSON, GeoJSON, KML, and an HTML map.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod measurement;
pub mod models;
pub mod output;
pub mod probe;
pub mod responder;
pub mod telemetry;
pub mod transport;
pub mod types;
pub mod wire;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use measurement::MeasurementLog;
pub use models::{GpsFix, LinkQuality, MeasurementEntry};
pub use probe::{PendingProbes, ProbeScheduler, ResponseCollector, SessionStats};
pub use types::{ExportCadence, ExportFormat, GpsPolicy, SignalQuality};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_DISPLAY_NAME: &str = "RangeTest-Mobile";
    pub const DEFAULT_ANNOUNCE_INTERVAL: Duration = Duration::from_secs(180);
    pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(5);
    pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_PATH_ESTABLISHMENT_WAIT: Duration = Duration::from_secs(10);
    pub const DEFAULT_PRE_PING_DELAY: Duration = Duration::from_secs(3);
    pub const DEFAULT_EXPORT_DIR: &str = "export";
    pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_LOCATION_COMMAND: &str = "termux-location -p gps";
    pub const DEFAULT_ENABLE_COLOR: bool = true;
}
