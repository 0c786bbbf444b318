//! Measurement data models

use crate::types::SignalQuality;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Geolocation fix attached to a measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    /// Latitude in decimal degrees
    pub latitude: f64,

    /// Longitude in decimal degrees
    pub longitude: f64,

    /// Altitude in meters, if reported
    pub altitude: Option<f64>,

    /// Horizontal accuracy in meters, if reported
    pub accuracy: Option<f64>,

    /// Ground speed in m/s, if reported
    pub speed: Option<f64>,

    /// Bearing in degrees, if reported
    pub bearing: Option<f64>,
}

/// Per-frame radio link quality reported by the transport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkQuality {
    /// Received signal strength in dBm
    pub rssi: Option<i32>,

    /// Signal-to-noise ratio in dB
    pub snr: Option<f64>,
}

impl LinkQuality {
    /// True when neither metric is present
    pub fn is_empty(&self) -> bool {
        self.rssi.is_none() && self.snr.is_none()
    }
}

/// A single completed round-trip measurement
///
/// Immutable once created; the measurement log only ever appends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementEntry {
    /// Probe sequence number this measurement corresponds to
    pub sequence: u64,

    /// Round-trip time of the probe/response pair
    #[serde(with = "rtt_seconds")]
    pub rtt: Duration,

    /// When the matching response arrived
    pub timestamp: DateTime<Utc>,

    /// Geolocation at response time, if a fix was available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsFix>,

    /// Radio link quality of the response frame, if reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkQuality>,
}

impl MeasurementEntry {
    /// Create a new measurement entry stamped with the current time
    pub fn new(sequence: u64, rtt: Duration, gps: Option<GpsFix>, link: Option<LinkQuality>) -> Self {
        Self {
            sequence,
            rtt,
            timestamp: Utc::now(),
            gps,
            link,
        }
    }

    /// Round-trip time in milliseconds
    pub fn rtt_ms(&self) -> f64 {
        self.rtt.as_secs_f64() * 1000.0
    }

    /// Signal quality classification for this entry
    pub fn quality(&self) -> SignalQuality {
        SignalQuality::from_rtt(self.rtt)
    }

    /// Whether this entry carries a geolocation fix
    pub fn has_gps(&self) -> bool {
        self.gps.is_some()
    }
}

/// Serialize the round-trip time as fractional seconds, matching the
/// on-disk schema of the measurement store.
mod rtt_seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(rtt: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(rtt.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom("rtt must be a non-negative number"));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}
