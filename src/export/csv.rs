//! CSV export

use crate::models::MeasurementEntry;
use std::fmt::Write as _;

const HEADER: &str = "Ping,RTT_ms,Timestamp,Latitude,Longitude,Altitude,Accuracy,Speed,Bearing,RSSI_dBm,SNR_dB";

/// Render one row per entry; absent geolocation and link fields are blank
pub fn render(entries: &[MeasurementEntry]) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');

    for entry in entries {
        let _ = write!(out, "{},{:.1},{}", entry.sequence, entry.rtt_ms(), entry.timestamp.to_rfc3339());

        match &entry.gps {
            Some(gps) => {
                let _ = write!(
                    out,
                    ",{},{},{},{},{},{}",
                    gps.latitude,
                    gps.longitude,
                    opt(gps.altitude),
                    opt(gps.accuracy),
                    opt(gps.speed),
                    opt(gps.bearing)
                );
            }
            None => out.push_str(",,,,,,"),
        }

        match &entry.link {
            Some(link) => {
                let _ = write!(
                    out,
                    ",{},{}\n",
                    link.rssi.map(|v| v.to_string()).unwrap_or_default(),
                    link.snr.map(|v| v.to_string()).unwrap_or_default()
                );
            }
            None => out.push_str(",,\n"),
        }
    }

    out
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
