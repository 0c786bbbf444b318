//! GeoJSON export

use crate::models::MeasurementEntry;
use serde_json::{json, Value};

/// Render a FeatureCollection with one Point feature per geolocated entry
///
/// Entries without a fix have no geometry to offer and are skipped.
pub fn render(entries: &[MeasurementEntry]) -> String {
    let features: Vec<Value> = entries
        .iter()
        .filter_map(|entry| {
            let gps = entry.gps.as_ref()?;
            Some(json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [gps.longitude, gps.latitude, gps.altitude.unwrap_or(0.0)],
                },
                "properties": {
                    "ping": entry.sequence,
                    "rtt_ms": (entry.rtt_ms() * 10.0).round() / 10.0,
                    "timestamp": entry.timestamp.to_rfc3339(),
                    "accuracy": gps.accuracy,
                    "speed": gps.speed,
                    "bearing": gps.bearing,
                    "rssi": entry.link.and_then(|l| l.rssi),
                    "snr": entry.link.and_then(|l| l.snr),
                },
            }))
        })
        .collect();

    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });

    serde_json::to_string_pretty(&collection).unwrap_or_else(|_| String::new())
}
