//! HTML map export
//!
//! Self-contained Leaflet page: a path polyline over the geolocated entries
//! plus one circle marker per entry, colored by the shared RTT thresholds,
//! each with a descriptive popup. An empty or GPS-less log renders a
//! placeholder page instead of failing.

use crate::models::MeasurementEntry;
use serde_json::json;

const PLACEHOLDER: &str = "<!DOCTYPE html>\n\
<html><head><title>Range Test Map</title></head>\n\
<body><h1>No GPS data yet</h1><p>Waiting for GPS coordinates...</p></body></html>\n";

/// Render the map document for a snapshot
pub fn render(entries: &[MeasurementEntry]) -> String {
    let points: Vec<serde_json::Value> = entries
        .iter()
        .filter_map(|entry| {
            let gps = entry.gps.as_ref()?;
            Some(json!({
                "lat": gps.latitude,
                "lon": gps.longitude,
                "rtt": (entry.rtt_ms() * 10.0).round() / 10.0,
                "ping": entry.sequence,
                "time": entry.timestamp.to_rfc3339(),
                "rssi": entry.link.and_then(|l| l.rssi),
                "snr": entry.link.and_then(|l| l.snr),
                "color": entry.quality().marker_color(),
            }))
        })
        .collect();

    if points.is_empty() {
        return PLACEHOLDER.to_string();
    }

    let center_lat: f64 = points.iter().filter_map(|p| p["lat"].as_f64()).sum::<f64>() / points.len() as f64;
    let center_lon: f64 = points.iter().filter_map(|p| p["lon"].as_f64()).sum::<f64>() / points.len() as f64;
    let points_json = serde_json::to_string(&points).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Range Test Map</title>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
    <style>
        body {{ margin: 0; padding: 0; }}
        #map {{ height: 100vh; width: 100%; }}
        .legend {{ background: white; padding: 10px; border-radius: 5px; }}
    </style>
</head>
<body>
    <div id="map"></div>
    <script>
        var map = L.map('map').setView([{center_lat}, {center_lon}], 13);

        L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
            attribution: '&copy; OpenStreetMap contributors'
        }}).addTo(map);

        var points = {points_json};

        if (points.length > 1) {{
            var pathCoords = points.map(p => [p.lat, p.lon]);
            L.polyline(pathCoords, {{color: 'blue', weight: 3, opacity: 0.7}}).addTo(map);
        }}

        points.forEach(function(point) {{
            var color = point.color;

            var popup = `<b>Ping #${{point.ping}}</b><br>RTT: ${{point.rtt.toFixed(0)}}ms<br>Time: ${{point.time}}<br>Location: ${{point.lat.toFixed(6)}}, ${{point.lon.toFixed(6)}}`;
            if (point.rssi !== null && point.rssi !== undefined) {{
                popup += `<br>RSSI: ${{point.rssi}}dBm`;
            }}
            if (point.snr !== null && point.snr !== undefined) {{
                popup += `<br>SNR: ${{point.snr.toFixed(1)}}dB`;
            }}

            L.circleMarker([point.lat, point.lon], {{
                radius: 6,
                fillColor: color,
                color: '#000',
                weight: 1,
                opacity: 1,
                fillOpacity: 0.8
            }}).bindPopup(popup).addTo(map);
        }});

        var legend = L.control({{position: 'bottomright'}});
        legend.onAdd = function(map) {{
            var div = L.DomUtil.create('div', 'legend');
            div.innerHTML = '<b>Signal Quality</b><br>' +
                '<span style="color:green">&#9679; Good (&lt;500ms)</span><br>' +
                '<span style="color:yellow">&#9679; OK (500-2000ms)</span><br>' +
                '<span style="color:red">&#9679; Poor (&gt;2000ms)</span>';
            return div;
        }};
        legend.addTo(map);
    </script>
</body>
</html>
"#
    )
}
