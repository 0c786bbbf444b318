//! KML export

use crate::export::xml_escape;
use crate::models::MeasurementEntry;
use std::fmt::Write as _;

/// Render a KML document with a path LineString and one color-coded
/// Placemark per geolocated entry
pub fn render(entries: &[MeasurementEntry]) -> String {
    let mut kml = String::new();
    kml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    kml.push_str("<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n");
    kml.push_str("<Document>\n");
    kml.push_str("<name>Range Test Results</name>\n");

    // Icon colors are KML aabbggrr
    kml.push_str("<Style id=\"goodSignal\"><IconStyle><color>ff00ff00</color></IconStyle></Style>\n");
    kml.push_str("<Style id=\"okSignal\"><IconStyle><color>ff00ffff</color></IconStyle></Style>\n");
    kml.push_str("<Style id=\"poorSignal\"><IconStyle><color>ff0000ff</color></IconStyle></Style>\n");

    let geolocated: Vec<&MeasurementEntry> = entries.iter().filter(|e| e.has_gps()).collect();

    if geolocated.len() > 1 {
        kml.push_str("<Placemark>\n<name>Path</name>\n<LineString>\n<coordinates>\n");
        let coords: Vec<String> = geolocated
            .iter()
            .filter_map(|entry| entry.gps.as_ref())
            .map(|gps| format!("{},{},{}", gps.longitude, gps.latitude, gps.altitude.unwrap_or(0.0)))
            .collect();
        kml.push_str(&coords.join(" "));
        kml.push_str("\n</coordinates>\n</LineString>\n");
        kml.push_str("<Style><LineStyle><color>ff0000ff</color><width>3</width></LineStyle></Style>\n");
        kml.push_str("</Placemark>\n");
    }

    for entry in &geolocated {
        let gps = match entry.gps.as_ref() {
            Some(gps) => gps,
            None => continue,
        };

        let mut desc = format!(
            "RTT: {:.0}ms&lt;br/&gt;Time: {}",
            entry.rtt_ms(),
            xml_escape(&entry.timestamp.to_rfc3339())
        );
        if let Some(link) = &entry.link {
            if let Some(rssi) = link.rssi {
                let _ = write!(desc, "&lt;br/&gt;RSSI: {}dBm", rssi);
            }
            if let Some(snr) = link.snr {
                let _ = write!(desc, "&lt;br/&gt;SNR: {:.1}dB", snr);
            }
        }

        kml.push_str("<Placemark>\n");
        let _ = writeln!(kml, "<name>Ping #{}</name>", entry.sequence);
        let _ = writeln!(kml, "<description>{}</description>", desc);
        let _ = writeln!(kml, "<styleUrl>#{}</styleUrl>", entry.quality().kml_style());
        kml.push_str("<Point>\n");
        let _ = writeln!(
            kml,
            "<coordinates>{},{},{}</coordinates>",
            gps.longitude,
            gps.latitude,
            gps.altitude.unwrap_or(0.0)
        );
        kml.push_str("</Point>\n</Placemark>\n");
    }

    kml.push_str("</Document>\n</kml>\n");
    kml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GpsFix;
    use std::time::Duration;

    fn at(sequence: u64, rtt_ms: u64, lat: f64, lon: f64) -> MeasurementEntry {
        MeasurementEntry::new(
            sequence,
            Duration::from_millis(rtt_ms),
            Some(GpsFix {
                latitude: lat,
                longitude: lon,
                altitude: None,
                accuracy: None,
                speed: None,
                bearing: None,
            }),
            None,
        )
    }

    #[test]
    fn test_empty_log_has_document_without_placemarks() {
        let out = render(&[]);
        assert!(out.contains("<Document>"));
        assert!(!out.contains("<Placemark>"));
    }

    #[test]
    fn test_placemark_per_geolocated_entry() {
        let entries = vec![
            at(1, 120, 51.0, 0.1),
            MeasurementEntry::new(2, Duration::from_millis(90), None, None),
            at(3, 900, 51.1, 0.2),
            at(4, 2500, 51.2, 0.3),
        ];
        let out = render(&entries);

        // Three point placemarks plus the path line
        assert_eq!(out.matches("<Placemark>").count(), 4);
        assert_eq!(out.matches("<name>Path</name>").count(), 1);
        assert!(out.contains("#goodSignal"));
        assert!(out.contains("#okSignal"));
        assert!(out.contains("#poorSignal"));
    }

    #[test]
    fn test_path_points_follow_log_order() {
        let entries = vec![at(2, 100, 51.0, 0.1), at(1, 100, 52.0, 0.2)];
        let out = render(&entries);
        assert!(out.contains("0.1,51,0 0.2,52,0"));
    }

    #[test]
    fn test_single_point_has_no_path() {
        let out = render(&[at(1, 100, 51.0, 0.1)]);
        assert!(!out.contains("<LineString>"));
        assert_eq!(out.matches("<Placemark>").count(), 1);
    }
}
