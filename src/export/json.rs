//! JSON export

use crate::models::MeasurementEntry;

/// Render the full entry list as pretty-printed JSON
pub fn render(entries: &[MeasurementEntry]) -> String {
    // A measurement list always serializes; fall back to an empty array on
    // the impossible path rather than panic in an exporter
    serde_json::to_string_pretty(entries).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinkQuality;
    use std::time::Duration;

    #[test]
    fn test_empty_log_renders_empty_array() {
        assert_eq!(render(&[]), "[]");
    }

    #[test]
    fn test_structure_preserved() {
        let entries = vec![
            MeasurementEntry::new(1, Duration::from_millis(120), None, Some(LinkQuality { rssi: Some(-90), snr: None })),
            MeasurementEntry::new(2, Duration::from_millis(95), None, None),
        ];

        let out = render(&entries);
        let back: Vec<MeasurementEntry> = serde_json::from_str(&out).unwrap();
        assert_eq!(back, entries);
    }
}
