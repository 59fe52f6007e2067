//! Result of one acquisition cycle

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One timestamped set of greenhouse readings.
///
/// Setters are crate-private: the acquisition cycle fills a snapshot in, and
/// callers only ever see it read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    temperature: Option<f64>,
    #[serde(rename = "humidite1")]
    humidity_1: Option<f64>,
    #[serde(rename = "humidite2")]
    humidity_2: Option<f64>,
    #[serde(rename = "humidite3")]
    humidity_3: Option<f64>,
    #[serde(rename = "humiditeSol")]
    average_humidity: Option<f64>,
    timestamp: DateTime<Utc>,
}

impl Snapshot {
    /// Empty snapshot stamped with the current time
    pub fn new() -> Self {
        Self {
            temperature: None,
            humidity_1: None,
            humidity_2: None,
            humidity_3: None,
            average_humidity: None,
            timestamp: Utc::now(),
        }
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    /// Humidity channels 1 to 3 in percent
    pub fn humidities(&self) -> [Option<f64>; 3] {
        [self.humidity_1, self.humidity_2, self.humidity_3]
    }

    /// Mean of the three humidity channels, once all of them are set
    pub fn average_humidity(&self) -> Option<f64> {
        self.average_humidity
    }

    /// Time of the last update
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Whether every reading has been set
    pub fn is_complete(&self) -> bool {
        self.temperature.is_some() && self.average_humidity.is_some()
    }

    pub(crate) fn set_temperature(&mut self, value: f64) {
        self.temperature = Some(value);
        self.touch();
    }

    /// Set all humidity channels at once and recompute the average
    pub(crate) fn set_humidities(&mut self, h1: f64, h2: f64, h3: f64) {
        self.humidity_1 = Some(h1);
        self.humidity_2 = Some(h2);
        self.humidity_3 = Some(h3);
        self.recompute_average();
        self.touch();
    }

    fn recompute_average(&mut self) {
        self.average_humidity = match self.humidities() {
            [Some(h1), Some(h2), Some(h3)] => Some((h1 + h2 + h3) / 3.0),
            _ => None,
        };
    }

    fn touch(&mut self) {
        // Keep the timestamp monotonic even if the wall clock steps back
        self.timestamp = Utc::now().max(self.timestamp);
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_snapshot_is_empty() {
        let s = Snapshot::new();
        assert_eq!(s.temperature(), None);
        assert_eq!(s.humidities(), [None, None, None]);
        assert_eq!(s.average_humidity(), None);
        assert!(!s.is_complete());
    }

    #[test]
    fn average_of_three_channels() {
        let mut s = Snapshot::new();
        s.set_humidities(40.0, 50.0, 60.0);
        assert_eq!(s.average_humidity(), Some(50.0));
        assert_eq!(s.humidities(), [Some(40.0), Some(50.0), Some(60.0)]);
    }

    #[test]
    fn average_waits_for_humidities() {
        let mut s = Snapshot::new();
        s.set_temperature(20.0);
        assert_eq!(s.average_humidity(), None);
        assert!(!s.is_complete());

        s.set_humidities(30.0, 45.0, 60.0);
        assert_eq!(s.average_humidity(), Some(45.0));

        // A second call recomputes the mean
        s.set_humidities(30.0, 90.0, 60.0);
        assert_eq!(s.average_humidity(), Some(60.0));
    }

    #[test]
    fn setters_refresh_timestamp() {
        let mut s = Snapshot::new();
        let created = s.timestamp();
        std::thread::sleep(std::time::Duration::from_millis(5));
        s.set_temperature(21.0);
        let after_temp = s.timestamp();
        assert!(after_temp > created);

        std::thread::sleep(std::time::Duration::from_millis(5));
        s.set_humidities(1.0, 2.0, 3.0);
        assert!(s.timestamp() > after_temp);
        assert!(s.is_complete());
    }

    #[test]
    fn serializes_with_dashboard_field_names() {
        let mut s = Snapshot::new();
        s.set_temperature(22.5);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["temperature"], 22.5);
        assert!(json["humidite1"].is_null());
        assert!(json["humidite2"].is_null());
        assert!(json["humidite3"].is_null());
        assert!(json["humiditeSol"].is_null());
        let ts = json["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }
}
