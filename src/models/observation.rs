use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// One parsed line from the QCLCD hourly observations file.
///
/// Measurement fields are optional: the source files mark missing values
/// with `M`, `-`, or an empty field. A line only becomes an observation at
/// all if its WBAN, date and time parse; anything else is skipped upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyObservation {
    pub wban: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub sky_condition: Option<String>,
    pub dry_bulb_celsius: Option<f32>,
    pub relative_humidity: Option<f32>,
    pub wind_speed: Option<f32>,
    pub station_pressure: Option<f32>,
}

impl HourlyObservation {
    pub fn measured_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    pub fn has_measurements(&self) -> bool {
        self.dry_bulb_celsius.is_some()
            || self.wind_speed.is_some()
            || self.station_pressure.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measured_at_merges_date_and_time() {
        let obs = HourlyObservation {
            wban: "94846".to_string(),
            date: NaiveDate::from_ymd_opt(2015, 3, 1).unwrap(),
            time: NaiveTime::from_hms_opt(6, 54, 0).unwrap(),
            sky_condition: Some("OVC".to_string()),
            dry_bulb_celsius: Some(-2.8),
            relative_humidity: Some(82.0),
            wind_speed: Some(12.0),
            station_pressure: Some(29.21),
        };

        assert_eq!(
            obs.measured_at().format("%Y-%m-%d %H:%M").to_string(),
            "2015-03-01 06:54"
        );
        assert!(obs.has_measurements());
    }

    #[test]
    fn test_all_measurements_missing() {
        let obs = HourlyObservation {
            wban: "94846".to_string(),
            date: NaiveDate::from_ymd_opt(2015, 3, 1).unwrap(),
            time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            sky_condition: None,
            dry_bulb_celsius: None,
            relative_humidity: None,
            wind_speed: None,
            station_pressure: None,
        };

        assert!(!obs.has_measurements());
    }
}
