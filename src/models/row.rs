use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::WeatherRecord;

/// The storage representation of a joined observation, matching the
/// destination table column for column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRow {
    pub wban: String,
    pub measured_at: NaiveDateTime,
    pub temperature: Option<f32>,
    pub wind_speed: Option<f32>,
    pub station_pressure: Option<f32>,
    pub sky_condition: Option<String>,
}

impl WeatherRow {
    /// Destination column names, in insert order.
    pub const COLUMNS: [&'static str; 6] = [
        "wban",
        "measured_at",
        "temperature",
        "wind_speed",
        "station_pressure",
        "sky_condition",
    ];

    /// Convert a joined record into its storage row. Pure field mapping;
    /// station descriptive data beyond the WBAN is not persisted.
    pub fn from_record(record: &WeatherRecord) -> Self {
        Self {
            wban: record.wban.clone(),
            measured_at: record.measured_at,
            temperature: record.dry_bulb_celsius,
            wind_speed: record.wind_speed,
            station_pressure: record.station_pressure,
            sky_condition: record.sky_condition.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HourlyObservation, Station};
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn test_from_record_maps_all_columns() {
        let station = Station::new(
            "94846".to_string(),
            "ORD".to_string(),
            "IL".to_string(),
            "CHICAGO O'HARE INTERNATIONAL AIRPORT".to_string(),
            Some(41.995),
            Some(-87.9336),
            Some(662),
            Some(-6),
        );
        let observation = HourlyObservation {
            wban: "94846".to_string(),
            date: NaiveDate::from_ymd_opt(2015, 3, 1).unwrap(),
            time: NaiveTime::from_hms_opt(6, 54, 0).unwrap(),
            sky_condition: Some("OVC".to_string()),
            dry_bulb_celsius: Some(-2.8),
            relative_humidity: Some(82.0),
            wind_speed: Some(12.0),
            station_pressure: Some(29.21),
        };
        let record = WeatherRecord::from_parts(station, observation);

        let row = WeatherRow::from_record(&record);

        assert_eq!(row.wban, "94846");
        assert_eq!(row.temperature, Some(-2.8));
        assert_eq!(row.wind_speed, Some(12.0));
        assert_eq!(row.station_pressure, Some(29.21));
        assert_eq!(row.sky_condition.as_deref(), Some("OVC"));
    }

    #[test]
    fn test_missing_measurements_stay_null() {
        let station = Station::new(
            "94846".to_string(),
            "ORD".to_string(),
            "IL".to_string(),
            String::new(),
            None,
            None,
            None,
            None,
        );
        let observation = HourlyObservation {
            wban: "94846".to_string(),
            date: NaiveDate::from_ymd_opt(2015, 3, 1).unwrap(),
            time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            sky_condition: None,
            dry_bulb_celsius: None,
            relative_humidity: None,
            wind_speed: None,
            station_pressure: None,
        };
        let record = WeatherRecord::from_parts(station, observation);

        let row = WeatherRow::from_record(&record);

        assert_eq!(row.temperature, None);
        assert_eq!(row.wind_speed, None);
        assert_eq!(row.station_pressure, None);
        assert_eq!(row.sky_condition, None);
    }
}
