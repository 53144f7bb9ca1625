use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{HourlyObservation, Station};

/// An hourly observation joined with its matching station.
///
/// Only produced for observations whose WBAN is present in the station
/// index, so `station.wban == wban` always holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub wban: String,
    pub station: Station,
    pub measured_at: NaiveDateTime,
    pub sky_condition: Option<String>,
    pub dry_bulb_celsius: Option<f32>,
    pub relative_humidity: Option<f32>,
    pub wind_speed: Option<f32>,
    pub station_pressure: Option<f32>,
}

impl WeatherRecord {
    pub fn from_parts(station: Station, observation: HourlyObservation) -> Self {
        Self {
            wban: observation.wban,
            measured_at: observation.date.and_time(observation.time),
            sky_condition: observation.sky_condition,
            dry_bulb_celsius: observation.dry_bulb_celsius,
            relative_humidity: observation.relative_humidity,
            wind_speed: observation.wind_speed,
            station_pressure: observation.station_pressure,
            station,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn test_from_parts_carries_station() {
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

        assert_eq!(record.wban, record.station.wban);
        assert_eq!(record.station.name, "ORD");
        assert_eq!(record.dry_bulb_celsius, Some(-2.8));
    }
}
