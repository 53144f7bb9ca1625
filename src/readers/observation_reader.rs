use crate::error::{LoaderError, Result};
use crate::models::HourlyObservation;
use crate::utils::constants::{
    MISSING_VALUE_MARKERS, OBSERVATION_DATE_FORMAT, OBSERVATION_FILE_DELIMITER,
    OBSERVATION_TIME_FORMAT,
};
use chrono::{NaiveDate, NaiveTime};
use std::fs::File;
use std::path::Path;

pub struct ObservationReader {
    delimiter: u8,
}

impl ObservationReader {
    pub fn new() -> Self {
        Self {
            delimiter: OBSERVATION_FILE_DELIMITER,
        }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Open a lazy stream over the observations file. One record is parsed
    /// per `next()` call, in file order; nothing is buffered beyond the
    /// current line.
    pub fn stream(&self, path: &Path) -> Result<ObservationStream> {
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let columns = ObservationColumns::resolve(reader.headers()?)?;

        Ok(ObservationStream {
            records: reader.into_records(),
            columns,
        })
    }
}

impl Default for ObservationReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Streaming iterator over observation lines.
///
/// Yields `Err(LoaderError::InvalidFormat)` for lines that fail to parse;
/// the consumer decides whether to count and skip them. I/O failures
/// surface as their own error variants and are fatal.
pub struct ObservationStream {
    records: csv::StringRecordsIntoIter<File>,
    columns: ObservationColumns,
}

impl Iterator for ObservationStream {
    type Item = Result<HourlyObservation>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Some(Err(e.into())),
            Err(e) => {
                return Some(Err(LoaderError::InvalidFormat(format!(
                    "unreadable observation line: {}",
                    e
                ))))
            }
        };

        Some(self.columns.parse_record(&record))
    }
}

/// Column positions resolved from the observations file header.
struct ObservationColumns {
    wban: usize,
    date: usize,
    time: usize,
    sky_condition: usize,
    dry_bulb_celsius: usize,
    relative_humidity: usize,
    wind_speed: usize,
    station_pressure: usize,
}

impl ObservationColumns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    LoaderError::InvalidFormat(format!(
                        "observations file has no '{}' column",
                        name
                    ))
                })
        };

        Ok(Self {
            wban: find("WBAN")?,
            date: find("Date")?,
            time: find("Time")?,
            sky_condition: find("SkyCondition")?,
            dry_bulb_celsius: find("DryBulbCelsius")?,
            relative_humidity: find("RelativeHumidity")?,
            wind_speed: find("WindSpeed")?,
            station_pressure: find("StationPressure")?,
        })
    }

    fn parse_record(&self, record: &csv::StringRecord) -> Result<HourlyObservation> {
        let field = |index: usize, name: &str| {
            record
                .get(index)
                .ok_or_else(|| LoaderError::InvalidFormat(format!("line is missing '{}'", name)))
        };

        let wban = field(self.wban, "WBAN")?.trim();
        if wban.is_empty() {
            return Err(LoaderError::InvalidFormat("line has an empty WBAN".into()));
        }

        let raw_date = field(self.date, "Date")?;
        let date = NaiveDate::parse_from_str(raw_date, OBSERVATION_DATE_FORMAT)
            .map_err(|_| LoaderError::InvalidFormat(format!("invalid date: '{}'", raw_date)))?;

        let raw_time = field(self.time, "Time")?;
        let time = NaiveTime::parse_from_str(raw_time, OBSERVATION_TIME_FORMAT)
            .map_err(|_| LoaderError::InvalidFormat(format!("invalid time: '{}'", raw_time)))?;

        let sky_condition = match field(self.sky_condition, "SkyCondition")?.trim() {
            raw if raw.is_empty() || MISSING_VALUE_MARKERS.contains(&raw) => None,
            raw => Some(raw.to_string()),
        };

        Ok(HourlyObservation {
            wban: wban.to_string(),
            date,
            time,
            sky_condition,
            dry_bulb_celsius: parse_measurement(field(self.dry_bulb_celsius, "DryBulbCelsius")?)?,
            relative_humidity: parse_measurement(field(
                self.relative_humidity,
                "RelativeHumidity",
            )?)?,
            wind_speed: parse_measurement(field(self.wind_speed, "WindSpeed")?)?,
            station_pressure: parse_measurement(field(self.station_pressure, "StationPressure")?)?,
        })
    }
}

/// Parse a measurement field: the QCLCD missing markers become `None`,
/// anything else must be numeric or the whole line is invalid.
fn parse_measurement(raw: &str) -> Result<Option<f32>> {
    let raw = raw.trim();
    if raw.is_empty() || MISSING_VALUE_MARKERS.contains(&raw) {
        return Ok(None);
    }
    raw.parse::<f32>()
        .map(Some)
        .map_err(|_| LoaderError::InvalidFormat(format!("invalid measurement: '{}'", raw)))
}
