use crate::error::{LoaderError, Result};
use crate::models::Station;
use crate::utils::constants::{MISSING_VALUE_MARKERS, STATION_FILE_DELIMITER};
use std::collections::HashMap;
use std::path::Path;
use validator::Validate;

/// The in-memory station lookup table, keyed by WBAN.
///
/// Built once before the observation stream starts and never mutated
/// afterward, so the join stage can read it without locking.
#[derive(Debug)]
pub struct StationIndex {
    stations: HashMap<String, Station>,
    skipped: u64,
}

impl StationIndex {
    /// Build an index from already-parsed stations.
    pub fn from_stations(stations: HashMap<String, Station>) -> Self {
        Self {
            stations,
            skipped: 0,
        }
    }

    pub fn get(&self, wban: &str) -> Option<&Station> {
        self.stations.get(wban)
    }

    pub fn contains(&self, wban: &str) -> bool {
        self.stations.contains_key(wban)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Records dropped while reading the station file.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

pub struct StationReader {
    delimiter: u8,
}

impl StationReader {
    pub fn new() -> Self {
        Self {
            delimiter: STATION_FILE_DELIMITER,
        }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Read station metadata in file order. Malformed records are skipped,
    /// an unreadable file is fatal.
    pub fn read_stations(&self, path: &Path) -> Result<Vec<Station>> {
        let (stations, _skipped) = self.read_inner(path)?;
        Ok(stations)
    }

    /// Build the WBAN lookup table. Duplicate identifiers are
    /// last-write-wins, matching file order.
    pub fn load_index(&self, path: &Path) -> Result<StationIndex> {
        let (stations, skipped) = self.read_inner(path)?;
        let mut map = HashMap::with_capacity(stations.len());

        for station in stations {
            map.insert(station.wban.clone(), station);
        }

        Ok(StationIndex {
            stations: map,
            skipped,
        })
    }

    fn read_inner(&self, path: &Path) -> Result<(Vec<Station>, u64)> {
        let file = std::fs::File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let columns = StationColumns::resolve(reader.headers()?)?;

        let mut stations = Vec::new();
        let mut skipped = 0u64;

        for record in reader.records() {
            let record = match record {
                Ok(record) => record,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(_) => {
                    skipped += 1;
                    continue;
                }
            };

            match columns.parse_record(&record) {
                Some(station) => stations.push(station),
                None => skipped += 1,
            }
        }

        Ok((stations, skipped))
    }
}

impl Default for StationReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Column positions resolved from the station file header.
struct StationColumns {
    wban: usize,
    name: usize,
    state: usize,
    location: usize,
    latitude: usize,
    longitude: usize,
    ground_height: usize,
    time_zone: usize,
}

impl StationColumns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    LoaderError::InvalidFormat(format!("station file has no '{}' column", name))
                })
        };

        Ok(Self {
            wban: find("WBAN")?,
            name: find("Name")?,
            state: find("State")?,
            location: find("Location")?,
            latitude: find("Latitude")?,
            longitude: find("Longitude")?,
            ground_height: find("GroundHeight")?,
            time_zone: find("TimeZone")?,
        })
    }

    /// Parse a single station record. Returns `None` for records that
    /// should be skipped.
    fn parse_record(&self, record: &csv::StringRecord) -> Option<Station> {
        let wban = record.get(self.wban)?.trim();
        if wban.is_empty() {
            return None;
        }

        let latitude = parse_optional_field(record.get(self.latitude)?)?;
        let longitude = parse_optional_field(record.get(self.longitude)?)?;
        let ground_height = parse_optional_field(record.get(self.ground_height)?)?;
        let time_zone = parse_optional_field(record.get(self.time_zone)?)?;

        let station = Station::new(
            wban.to_string(),
            record.get(self.name)?.trim().to_string(),
            record.get(self.state)?.trim().to_string(),
            record.get(self.location)?.trim().to_string(),
            latitude,
            longitude,
            ground_height,
            time_zone,
        );

        // Out-of-range coordinates disqualify the record, not the run.
        station.validate().ok().map(|_| station)
    }
}

/// Parse an optional numeric field: missing markers become `Ok(None)`,
/// anything else must parse. The outer `Option` is the skip signal.
fn parse_optional_field<T: std::str::FromStr>(raw: &str) -> Option<Option<T>> {
    let raw = raw.trim();
    if raw.is_empty() || MISSING_VALUE_MARKERS.contains(&raw) {
        return Some(None);
    }
    raw.parse::<T>().ok().map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "WBAN|WMO|CallSign|Name|State|Location|Latitude|Longitude|GroundHeight|StationHeight|TimeZone";

    fn write_stations(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_read_stations_file() -> Result<()> {
        let file = write_stations(&[
            "94846|72530|ORD|ORD|IL|CHICAGO O'HARE INTERNATIONAL AIRPORT|41.995|-87.9336|662|674|-6",
            "03017|72565|DEN|DEN|CO|DENVER INTERNATIONAL AIRPORT|39.8328|-104.6575|5404|5431|-7",
        ]);

        let reader = StationReader::new();
        let stations = reader.read_stations(file.path())?;

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].wban, "94846");
        assert_eq!(stations[0].name, "ORD");
        assert_eq!(stations[0].latitude, Some(41.995));
        assert_eq!(stations[1].wban, "03017");
        assert_eq!(stations[1].time_zone, Some(-7));

        Ok(())
    }

    #[test]
    fn test_load_index_keys_by_wban() -> Result<()> {
        let file = write_stations(&[
            "94846|72530|ORD|ORD|IL|CHICAGO O'HARE INTERNATIONAL AIRPORT|41.995|-87.9336|662|674|-6",
        ]);

        let index = StationReader::new().load_index(file.path())?;

        assert_eq!(index.len(), 1);
        assert!(index.contains("94846"));
        assert_eq!(index.get("94846").unwrap().wban, "94846");
        assert!(!index.contains("99999"));

        Ok(())
    }

    #[test]
    fn test_duplicate_wban_last_write_wins() -> Result<()> {
        let file = write_stations(&[
            "94846|72530|ORD|ORD|IL|FIRST|41.995|-87.9336|662|674|-6",
            "94846|72530|ORD|ORD|IL|SECOND|41.995|-87.9336|662|674|-6",
        ]);

        let index = StationReader::new().load_index(file.path())?;

        assert_eq!(index.len(), 1);
        assert_eq!(index.get("94846").unwrap().location, "SECOND");

        Ok(())
    }

    #[test]
    fn test_malformed_records_are_skipped() -> Result<()> {
        let file = write_stations(&[
            "94846|72530|ORD|ORD|IL|CHICAGO O'HARE INTERNATIONAL AIRPORT|41.995|-87.9336|662|674|-6",
            "|72530|XXX|NO WBAN|IL|SOMEWHERE|0.0|0.0|0|0|-6",
            "03017|72565|DEN|DEN|CO|DENVER INTERNATIONAL AIRPORT|not-a-number|-104.6575|5404|5431|-7",
        ]);

        let index = StationReader::new().load_index(file.path())?;

        assert_eq!(index.len(), 1);
        assert_eq!(index.skipped(), 2);

        Ok(())
    }

    #[test]
    fn test_out_of_range_coordinates_are_skipped() -> Result<()> {
        let file = write_stations(&[
            "94846|72530|ORD|ORD|IL|CHICAGO O'HARE|41.995|-87.9336|662|674|-6",
            "11111|72530|BAD|BAD|XX|NOWHERE|95.0|-87.9336|0|0|-6",
        ]);

        let index = StationReader::new().load_index(file.path())?;

        assert_eq!(index.len(), 1);
        assert_eq!(index.skipped(), 1);

        Ok(())
    }

    #[test]
    fn test_missing_value_markers_become_none() -> Result<()> {
        let file =
            write_stations(&["94846|72530|ORD|ORD|IL|CHICAGO O'HARE|M|M|M|674|-6"]);

        let stations = StationReader::new().read_stations(file.path())?;

        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].latitude, None);
        assert_eq!(stations[0].longitude, None);
        assert_eq!(stations[0].ground_height, None);

        Ok(())
    }

    #[test]
    fn test_unreadable_file_is_fatal() {
        let reader = StationReader::new();
        let result = reader.read_stations(Path::new("/nonexistent/stations.txt"));

        assert!(result.is_err());
    }
}
