/// Input file delimiters
pub const STATION_FILE_DELIMITER: u8 = b'|';
pub const OBSERVATION_FILE_DELIMITER: u8 = b',';

/// Markers the QCLCD files use for missing measurement values
pub const MISSING_VALUE_MARKERS: [&str; 3] = ["M", "-", "*"];

/// Input timestamp formats
pub const OBSERVATION_DATE_FORMAT: &str = "%Y%m%d";
pub const OBSERVATION_TIME_FORMAT: &str = "%H%M";

/// Timestamp format used when encoding rows for COPY
pub const COPY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Batching defaults
pub const DEFAULT_BATCH_ROWS: usize = 80_000;
pub const DEFAULT_BATCH_LATENCY_MS: u64 = 2_000;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 8_192;

/// Database defaults
pub const DEFAULT_SCHEMA: &str = "weather";
pub const DEFAULT_TABLE: &str = "weather_data";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;

/// Write retry defaults
pub const DEFAULT_WRITE_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
