use crate::config::LoaderConfig;
use crate::error::Result;
use crate::models::WeatherRow;
use crate::processors::joiner::JoinedStream;
use crate::processors::report::{LoadReport, PipelineCounters};
use crate::readers::{ObservationReader, StationReader};
use crate::utils::constants::DEFAULT_CHANNEL_CAPACITY;
use crate::utils::progress::ProgressReporter;
use crate::writers::batch_sink::{BatchConfig, BatchingSink, BulkWriter, RetryPolicy};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// The full load pipeline: station index, observation stream, join,
/// convert, batching sink.
///
/// Parsing, joining and converting run on one blocking task feeding a
/// bounded channel; the sink consumes the channel and performs the bulk
/// writes. Backpressure from slow writes propagates to the parser through
/// the channel bound.
pub struct Pipeline {
    batch: BatchConfig,
    retry: RetryPolicy,
    channel_capacity: usize,
    counters: Arc<PipelineCounters>,
    progress: Option<Arc<ProgressReporter>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            batch: BatchConfig::default(),
            retry: RetryPolicy::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            counters: Arc::new(PipelineCounters::new()),
            progress: None,
        }
    }

    pub fn from_config(config: &LoaderConfig) -> Self {
        Self::new()
            .with_batch_rows(config.max_batch_rows)
            .with_batch_latency(config.batch_latency())
            .with_retry_policy(RetryPolicy {
                max_retries: config.write_retries,
                backoff: config.retry_backoff(),
            })
    }

    pub fn with_batch_rows(mut self, max_rows: usize) -> Self {
        self.batch.max_rows = max_rows;
        self
    }

    pub fn with_batch_latency(mut self, max_latency: std::time::Duration) -> Self {
        self.batch.max_latency = max_latency;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    /// Run the pipeline to completion and return the final accounting.
    pub async fn run<W>(
        &self,
        stations_path: &Path,
        observations_path: &Path,
        writer: W,
    ) -> Result<LoadReport>
    where
        W: BulkWriter + Send + 'static,
    {
        if let Some(p) = &self.progress {
            p.set_message("Loading station index...");
        }

        let stations = stations_path.to_path_buf();
        let index =
            tokio::task::spawn_blocking(move || StationReader::new().load_index(&stations))
                .await??;

        let stations_loaded = index.len() as u64;
        let station_skips = index.skipped();
        info!(
            stations = stations_loaded,
            skipped = station_skips,
            "station index ready"
        );

        if let Some(p) = &self.progress {
            p.set_message(&format!(
                "Streaming observations ({} stations indexed)...",
                stations_loaded
            ));
        }

        let (tx, rx) = mpsc::channel::<WeatherRow>(self.channel_capacity);

        let index = Arc::new(index);
        let counters = Arc::clone(&self.counters);
        let progress = self.progress.clone();
        let observations = observations_path.to_path_buf();

        let producer = tokio::task::spawn_blocking(move || -> Result<()> {
            let stream = ObservationReader::new().stream(&observations)?;
            let joined = JoinedStream::new(stream, index, Arc::clone(&counters));

            for record in joined {
                let record = record?;
                let row = WeatherRow::from_record(&record);
                counters.record_converted();
                if let Some(p) = &progress {
                    p.increment(1);
                }

                // The sink dropped the receiver, which only happens after
                // a fatal write error; stop parsing and let the sink's
                // error surface.
                if tx.blocking_send(row).is_err() {
                    break;
                }
            }

            Ok(())
        });

        let sink = BatchingSink::new(
            writer,
            self.batch.clone(),
            self.retry.clone(),
            Arc::clone(&self.counters),
        );
        let sink_result = sink.run(rx).await;
        let producer_result = producer.await?;

        sink_result?;
        producer_result?;

        if let Some(p) = &self.progress {
            p.finish_with_message(&format!(
                "Processed {} rows",
                self.counters.rows_written()
            ));
        }

        Ok(self.counters.snapshot(stations_loaded, station_skips))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoaderError;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    const STATION_HEADER: &str =
        "WBAN|WMO|CallSign|Name|State|Location|Latitude|Longitude|GroundHeight|StationHeight|TimeZone";
    const OBSERVATION_HEADER: &str =
        "WBAN,Date,Time,StationType,SkyCondition,DryBulbCelsius,RelativeHumidity,WindSpeed,StationPressure";

    #[derive(Default)]
    struct MemoryWriter {
        batches: Arc<Mutex<Vec<Vec<WeatherRow>>>>,
    }

    impl BulkWriter for MemoryWriter {
        async fn write_batch(&self, rows: &[WeatherRow]) -> Result<u64> {
            self.batches.lock().unwrap().push(rows.to_vec());
            Ok(rows.len() as u64)
        }
    }

    fn write_lines(header: &str, lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", header).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[tokio::test]
    async fn test_pipeline_joins_and_writes() {
        let stations = write_lines(
            STATION_HEADER,
            &["94846|72530|ORD|ORD|IL|CHICAGO O'HARE|41.995|-87.9336|662|674|-6"],
        );
        let observations = write_lines(
            OBSERVATION_HEADER,
            &[
                "94846,20150301,0654,0,OVC,-2.8,82,12,29.21",
                "99999,20150301,0654,0,CLR,5.0,50,3,30.01",
                "94846,20150301,0754,0,BKN,-2.2,80,10,29.25",
            ],
        );

        let writer = MemoryWriter::default();
        let batches = Arc::clone(&writer.batches);
        let report = Pipeline::new()
            .run(stations.path(), observations.path(), writer)
            .await
            .unwrap();

        assert_eq!(report.stations_loaded, 1);
        assert_eq!(report.lines_read, 3);
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.rows_converted, 2);
        assert_eq!(report.rows_written, 2);

        let batches = batches.lock().unwrap();
        let rows: Vec<_> = batches.iter().flatten().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.wban == "94846"));
        assert!(rows[0].measured_at < rows[1].measured_at);
    }

    #[tokio::test]
    async fn test_missing_observations_file_is_fatal() {
        let stations = write_lines(
            STATION_HEADER,
            &["94846|72530|ORD|ORD|IL|CHICAGO O'HARE|41.995|-87.9336|662|674|-6"],
        );

        let result = Pipeline::new()
            .run(
                stations.path(),
                Path::new("/nonexistent/hourly.txt"),
                MemoryWriter::default(),
            )
            .await;

        assert!(matches!(result, Err(LoaderError::Io(_))));
    }
}
