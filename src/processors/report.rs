use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters updated across the producer and sink sides of the
/// pipeline. Every dropped record is accounted for somewhere in here;
/// nothing is discarded silently.
#[derive(Debug, Default)]
pub struct PipelineCounters {
    lines_read: AtomicU64,
    parse_skips: AtomicU64,
    unmatched: AtomicU64,
    rows_converted: AtomicU64,
    rows_written: AtomicU64,
    batches_flushed: AtomicU64,
    batches_retried: AtomicU64,
    failed_batches: AtomicU64,
}

impl PipelineCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_line(&self) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_skip(&self) {
        self.parse_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unmatched(&self) {
        self.unmatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_converted(&self) {
        self.rows_converted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_flush(&self, rows: u64) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.rows_written.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.batches_retried.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_batch(&self) {
        self.failed_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rows_converted(&self) -> u64 {
        self.rows_converted.load(Ordering::Relaxed)
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written.load(Ordering::Relaxed)
    }

    /// Snapshot the counters into a report, together with the station
    /// index statistics gathered before the stream started.
    pub fn snapshot(&self, stations_loaded: u64, station_skips: u64) -> LoadReport {
        LoadReport {
            stations_loaded,
            station_skips,
            lines_read: self.lines_read.load(Ordering::Relaxed),
            parse_skips: self.parse_skips.load(Ordering::Relaxed),
            unmatched: self.unmatched.load(Ordering::Relaxed),
            rows_converted: self.rows_converted.load(Ordering::Relaxed),
            rows_written: self.rows_written.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            batches_retried: self.batches_retried.load(Ordering::Relaxed),
            failed_batches: self.failed_batches.load(Ordering::Relaxed),
        }
    }
}

/// Final accounting for one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub stations_loaded: u64,
    pub station_skips: u64,
    pub lines_read: u64,
    pub parse_skips: u64,
    pub unmatched: u64,
    pub rows_converted: u64,
    pub rows_written: u64,
    pub batches_flushed: u64,
    pub batches_retried: u64,
    pub failed_batches: u64,
}

impl LoadReport {
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Load Report ===\n");
        summary.push_str(&format!("Stations Loaded: {}\n", self.stations_loaded));
        if self.station_skips > 0 {
            summary.push_str(&format!("Station Records Skipped: {}\n", self.station_skips));
        }
        summary.push_str(&format!("Observation Lines Read: {}\n", self.lines_read));
        summary.push_str(&format!(
            "Invalid Lines Skipped: {} ({:.1}%)\n",
            self.parse_skips,
            self.percentage(self.parse_skips)
        ));
        summary.push_str(&format!(
            "Unmatched Stations: {} ({:.1}%)\n",
            self.unmatched,
            self.percentage(self.unmatched)
        ));
        summary.push_str(&format!("Rows Converted: {}\n", self.rows_converted));
        summary.push_str(&format!(
            "Rows Written: {} in {} batch(es)\n",
            self.rows_written, self.batches_flushed
        ));
        if self.batches_retried > 0 {
            summary.push_str(&format!("Batches Retried: {}\n", self.batches_retried));
        }
        if self.failed_batches > 0 {
            summary.push_str(&format!("Failed Batches: {}\n", self.failed_batches));
        }

        summary
    }

    fn percentage(&self, count: u64) -> f64 {
        if self.lines_read == 0 {
            0.0
        } else {
            100.0 * count as f64 / self.lines_read as f64
        }
    }
}
