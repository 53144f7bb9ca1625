use crate::error::{LoaderError, Result};
use crate::models::WeatherRow;
use crate::processors::report::PipelineCounters;
use crate::utils::constants::{
    DEFAULT_BATCH_LATENCY_MS, DEFAULT_BATCH_ROWS, DEFAULT_RETRY_BACKOFF_MS, DEFAULT_WRITE_RETRIES,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

/// Destination for one batch of rows.
///
/// A write is all-or-nothing: either every row in the batch is committed
/// or the call fails as a unit and may be retried with the same rows.
pub trait BulkWriter {
    fn write_batch(&self, rows: &[WeatherRow]) -> impl Future<Output = Result<u64>> + Send;
}

/// Accepts every batch without persisting anything. Backs the validate
/// and dry-run paths, where only the counters matter.
pub struct DiscardWriter;

impl BulkWriter for DiscardWriter {
    async fn write_batch(&self, rows: &[WeatherRow]) -> Result<u64> {
        Ok(rows.len() as u64)
    }
}

/// Size-or-time window bounding a batch.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Row count ceiling; a batch never grows past this.
    pub max_rows: usize,
    /// Wall-clock ceiling measured from the first row in the batch.
    pub max_latency: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_BATCH_ROWS,
            max_latency: Duration::from_millis(DEFAULT_BATCH_LATENCY_MS),
        }
    }
}

/// Bounded retry with exponential backoff for failed batch writes.
/// `max_retries = 0` fails on the first error.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_WRITE_RETRIES,
            backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

/// Accumulates rows from the pipeline channel into bounded batches and
/// executes one bulk write per batch.
///
/// The window is an explicit two-threshold state machine: a buffer plus a
/// deadline armed when the buffer goes from empty to non-empty. A flush
/// triggers when the buffer reaches `max_rows` OR the deadline elapses,
/// whichever comes first. When the channel closes, any sub-threshold
/// remainder is flushed before the sink finishes.
pub struct BatchingSink<W> {
    writer: W,
    config: BatchConfig,
    retry: RetryPolicy,
    counters: Arc<PipelineCounters>,
}

impl<W: BulkWriter> BatchingSink<W> {
    pub fn new(
        writer: W,
        config: BatchConfig,
        retry: RetryPolicy,
        counters: Arc<PipelineCounters>,
    ) -> Self {
        Self {
            writer,
            config,
            retry,
            counters,
        }
    }

    pub async fn run(self, mut rx: mpsc::Receiver<WeatherRow>) -> Result<()> {
        let mut batch: Vec<WeatherRow> = Vec::with_capacity(self.config.max_rows);
        let mut deadline = Instant::now();

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(row) => {
                        if batch.is_empty() {
                            deadline = Instant::now() + self.config.max_latency;
                        }
                        batch.push(row);
                        if batch.len() >= self.config.max_rows {
                            self.flush(&mut batch).await?;
                        }
                    }
                    None => {
                        if !batch.is_empty() {
                            self.flush(&mut batch).await?;
                        }
                        return Ok(());
                    }
                },
                _ = sleep_until(deadline), if !batch.is_empty() => {
                    self.flush(&mut batch).await?;
                }
            }
        }
    }

    async fn flush(&self, batch: &mut Vec<WeatherRow>) -> Result<()> {
        let rows = std::mem::take(batch);
        let mut attempt: u32 = 0;

        loop {
            match self.writer.write_batch(&rows).await {
                Ok(written) => {
                    self.counters.record_flush(written);
                    debug!(rows = written, "flushed batch");
                    return Ok(());
                }
                Err(e) if attempt < self.retry.max_retries => {
                    attempt += 1;
                    self.counters.record_retry();
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        attempt,
                        rows = rows.len(),
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "batch write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    self.counters.record_failed_batch();
                    return Err(LoaderError::BatchWrite {
                        rows: rows.len(),
                        attempts: attempt + 1,
                        source: Box::new(e),
                    });
                }
            }
        }
    }
}
