pub mod batch_sink;
pub mod postgres_writer;

pub use batch_sink::{BatchConfig, BatchingSink, BulkWriter, DiscardWriter, RetryPolicy};
pub use postgres_writer::PostgresWriter;
