use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use crate::models::WeatherRow;
use crate::utils::constants::COPY_TIMESTAMP_FORMAT;
use crate::writers::batch_sink::BulkWriter;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Bulk writer backed by a Postgres connection pool.
///
/// Each batch goes to the server as a single `COPY ... FROM STDIN`
/// operation, so a batch commits or fails as a unit. The connection used
/// by a flush is acquired from the pool for just that flush and returns
/// to the pool when the guard drops, on success and failure alike.
pub struct PostgresWriter {
    pool: PgPool,
    schema: String,
    table: String,
    copy_statement: String,
}

impl PostgresWriter {
    pub async fn connect(config: &LoaderConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self::with_pool(pool, &config.schema, &config.table))
    }

    pub fn with_pool(pool: PgPool, schema: &str, table: &str) -> Self {
        let copy_statement = format!(
            r#"COPY "{}"."{}" ({}) FROM STDIN WITH (FORMAT csv)"#,
            schema,
            table,
            WeatherRow::COLUMNS.join(", ")
        );

        Self {
            pool,
            schema: schema.to_string(),
            table: table.to_string(),
            copy_statement,
        }
    }

    /// Create the destination schema and table if they do not exist.
    pub async fn ensure_table(&self) -> Result<()> {
        for statement in self.setup_sql().split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed).execute(&self.pool).await?;
            }
        }

        info!(schema = %self.schema, table = %self.table, "destination table ready");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn setup_sql(&self) -> String {
        format!(
            r#"
            CREATE SCHEMA IF NOT EXISTS "{schema}";
            CREATE TABLE IF NOT EXISTS "{schema}"."{table}" (
                wban TEXT NOT NULL,
                measured_at TIMESTAMP NOT NULL,
                temperature REAL,
                wind_speed REAL,
                station_pressure REAL,
                sky_condition TEXT
            )
            "#,
            schema = self.schema,
            table = self.table
        )
    }

    /// Encode a batch as CSV for the COPY payload. Empty unquoted fields
    /// are read back as NULL by the server.
    fn encode_batch(rows: &[WeatherRow]) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        for row in rows {
            writer.write_record([
                row.wban.as_str(),
                &row.measured_at.format(COPY_TIMESTAMP_FORMAT).to_string(),
                &encode_measurement(row.temperature),
                &encode_measurement(row.wind_speed),
                &encode_measurement(row.station_pressure),
                row.sky_condition.as_deref().unwrap_or(""),
            ])?;
        }

        writer
            .into_inner()
            .map_err(|e| LoaderError::InvalidFormat(format!("CSV encoding failed: {}", e)))
    }
}

impl BulkWriter for PostgresWriter {
    async fn write_batch(&self, rows: &[WeatherRow]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let payload = Self::encode_batch(rows)?;

        let mut conn = self.pool.acquire().await?;
        let mut copy = conn.copy_in_raw(&self.copy_statement).await?;
        copy.send(payload.as_slice()).await?;
        let written = copy.finish().await?;

        Ok(written)
    }
}

fn encode_measurement(value: Option<f32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
