use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "qclcd-loader")]
#[command(about = "Stream QCLCD weather observations into PostgreSQL")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Emit the load report as JSON")]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load station and observation files into the database
    Load {
        #[arg(short, long, help = "Station metadata file")]
        stations: PathBuf,

        #[arg(short, long, help = "Hourly observations file")]
        observations: PathBuf,

        #[arg(long, help = "Database connection URL")]
        database_url: Option<String>,

        #[arg(long, help = "Destination schema")]
        schema: Option<String>,

        #[arg(long, help = "Destination table")]
        table: Option<String>,

        #[arg(long, help = "Maximum rows per batch")]
        batch_rows: Option<usize>,

        #[arg(long, help = "Maximum batch accumulation time in milliseconds")]
        batch_latency_ms: Option<u64>,

        #[arg(long, help = "Retries per failed batch write")]
        write_retries: Option<u32>,

        #[arg(long, default_value = "false", help = "Parse and join without writing")]
        dry_run: bool,
    },

    /// Parse both files and report counters without touching the database
    Validate {
        #[arg(short, long, help = "Station metadata file")]
        stations: PathBuf,

        #[arg(short, long, help = "Hourly observations file")]
        observations: PathBuf,
    },

    /// Create the destination schema and table
    Setup {
        #[arg(long, help = "Database connection URL")]
        database_url: Option<String>,

        #[arg(long, help = "Destination schema")]
        schema: Option<String>,

        #[arg(long, help = "Destination table")]
        table: Option<String>,
    },
}
