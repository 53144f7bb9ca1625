use crate::cli::args::{Cli, Commands};
use crate::config::LoaderConfig;
use crate::error::Result;
use crate::processors::{LoadReport, Pipeline};
use crate::utils::progress::ProgressReporter;
use crate::writers::{DiscardWriter, PostgresWriter};
use tracing_subscriber::EnvFilter;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose);

    let mut config = LoaderConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Load {
            stations,
            observations,
            database_url,
            schema,
            table,
            batch_rows,
            batch_latency_ms,
            write_retries,
            dry_run,
        } => {
            if let Some(url) = database_url {
                config.database_url = url;
            }
            if let Some(schema) = schema {
                config.schema = schema;
            }
            if let Some(table) = table {
                config.table = table;
            }
            if let Some(rows) = batch_rows {
                config.max_batch_rows = rows;
            }
            if let Some(latency) = batch_latency_ms {
                config.max_batch_latency_ms = latency;
            }
            if let Some(retries) = write_retries {
                config.write_retries = retries;
            }
            config.validate()?;

            let progress = ProgressReporter::new_spinner("Loading weather data...", cli.json);
            let pipeline = Pipeline::from_config(&config).with_progress(progress);

            let report = if dry_run {
                pipeline
                    .run(&stations, &observations, DiscardWriter)
                    .await?
            } else {
                let writer = PostgresWriter::connect(&config).await?;
                pipeline.run(&stations, &observations, writer).await?
            };

            print_report(&report, cli.json)?;
            if dry_run && !cli.json {
                println!("Dry run - no rows were written to the database");
            }
        }

        Commands::Validate {
            stations,
            observations,
        } => {
            let progress = ProgressReporter::new_spinner("Validating weather data...", cli.json);
            let report = Pipeline::from_config(&config)
                .with_progress(progress)
                .run(&stations, &observations, DiscardWriter)
                .await?;

            print_report(&report, cli.json)?;
            if !cli.json {
                println!("Validation complete - no rows were written");
            }
        }

        Commands::Setup {
            database_url,
            schema,
            table,
        } => {
            if let Some(url) = database_url {
                config.database_url = url;
            }
            if let Some(schema) = schema {
                config.schema = schema;
            }
            if let Some(table) = table {
                config.table = table;
            }

            let writer = PostgresWriter::connect(&config).await?;
            writer.ensure_table().await?;
            writer.close().await;

            println!("Destination {}.{} is ready", config.schema, config.table);
        }
    }

    Ok(())
}

fn print_report(report: &LoadReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("\n{}", report.summary());
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "qclcd_loader=debug"
        } else {
            "qclcd_loader=info"
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
