use clap::Parser;
use qclcd_loader::cli::{run, Cli};
use qclcd_loader::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
