use std::path::PathBuf;

use clap::Parser;
use herald::{Herald, find_config_file};

#[cfg(not(unix))]
compile_error!("Only unix is currently supported");

/// Consume queued emails, deliver them and serve lookups over gRPC
#[derive(Parser, Debug)]
#[command(name = "herald", version, about, long_about = None)]
struct Cli {
    /// Path to the RON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = find_config_file(cli.config)?;
    let herald = Herald::from_path(&config_path)?;

    herald.run().await
}
