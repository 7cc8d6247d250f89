//! Cartographer CLI - dependency maps for Python repositories.
//!
//! Usage:
//!   cartographer scan [PATH] [--prune]   # Scan and store a graph
//!   cartographer map <ID>                # Layout + styling as JSON
//!   cartographer mri <ID> [--force]      # AI findings + report
//!   cartographer stats <ID>              # Graph statistics
//!   cartographer risk <ID>               # Markdown risk report
//!   cartographer context <ID> <MODULE>   # Module neighbourhood
//!   cartographer graphs                  # Stored scans

use anyhow::Result;
use clap::Parser;

use cartographer::cli::{execute, Cli};

#[tokio::main]
async fn main() {
    // Logs on stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = execute(&cli).await?;
    println!("{}", output);
    Ok(())
}
