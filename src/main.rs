mod cli;
mod engine;
mod model;
#[cfg(feature = "tui")]
mod orchestrator;
mod storage;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    match cli::run(args).await {
        // Propagate the external tool's exit code in headless modes.
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => Err(e),
    }
}
