//! Forwarding service command-line entry point.

use clap::Parser;

use fwd_service::{options::CliOptions, start_service};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli_opts = CliOptions::parse();

    let service_opts = cli_opts
        .into_service_options()
        .map_err(|e| format!("Failed to parse options: {}", e))?;

    start_service(service_opts).await?;

    Ok(())
}
