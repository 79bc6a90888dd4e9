//! Main entrypoint for the host binary.

use anyhow::Result;
use clap::Parser;
use stele_host::{cli::init_tracing_subscriber, HostCli};
use tracing::info;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cfg = HostCli::parse();
    init_tracing_subscriber(cfg.v)?;
    cfg.check()?;

    info!(target: "host", "Starting preimage server");
    cfg.start().await?;

    info!(target: "host", "Exiting host program.");
    Ok(())
}
