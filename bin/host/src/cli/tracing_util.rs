//! Utilities for the host's tracing subscriber.

use anyhow::Result;
use tracing::Level;

/// Initializes the global tracing subscriber, with the maximum level derived
/// from the `-v` flag count.
pub fn init_tracing_subscriber(verbosity_level: u8) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(match verbosity_level {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(Into::into)
}
