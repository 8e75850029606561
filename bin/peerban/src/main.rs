//! peerban binary.

use clap::Parser;
use peerban_node::{Cli, PeerbanConfig, launch, logging};
use tracing::info;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_logging(&cli.logs)?;

    let mut config = PeerbanConfig::load_or_create(&cli.config)?;
    config.apply_cli_args(&cli.client);
    info!(config = %cli.config.display(), version = env!("CARGO_PKG_VERSION"), "starting peerban");

    launch(config).await
}
