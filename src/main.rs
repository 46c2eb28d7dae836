//! Entry point wiring CLI dispatch to the pipelines.

use anyhow::Result;
use tardis::{cli::Cli, config::Settings, logging};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing()?;
    let cli = Cli::parse();
    let settings = Settings::load()?;

    info!(?cli, "starting command");
    cli.dispatch(settings).await
}
