//! CLI entry-point for the disproportionality analysis.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{
    config::Settings,
    signals::{self, LlrJob},
};

/// Args for the `llr` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Tab separated `(report_id, drug, adverse_event)` rows with a header.
    #[arg(long)]
    pub input: PathBuf,
    /// Source database label attached to every output row (e.g. FAERS).
    #[arg(long)]
    pub database: String,
    /// Override the Monte Carlo seed.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Override the number of Gaussian samples per drug.
    #[arg(long)]
    pub samples: Option<usize>,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let job = LlrJob {
        input: settings.resolve_input(&args.input),
        database: args.database,
        sampler: settings.sampler(args.seed, args.samples),
        workers: settings.workers,
    };
    signals::compute(&settings, job).await
}
