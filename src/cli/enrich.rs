//! CLI entry-point for the target / adverse event enrichment.

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{
    config::Settings,
    data::relations::{MergeMode, SourceSpec},
    enrich::{self, fdr::FdrMethod, EnrichJob},
};

/// Args for the `enrich` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Drug -> adverse event files, `path` or `path:LABEL`.
    #[arg(long = "adr", required = true, num_args = 1..)]
    pub adverse_events: Vec<SourceSpec>,
    /// Drug -> target files, `path` or `path:LABEL`.
    #[arg(long = "target", required = true, num_args = 1..)]
    pub targets: Vec<SourceSpec>,
    /// How several adverse event sources are combined per drug.
    #[arg(long, value_enum, default_value_t = MergeMode::Union)]
    pub merge: MergeMode,
    /// Name used in the output file names (e.g. community, controlled).
    #[arg(long)]
    pub label: String,
    /// Multiple-testing correction.
    #[arg(long, value_enum, default_value_t = FdrMethod::Storey)]
    pub fdr: FdrMethod,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let resolve = |specs: Vec<SourceSpec>| -> Vec<SourceSpec> {
        specs
            .into_iter()
            .map(|spec| SourceSpec {
                path: settings.resolve_input(&spec.path),
                label: spec.label,
            })
            .collect()
    };
    let job = EnrichJob {
        adverse_events: resolve(args.adverse_events),
        targets: resolve(args.targets),
        adr_merge: args.merge,
        label: args.label,
        method: args.fdr,
        workers: settings.workers,
    };
    enrich::compute(&settings, job).await
}
