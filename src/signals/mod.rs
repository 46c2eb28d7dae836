//! Disproportionality analysis: cross-table, logLR grid, Monte Carlo null and
//! the significance filter.

pub mod crosstab;
pub mod filter;
pub mod llr;
pub mod montecarlo;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::{
    config::Settings,
    data::{reports, tables},
    error::PipelineResult,
    exec::Executor,
};

use self::{
    crosstab::{CrossTable, Report},
    filter::LlrRecord,
    montecarlo::SamplerConfig,
};

/// One disproportionality run over a single source database.
#[derive(Debug, Clone)]
pub struct LlrJob {
    pub input: PathBuf,
    pub database: String,
    pub sampler: SamplerConfig,
    pub workers: usize,
}

/// Run the whole disproportionality pipeline in memory.
///
/// Every defined pair is returned with its verdict, sorted by drug then
/// adverse event.
pub fn analyse(
    reports: &[Report],
    sampler: &SamplerConfig,
    exec: &Executor,
    database: &str,
) -> PipelineResult<Vec<LlrRecord>> {
    let table = CrossTable::from_reports(reports)?;
    info!(
        drugs = table.n_drugs(),
        events = table.n_events(),
        reports = table.grand_total(),
        "built cross-table"
    );

    let (scores, undefined) = llr::score_grid(&table, exec)?;
    info!(defined = scores.len(), undefined, "scored logLR grid");

    let thresholds = montecarlo::sample_thresholds(&table, sampler, exec)?;
    info!(
        drugs = thresholds.len(),
        seed = sampler.seed,
        workers = exec.workers(),
        "sampled null thresholds"
    );

    let mut records = filter::judge(&table, &scores, &thresholds, database)?;
    records.sort_by(|a, b| {
        a.drug
            .cmp(&b.drug)
            .then_with(|| a.adverse_event.cmp(&b.adverse_event))
    });
    Ok(records)
}

pub async fn compute(settings: &Settings, job: LlrJob) -> Result<()> {
    let reports = reports::load_reports(&job.input)
        .with_context(|| format!("loading reports from {}", job.input.display()))?;
    if reports.is_empty() {
        warn!(path = %job.input.display(), "report table is empty");
    }

    let records = tokio::task::spawn_blocking({
        let job = job.clone();
        move || -> Result<Vec<LlrRecord>> {
            let exec = Executor::new(job.workers)?;
            Ok(analyse(&reports, &job.sampler, &exec, &job.database)?)
        }
    })
    .await
    .context("disproportionality worker panicked")??;

    let accepted = filter::significant(&records);
    info!(
        database = %job.database,
        pairs = records.len(),
        significant = accepted.len(),
        "disproportionality complete"
    );

    let full_path = settings.join_output(format!("llr_{}.tsv", job.database));
    tables::write_llr_table(&full_path, &records)?;
    let snapshot_path = settings.join_output(format!("llr_{}.parquet", job.database));
    tables::write_llr_parquet(&snapshot_path, &records)?;
    let accepted_path = settings.join_output(format!("significant_{}.tsv", job.database));
    tables::write_significant(&accepted_path, &accepted)?;
    Ok(())
}
