//! Target / adverse event enrichment: drug join, pairwise drug sets, overlap
//! counts, Fisher's exact test and FDR correction.

pub mod fdr;
pub mod fisher;
pub mod overlap;
pub mod pairwise;

use std::{cmp::Ordering, collections::BTreeSet};

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    config::Settings,
    data::{
        relations::{self, DrugRelation, MergeMode, SourceSpec},
        tables,
    },
    error::PipelineResult,
    exec::Executor,
};

use self::{
    fdr::FdrMethod,
    pairwise::{InteractionTable, PairwiseTables},
};

/// One corrected (adverse event, target) association.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationRow {
    pub adverse_event: String,
    pub target: String,
    pub overlap_len: u64,
    pub se_drug_len: u64,
    pub tg_drug_len: u64,
    pub p_value: f64,
    pub q_value: f64,
}

impl AssociationRow {
    pub fn is_accepted(&self) -> bool {
        fdr::is_accepted(self.q_value)
    }
}

/// An accepted association traced back to one contributing drug.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRow {
    pub drug: String,
    pub adverse_event: String,
    pub target: String,
    pub p_value: f64,
    pub q_value: f64,
    pub adr_sources: Vec<String>,
    pub target_sources: Vec<String>,
}

/// Output of one enrichment run.
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub interactions: InteractionTable,
    /// Every scored pair, in (adverse event, target) order.
    pub rows: Vec<AssociationRow>,
}

impl Enrichment {
    /// Accepted rows ordered by q-value, then adverse event, then target.
    pub fn accepted(&self) -> Vec<AssociationRow> {
        let mut accepted: Vec<AssociationRow> = self
            .rows
            .iter()
            .filter(|r| r.is_accepted())
            .cloned()
            .collect();
        accepted.sort_by(|a, b| {
            a.q_value
                .partial_cmp(&b.q_value)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.adverse_event.cmp(&b.adverse_event))
                .then_with(|| a.target.cmp(&b.target))
        });
        accepted
    }

    /// Join accepted pairs back to every drug that exhibits the adverse event
    /// and hits the target, with the databases behind each side.
    pub fn traceability(
        &self,
        adverse_events: &DrugRelation,
        targets: &DrugRelation,
    ) -> Vec<TraceRow> {
        let accepted = self.accepted();
        let mut out = Vec::new();
        for joined in self.interactions.rows() {
            for row in &accepted {
                let has_event = joined.adverse_events.binary_search(&row.adverse_event).is_ok();
                let has_target = joined.targets.binary_search(&row.target).is_ok();
                if !(has_event && has_target) {
                    continue;
                }
                let collect = |sources: Option<&BTreeSet<String>>| {
                    sources
                        .map(|s| s.iter().cloned().collect::<Vec<_>>())
                        .unwrap_or_default()
                };
                out.push(TraceRow {
                    drug: joined.drug.clone(),
                    adverse_event: row.adverse_event.clone(),
                    target: row.target.clone(),
                    p_value: row.p_value,
                    q_value: row.q_value,
                    adr_sources: collect(adverse_events.sources(&joined.drug, &row.adverse_event)),
                    target_sources: collect(targets.sources(&joined.drug, &row.target)),
                });
            }
        }
        out.sort_by(|a, b| {
            a.drug
                .cmp(&b.drug)
                .then_with(|| a.adverse_event.cmp(&b.adverse_event))
                .then_with(|| a.target.cmp(&b.target))
        });
        out
    }
}

/// Run the whole enrichment pipeline in memory.
pub fn analyse(
    adverse_events: &DrugRelation,
    targets: &DrugRelation,
    method: FdrMethod,
    exec: &Executor,
) -> PipelineResult<Enrichment> {
    let interactions = InteractionTable::join(adverse_events, targets)?;
    let pairwise = PairwiseTables::build(&interactions);

    let overlaps = overlap::count_overlaps(&interactions, &pairwise, exec)?;
    info!(pairs = overlaps.len(), "counted shared drugs");

    let scored = fisher::score(&overlaps, interactions.n_drugs() as u64, exec)?;
    let p_values: Vec<f64> = scored.iter().map(|s| s.p_value).collect();
    let q_values = fdr::q_values(&p_values, method)?;

    let rows: Vec<AssociationRow> = scored
        .into_iter()
        .zip(q_values)
        .map(|(s, q_value)| AssociationRow {
            adverse_event: s.overlap.adverse_event,
            target: s.overlap.target,
            overlap_len: s.overlap.overlap_len,
            se_drug_len: s.overlap.se_drug_len,
            tg_drug_len: s.overlap.tg_drug_len,
            p_value: s.p_value,
            q_value,
        })
        .collect();
    info!(
        pairs = rows.len(),
        accepted = rows.iter().filter(|r| r.is_accepted()).count(),
        ?method,
        "corrected association p-values"
    );
    Ok(Enrichment {
        interactions,
        rows,
    })
}

/// One enrichment run over files on disk.
#[derive(Debug, Clone)]
pub struct EnrichJob {
    pub adverse_events: Vec<SourceSpec>,
    pub targets: Vec<SourceSpec>,
    pub adr_merge: MergeMode,
    pub label: String,
    pub method: FdrMethod,
    pub workers: usize,
}

pub async fn compute(settings: &Settings, job: EnrichJob) -> Result<()> {
    let adverse_events = relations::load_relations(&job.adverse_events, job.adr_merge)
        .context("loading drug -> adverse event relations")?;
    let targets = relations::load_relations(&job.targets, MergeMode::Union)
        .context("loading drug -> target relations")?;
    info!(
        label = %job.label,
        adr_drugs = adverse_events.n_drugs(),
        target_drugs = targets.n_drugs(),
        merge = ?job.adr_merge,
        "merged relations"
    );

    let (enrichment, trace) = tokio::task::spawn_blocking({
        let method = job.method;
        let workers = job.workers;
        move || -> Result<(Enrichment, Vec<TraceRow>)> {
            let exec = Executor::new(workers)?;
            let enrichment = analyse(&adverse_events, &targets, method, &exec)?;
            let trace = enrichment.traceability(&adverse_events, &targets);
            Ok((enrichment, trace))
        }
    })
    .await
    .context("enrichment worker panicked")??;

    let label = &job.label;
    tables::write_pvalues(
        &settings.join_output(format!("pvalues_{label}.tsv")),
        &enrichment.rows,
    )?;
    tables::write_qvalues(
        &settings.join_output(format!("qvalues_{label}.tsv")),
        &enrichment.rows,
    )?;
    tables::write_accepted(
        &settings.join_output(format!("accepted_{label}.tsv")),
        &enrichment.accepted(),
    )?;
    tables::write_traceability(
        &settings.join_output(format!("traceability_{label}.tsv")),
        &trace,
    )?;
    Ok(())
}
