//! Base-10 log-likelihood-ratio disproportionality statistic.

use crate::{
    error::{PipelineError, PipelineResult},
    exec::Executor,
};

use super::crosstab::CrossTable;

/// Result of scoring one (drug, adverse event) cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LlrOutcome {
    Defined(f64),
    /// The pair was never co-reported; no numeric statistic exists.
    Undefined,
}

impl LlrOutcome {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(v),
            Self::Undefined => None,
        }
    }
}

/// Score of a defined cell, addressed by canonical table positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairScore {
    pub drug: usize,
    pub event: usize,
    pub log_lr: f64,
}

/// Compute
/// `n_da (lg n_da - lg n_a) + n_d (lg n_d - lg(N - n_a)) - (n_da + n_d)(lg(n_da + n_d) - lg N)`.
///
/// `n_da` is the joint count, `n_a` the event margin, `n_d` the drug margin
/// and `n` the grand total.
pub fn log_likelihood_ratio(n_da: u64, n_a: u64, n_d: u64, n: u64) -> PipelineResult<LlrOutcome> {
    if n_da == 0 {
        return Ok(LlrOutcome::Undefined);
    }
    if n_da > n_a || n_da > n_d || n_a > n || n_d > n {
        return Err(PipelineError::invariant(format!(
            "joint count {n_da} inconsistent with margins (event {n_a}, drug {n_d}, total {n})"
        )));
    }
    let rest = n - n_a;
    if rest == 0 {
        return Err(PipelineError::invariant(format!(
            "log10 of non-positive argument: total {n} minus event margin {n_a}"
        )));
    }

    let (x, a, d, n, rest) = (n_da as f64, n_a as f64, n_d as f64, n as f64, rest as f64);
    let value = x * (x.log10() - a.log10()) + d * (d.log10() - rest.log10())
        - (x + d) * ((x + d).log10() - n.log10());
    if !value.is_finite() {
        return Err(PipelineError::invariant(format!(
            "non-finite logLR for counts ({n_da}, {n_a}, {n_d})"
        )));
    }
    Ok(LlrOutcome::Defined(value))
}

/// Score the full drug x event grid, dropping undefined cells.
///
/// Returned scores are ordered by drug position, then event position.
pub fn score_grid(table: &CrossTable, exec: &Executor) -> PipelineResult<(Vec<PairScore>, usize)> {
    let n = table.grand_total();
    let drugs: Vec<usize> = (0..table.n_drugs()).collect();
    let rows = exec.try_map(&drugs, |&drug| {
        let n_d = table.drug_total(drug);
        let mut scores = Vec::new();
        let mut undefined = 0usize;
        for event in 0..table.n_events() {
            match log_likelihood_ratio(table.count(drug, event), table.event_total(event), n_d, n)? {
                LlrOutcome::Defined(log_lr) => scores.push(PairScore {
                    drug,
                    event,
                    log_lr,
                }),
                LlrOutcome::Undefined => undefined += 1,
            }
        }
        Ok((scores, undefined))
    })?;

    let mut undefined = 0usize;
    let mut scores = Vec::new();
    for (row, skipped) in rows {
        scores.extend(row);
        undefined += skipped;
    }
    Ok((scores, undefined))
}
