//! 2x2 tables and Fisher's exact test.

use statrs::function::factorial::ln_factorial;

use crate::{
    error::{PipelineError, PipelineResult},
    exec::Executor,
};

use super::overlap::OverlapRow;

/// Relative tolerance when comparing table probabilities against the
/// observed one.
const RELATIVE_TOLERANCE: f64 = 1e-7;

/// ```text
///             target        no target
/// event       se_binds      se_no_binds
/// no event    no_se_binds   no_se_no_binds
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwoByTwo {
    pub se_binds: u64,
    pub se_no_binds: u64,
    pub no_se_binds: u64,
    pub no_se_no_binds: u64,
}

impl TwoByTwo {
    /// Build the table for one overlap row out of `n_drugs` joined drugs.
    pub fn from_overlap(row: &OverlapRow, n_drugs: u64) -> PipelineResult<Self> {
        let cell = |value: i128, name: &str| -> PipelineResult<u64> {
            u64::try_from(value).map_err(|_| {
                PipelineError::invariant(format!(
                    "negative {name} ({value}) for ({}, {})",
                    row.adverse_event, row.target
                ))
            })
        };
        let overlap = i128::from(row.overlap_len);
        let se_no_binds = i128::from(row.se_drug_len) - overlap;
        let no_se_binds = i128::from(row.tg_drug_len) - overlap;
        let rest = i128::from(n_drugs) - overlap - se_no_binds - no_se_binds;
        Ok(Self {
            se_binds: row.overlap_len,
            se_no_binds: cell(se_no_binds, "se_no_binds")?,
            no_se_binds: cell(no_se_binds, "no_se_binds")?,
            no_se_no_binds: cell(rest, "no_se_no_binds")?,
        })
    }

    pub fn total(&self) -> u64 {
        self.se_binds + self.se_no_binds + self.no_se_binds + self.no_se_no_binds
    }

    /// Two-sided p-value: the summed probability of every table with the same
    /// margins that is no more likely than this one.
    pub fn fisher_exact(&self) -> f64 {
        let n = self.total();
        let row = self.se_binds + self.se_no_binds;
        let col = self.se_binds + self.no_se_binds;
        let lo = (row + col).saturating_sub(n);
        let hi = row.min(col);

        let ln_pmf = |x: u64| {
            ln_choose(col, x) + ln_choose(n - col, row - x) - ln_choose(n, row)
        };
        let observed = ln_pmf(self.se_binds);
        let cutoff = observed + RELATIVE_TOLERANCE.ln_1p();
        let p: f64 = (lo..=hi)
            .map(ln_pmf)
            .filter(|&lp| lp <= cutoff)
            .map(f64::exp)
            .sum();
        p.clamp(0.0, 1.0)
    }
}

fn ln_choose(n: u64, k: u64) -> f64 {
    ln_factorial(n) - ln_factorial(k) - ln_factorial(n - k)
}

/// An overlap row with its table and p-value.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPair {
    pub overlap: OverlapRow,
    pub table: TwoByTwo,
    pub p_value: f64,
}

/// Score every row; a negative cell anywhere aborts the batch.
pub fn score(rows: &[OverlapRow], n_drugs: u64, exec: &Executor) -> PipelineResult<Vec<ScoredPair>> {
    exec.try_map(rows, |row| {
        let table = TwoByTwo::from_overlap(row, n_drugs)?;
        Ok(ScoredPair {
            overlap: row.clone(),
            table,
            p_value: table.fisher_exact(),
        })
    })
}
