//! Compare observed logLR against each drug's Monte Carlo threshold.

use std::fmt;

use crate::error::{PipelineError, PipelineResult};

use super::{crosstab::CrossTable, llr::PairScore, montecarlo::NullThreshold};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Significant,
    NotSignificant,
}

impl Verdict {
    pub fn from_score(log_lr: f64, threshold: f64) -> Self {
        if log_lr >= threshold {
            Self::Significant
        } else {
            Self::NotSignificant
        }
    }

    pub fn is_significant(self) -> bool {
        matches!(self, Self::Significant)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Significant => "yes",
            Self::NotSignificant => "no",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the LLR table.
#[derive(Debug, Clone, PartialEq)]
pub struct LlrRecord {
    pub drug: String,
    pub adverse_event: String,
    pub log_lr: f64,
    pub threshold: f64,
    pub verdict: Verdict,
    pub database: String,
}

/// Join scores with thresholds on drug and tag every row with `database`.
///
/// `thresholds` must be in the table's canonical drug order.
pub fn judge(
    table: &CrossTable,
    scores: &[PairScore],
    thresholds: &[NullThreshold],
    database: &str,
) -> PipelineResult<Vec<LlrRecord>> {
    if thresholds.len() != table.n_drugs() {
        return Err(PipelineError::invariant(format!(
            "{} thresholds for {} drugs",
            thresholds.len(),
            table.n_drugs()
        )));
    }
    scores
        .iter()
        .map(|score| {
            let null = thresholds.get(score.drug).ok_or_else(|| {
                PipelineError::invariant(format!("no threshold for drug #{}", score.drug))
            })?;
            let drug = table.drug_name(score.drug);
            if null.drug != drug {
                return Err(PipelineError::invariant(format!(
                    "threshold for {} joined to {drug}",
                    null.drug
                )));
            }
            Ok(LlrRecord {
                drug: drug.to_string(),
                adverse_event: table.event_name(score.event).to_string(),
                log_lr: score.log_lr,
                threshold: null.threshold,
                verdict: Verdict::from_score(score.log_lr, null.threshold),
                database: database.to_string(),
            })
        })
        .collect()
}

/// Keep only the significant rows.
pub fn significant(records: &[LlrRecord]) -> Vec<LlrRecord> {
    records
        .iter()
        .filter(|r| r.verdict.is_significant())
        .cloned()
        .collect()
}
