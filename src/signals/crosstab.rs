//! Drug x adverse event report-count cross-table with margins.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{PipelineError, PipelineResult};

/// One exploded case row: a single drug/adverse event occurrence.
///
/// Deserialized by position; missing trailing columns come back empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Report {
    pub report_id: String,
    pub drug: String,
    pub adverse_event: String,
}

impl Report {
    pub fn new(
        report_id: impl Into<String>,
        drug: impl Into<String>,
        adverse_event: impl Into<String>,
    ) -> Self {
        Self {
            report_id: report_id.into(),
            drug: drug.into(),
            adverse_event: adverse_event.into(),
        }
    }
}

/// Sparse count matrix; drugs and events are kept in lexicographic order so
/// that positions are canonical.
#[derive(Debug, Clone)]
pub struct CrossTable {
    drugs: IndexMap<String, u64>,
    events: IndexMap<String, u64>,
    cells: HashMap<(usize, usize), u64>,
    grand_total: u64,
}

impl CrossTable {
    /// Count every (drug, adverse event) occurrence in `reports`.
    pub fn from_reports(reports: &[Report]) -> PipelineResult<Self> {
        Self::from_pairs(
            reports
                .iter()
                .map(|r| (r.drug.as_str(), r.adverse_event.as_str())),
        )
    }

    pub fn from_pairs<'a, I>(pairs: I) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut raw: HashMap<(&str, &str), u64> = HashMap::new();
        for (drug, event) in pairs {
            *raw.entry((drug, event)).or_insert(0) += 1;
        }
        if raw.is_empty() {
            return Err(PipelineError::empty("contingency builder"));
        }

        let mut drugs: IndexMap<String, u64> = IndexMap::new();
        let mut events: IndexMap<String, u64> = IndexMap::new();
        for (&(drug, event), &count) in &raw {
            *drugs.entry(drug.to_string()).or_insert(0) += count;
            *events.entry(event.to_string()).or_insert(0) += count;
        }
        drugs.sort_keys();
        events.sort_keys();

        let mut cells = HashMap::with_capacity(raw.len());
        let mut grand_total = 0u64;
        for ((drug, event), count) in raw {
            let (Some(d), Some(e)) = (drugs.get_index_of(drug), events.get_index_of(event)) else {
                return Err(PipelineError::invariant(format!(
                    "cell ({drug}, {event}) lost its margin entry"
                )));
            };
            cells.insert((d, e), count);
            grand_total += count;
        }

        let table = Self {
            drugs,
            events,
            cells,
            grand_total,
        };
        table.check_margins()?;
        Ok(table)
    }

    pub fn drugs(&self) -> impl ExactSizeIterator<Item = &str> {
        self.drugs.keys().map(String::as_str)
    }

    pub fn events(&self) -> impl ExactSizeIterator<Item = &str> {
        self.events.keys().map(String::as_str)
    }

    pub fn n_drugs(&self) -> usize {
        self.drugs.len()
    }

    pub fn n_events(&self) -> usize {
        self.events.len()
    }

    pub fn drug_name(&self, drug: usize) -> &str {
        self.drugs
            .get_index(drug)
            .map(|(k, _)| k.as_str())
            .unwrap_or_default()
    }

    pub fn event_name(&self, event: usize) -> &str {
        self.events
            .get_index(event)
            .map(|(k, _)| k.as_str())
            .unwrap_or_default()
    }

    /// Joint count by position; zero for unobserved combinations.
    pub fn count(&self, drug: usize, event: usize) -> u64 {
        self.cells.get(&(drug, event)).copied().unwrap_or(0)
    }

    /// Column margin: every report mentioning the drug.
    pub fn drug_total(&self, drug: usize) -> u64 {
        self.drugs.get_index(drug).map(|(_, v)| *v).unwrap_or(0)
    }

    /// Row margin: every report mentioning the event.
    pub fn event_total(&self, event: usize) -> u64 {
        self.events.get_index(event).map(|(_, v)| *v).unwrap_or(0)
    }

    pub fn grand_total(&self) -> u64 {
        self.grand_total
    }

    /// Empirical probability of each event, in canonical event order.
    pub fn event_probabilities(&self) -> Vec<f64> {
        let n = self.grand_total as f64;
        self.events.values().map(|&c| c as f64 / n).collect()
    }

    /// Verify margins against the interior cells.
    pub fn check_margins(&self) -> PipelineResult<()> {
        let mut drug_sums = vec![0u64; self.drugs.len()];
        let mut event_sums = vec![0u64; self.events.len()];
        let mut total = 0u64;
        for (&(d, e), &count) in &self.cells {
            let drug_total = self.drug_total(d);
            let event_total = self.event_total(e);
            if count > drug_total || count > event_total {
                return Err(PipelineError::invariant(format!(
                    "cell ({}, {}) = {count} exceeds its margins ({drug_total}, {event_total})",
                    self.drug_name(d),
                    self.event_name(e)
                )));
            }
            drug_sums[d] += count;
            event_sums[e] += count;
            total += count;
        }
        let drug_ok = drug_sums
            .iter()
            .enumerate()
            .all(|(idx, &sum)| sum == self.drug_total(idx));
        let event_ok = event_sums
            .iter()
            .enumerate()
            .all(|(idx, &sum)| sum == self.event_total(idx));
        if !drug_ok || !event_ok || total != self.grand_total {
            return Err(PipelineError::invariant(
                "cross-table margins do not match interior sums",
            ));
        }
        Ok(())
    }
}
