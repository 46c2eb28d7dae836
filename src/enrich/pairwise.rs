//! Drug-level join of the adverse event and target relations, and the
//! item -> drug-set indices derived from it.

use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use crate::{
    data::relations::DrugRelation,
    error::{PipelineError, PipelineResult},
};

/// One drug with both known adverse events and known targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedDrug {
    pub drug: String,
    pub adverse_events: Vec<String>,
    pub targets: Vec<String>,
}

/// Inner join of the two relations on drug, sorted by drug.
#[derive(Debug, Clone, Default)]
pub struct InteractionTable {
    rows: Vec<JoinedDrug>,
}

impl InteractionTable {
    pub fn join(adverse_events: &DrugRelation, targets: &DrugRelation) -> PipelineResult<Self> {
        if adverse_events.is_empty() {
            return Err(PipelineError::empty("drug -> adverse event relation"));
        }
        if targets.is_empty() {
            return Err(PipelineError::empty("drug -> target relation"));
        }

        let rows: Vec<JoinedDrug> = adverse_events
            .drugs()
            .filter(|drug| targets.contains_drug(drug))
            .map(|drug| JoinedDrug {
                drug: drug.to_string(),
                adverse_events: adverse_events.items(drug).map(str::to_string).collect(),
                targets: targets.items(drug).map(str::to_string).collect(),
            })
            .collect();

        let adr_only = adverse_events.n_drugs() - rows.len();
        let target_only = targets.n_drugs() - rows.len();
        if adr_only > 0 || target_only > 0 {
            info!(
                adr_only,
                target_only, "drugs missing from one relation excluded from the join"
            );
        }
        if rows.is_empty() {
            return Err(PipelineError::empty("drug join"));
        }
        info!(drugs = rows.len(), "joined adverse event and target relations");
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[JoinedDrug] {
        &self.rows
    }

    /// Number of distinct drugs in the join.
    pub fn n_drugs(&self) -> usize {
        self.rows.len()
    }

    /// Every (adverse event, target) combination co-occurring in at least one
    /// drug, sorted and unique.
    pub fn co_occurring_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = BTreeSet::new();
        for row in &self.rows {
            for event in &row.adverse_events {
                for target in &row.targets {
                    pairs.insert((event.as_str(), target.as_str()));
                }
            }
        }
        pairs
            .into_iter()
            .map(|(e, t)| (e.to_string(), t.to_string()))
            .collect()
    }
}

/// Item -> set of drugs exhibiting (or hitting) it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrugSets {
    sets: BTreeMap<String, BTreeSet<String>>,
}

impl DrugSets {
    fn group<'a, F, I>(table: &'a InteractionTable, items: F) -> Self
    where
        F: Fn(&'a JoinedDrug) -> I,
        I: IntoIterator<Item = &'a String>,
    {
        let mut sets: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for row in table.rows() {
            for item in items(row) {
                sets.entry(item.clone())
                    .or_default()
                    .insert(row.drug.clone());
            }
        }
        Self { sets }
    }

    pub fn get(&self, item: &str) -> Option<&BTreeSet<String>> {
        self.sets.get(item)
    }

    pub(crate) fn len(&self) -> usize {
        self.sets.len()
    }
}

/// The two "pairwise" indices: drugs per adverse event and drugs per target.
#[derive(Debug, Clone)]
pub struct PairwiseTables {
    pub by_event: DrugSets,
    pub by_target: DrugSets,
}

impl PairwiseTables {
    pub fn build(table: &InteractionTable) -> Self {
        let by_event = DrugSets::group(table, |row| row.adverse_events.iter());
        let by_target = DrugSets::group(table, |row| row.targets.iter());
        info!(
            events = by_event.len(),
            targets = by_target.len(),
            "grouped drugs per adverse event and per target"
        );
        Self {
            by_event,
            by_target,
        }
    }
}
