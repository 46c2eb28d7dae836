//! Shared-drug counts for every co-occurring (adverse event, target) pair.

use std::collections::BTreeSet;

use crate::{
    error::{PipelineError, PipelineResult},
    exec::Executor,
};

use super::pairwise::{InteractionTable, PairwiseTables};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapRow {
    pub adverse_event: String,
    pub target: String,
    /// Drugs exhibiting the event and hitting the target.
    pub overlap_len: u64,
    /// Drugs exhibiting the event.
    pub se_drug_len: u64,
    /// Drugs hitting the target.
    pub tg_drug_len: u64,
}

fn intersection_len(a: &BTreeSet<String>, b: &BTreeSet<String>) -> usize {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().filter(|drug| large.contains(*drug)).count()
}

/// Count overlaps for every pair of `table.co_occurring_pairs()`, in that
/// (sorted) order.
pub fn count_overlaps(
    table: &InteractionTable,
    pairwise: &PairwiseTables,
    exec: &Executor,
) -> PipelineResult<Vec<OverlapRow>> {
    let pairs = table.co_occurring_pairs();
    exec.try_map(&pairs, |(event, target)| {
        let se_drugs = pairwise.by_event.get(event).ok_or_else(|| {
            PipelineError::invariant(format!("adverse event {event} missing from drug index"))
        })?;
        let tg_drugs = pairwise.by_target.get(target).ok_or_else(|| {
            PipelineError::invariant(format!("target {target} missing from drug index"))
        })?;
        Ok(OverlapRow {
            adverse_event: event.clone(),
            target: target.clone(),
            overlap_len: intersection_len(se_drugs, tg_drugs) as u64,
            se_drug_len: se_drugs.len() as u64,
            tg_drug_len: tg_drugs.len() as u64,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::relations::DrugRelation;

    #[test]
    fn counts_shared_drugs() {
        let adr = DrugRelation::from_pairs("S", [("X", "a"), ("X", "b"), ("Y", "b"), ("Y", "c")]);
        let tg = DrugRelation::from_pairs("T", [("X", "t1"), ("Y", "t1"), ("Y", "t2")]);
        let table = InteractionTable::join(&adr, &tg).unwrap();
        let pairwise = PairwiseTables::build(&table);
        let rows = count_overlaps(&table, &pairwise, &Executor::new(2).unwrap()).unwrap();

        let b_t1 = rows
            .iter()
            .find(|r| r.adverse_event == "b" && r.target == "t1")
            .unwrap();
        assert_eq!((b_t1.overlap_len, b_t1.se_drug_len, b_t1.tg_drug_len), (2, 2, 2));

        let a_t1 = rows
            .iter()
            .find(|r| r.adverse_event == "a" && r.target == "t1")
            .unwrap();
        assert_eq!((a_t1.overlap_len, a_t1.se_drug_len, a_t1.tg_drug_len), (1, 1, 2));
    }

    #[test]
    fn intersection_is_symmetric() {
        let a: BTreeSet<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
        let b: BTreeSet<String> = ["y"].iter().map(|s| s.to_string()).collect();
        assert_eq!(intersection_len(&a, &b), 1);
        assert_eq!(intersection_len(&b, &a), 1);
    }
}
