//! Normalised drug -> {item} relations (adverse events or targets) with
//! per-pair source provenance.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use csv::ReaderBuilder;
use tracing::info;

use super::reports::field;

/// Canonical drug key: trimmed and lower-cased.
pub fn normalize_drug(name: &str) -> String {
    name.trim().to_lowercase()
}

/// How several relations of the same kind are combined per drug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MergeMode {
    /// Keep every drug of every source.
    #[default]
    Union,
    /// Keep only drugs reported by every source.
    Intersect,
}

type Items = BTreeMap<String, BTreeSet<String>>;

/// Drug -> de-duplicated item set, each pair remembering which sources
/// reported it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrugRelation {
    entries: BTreeMap<String, Items>,
}

impl DrugRelation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, D, T>(source: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (D, T)>,
        D: AsRef<str>,
        T: AsRef<str>,
    {
        let mut relation = Self::new();
        for (drug, item) in pairs {
            relation.insert(source, drug.as_ref(), item.as_ref());
        }
        relation
    }

    /// Add one pair; blank names are ignored. Returns whether the pair was new.
    pub fn insert(&mut self, source: &str, drug: &str, item: &str) -> bool {
        let drug = normalize_drug(drug);
        let item = item.trim();
        if drug.is_empty() || item.is_empty() {
            return false;
        }
        let sources = self
            .entries
            .entry(drug)
            .or_default()
            .entry(item.to_string())
            .or_default();
        let fresh = sources.is_empty();
        sources.insert(source.to_string());
        fresh
    }

    /// Combine relations per drug; item sets and source labels are unioned.
    pub fn merge(relations: &[DrugRelation], mode: MergeMode) -> Self {
        let mut merged = Self::new();
        for relation in relations {
            for (drug, items) in &relation.entries {
                let slot = merged.entries.entry(drug.clone()).or_default();
                for (item, sources) in items {
                    slot.entry(item.clone())
                        .or_default()
                        .extend(sources.iter().cloned());
                }
            }
        }
        if mode == MergeMode::Intersect {
            merged
                .entries
                .retain(|drug, _| relations.iter().all(|r| r.entries.contains_key(drug)));
        }
        merged
    }

    pub fn drugs(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains_drug(&self, drug: &str) -> bool {
        self.entries.contains_key(drug)
    }

    pub fn items(&self, drug: &str) -> impl Iterator<Item = &str> {
        self.entries
            .get(drug)
            .into_iter()
            .flat_map(|items| items.keys().map(String::as_str))
    }

    pub fn sources(&self, drug: &str, item: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(drug)?.get(item)
    }

    pub fn n_drugs(&self) -> usize {
        self.entries.len()
    }

    pub fn n_pairs(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A relation file plus the database label its pairs are attributed to,
/// written `path` or `path:LABEL` on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub path: PathBuf,
    pub label: String,
}

impl FromStr for SourceSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, label) = match s.rsplit_once(':') {
            Some((path, label))
                if !path.is_empty() && !label.is_empty() && !label.contains(&['/', '\\'][..]) =>
            {
                (PathBuf::from(path), label.to_string())
            }
            _ => {
                let path = PathBuf::from(s);
                let label = default_label(&path);
                (path, label)
            }
        };
        if label.is_empty() {
            return Err(format!("cannot derive a source label from `{s}`"));
        }
        Ok(Self { path, label })
    }
}

fn default_label(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_uppercase())
        .unwrap_or_default()
}

/// Read `(drug, item)` from the first two columns of a tab separated file
/// with a header row.
pub fn load_relation(spec: &SourceSpec) -> Result<DrugRelation> {
    let path = &spec.path;
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let mut relation = DrugRelation::new();
    let mut rows = 0usize;
    for record in reader.records() {
        let record = record.with_context(|| format!("read {}", path.display()))?;
        relation.insert(&spec.label, field(&record, 0), field(&record, 1));
        rows += 1;
    }
    if relation.is_empty() && rows > 0 {
        bail!("{} has rows but no usable (drug, item) pairs", path.display());
    }
    info!(
        source = %spec.label,
        rows,
        drugs = relation.n_drugs(),
        pairs = relation.n_pairs(),
        "loaded relation"
    );
    Ok(relation)
}

pub fn load_relations(specs: &[SourceSpec], mode: MergeMode) -> Result<DrugRelation> {
    let relations = specs
        .iter()
        .map(load_relation)
        .collect::<Result<Vec<_>>>()?;
    Ok(DrugRelation::merge(&relations, mode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drug_keys_are_case_normalised_and_deduplicated() {
        let rel = DrugRelation::from_pairs(
            "SIDER",
            [("Imatinib", "Rash"), ("IMATINIB ", "Rash"), ("imatinib", "Nausea")],
        );
        assert_eq!(rel.n_drugs(), 1);
        assert_eq!(rel.n_pairs(), 2);
        assert_eq!(rel.items("imatinib").collect::<Vec<_>>(), vec!["Nausea", "Rash"]);
    }

    #[test]
    fn intersect_keeps_shared_drugs_with_union_of_items() {
        let faers = DrugRelation::from_pairs("FAERS", [("x", "a"), ("y", "b")]);
        let medeffect = DrugRelation::from_pairs("MEDEFFECT", [("x", "c"), ("z", "d")]);
        let merged = DrugRelation::merge(&[faers.clone(), medeffect.clone()], MergeMode::Intersect);
        assert_eq!(merged.drugs().collect::<Vec<_>>(), vec!["x"]);
        assert_eq!(merged.items("x").collect::<Vec<_>>(), vec!["a", "c"]);

        let union = DrugRelation::merge(&[faers, medeffect], MergeMode::Union);
        assert_eq!(union.n_drugs(), 3);
    }

    #[test]
    fn sources_accumulate_across_relations() {
        let a = DrugRelation::from_pairs("SIDER", [("x", "a")]);
        let b = DrugRelation::from_pairs("OFFSIDES", [("x", "a")]);
        let merged = DrugRelation::merge(&[a, b], MergeMode::Union);
        let sources: Vec<_> = merged.sources("x", "a").unwrap().iter().cloned().collect();
        assert_eq!(sources, vec!["OFFSIDES".to_string(), "SIDER".to_string()]);
    }

    #[test]
    fn source_spec_parses_label() {
        let spec: SourceSpec = "inputs/stitch.tsv:STITCH".parse().unwrap();
        assert_eq!(spec.label, "STITCH");
        assert_eq!(spec.path, PathBuf::from("inputs/stitch.tsv"));

        let spec: SourceSpec = "inputs/dtc.tsv".parse().unwrap();
        assert_eq!(spec.label, "DTC");
    }

    #[test]
    fn colon_inside_directory_is_not_a_label() {
        let spec: SourceSpec = "/tmp/a:b/x.tsv".parse().unwrap();
        assert_eq!(spec.path, PathBuf::from("/tmp/a:b/x.tsv"));
        assert_eq!(spec.label, "X");

        let spec: SourceSpec = "/tmp/a:b/x.tsv:SIDER".parse().unwrap();
        assert_eq!(spec.path, PathBuf::from("/tmp/a:b/x.tsv"));
        assert_eq!(spec.label, "SIDER");
    }
}
