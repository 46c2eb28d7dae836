//! Loader for exploded case-report tables.

use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::signals::crosstab::Report;

use super::relations::normalize_drug;

/// Read `(report_id, drug, adverse_event)` rows from a tab separated file with
/// a header row. Columns are taken by position and drug names are normalised;
/// rows with a blank drug or event are skipped.
pub fn load_reports(path: &Path) -> Result<Vec<Report>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (line, record) in reader.records().enumerate() {
        let mut record =
            record.with_context(|| format!("row {} of {}", line + 2, path.display()))?;
        record.trim();
        record.truncate(3);
        let mut report: Report = record
            .deserialize(None)
            .with_context(|| format!("row {} of {}", line + 2, path.display()))?;
        report.drug = normalize_drug(&report.drug);
        if report.drug.is_empty() || report.adverse_event.is_empty() {
            skipped += 1;
            continue;
        }
        rows.push(report);
    }
    if skipped > 0 {
        debug!(skipped, "dropped report rows with blank drug or event");
    }
    info!(rows = rows.len(), path = %path.display(), "loaded reports");
    Ok(rows)
}

pub(crate) fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).map(str::trim).unwrap_or_default()
}
