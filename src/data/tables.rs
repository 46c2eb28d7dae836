//! Writers for the produced tables: flat tab separated text with one header
//! row, plus a parquet snapshot of the LLR table.

use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use polars::prelude::{DataFrame, NamedFrom, ParquetWriter, Series};
use tracing::info;

use crate::{
    enrich::{AssociationRow, TraceRow},
    signals::filter::LlrRecord,
};

/// Stable float rendering: scientific notation, 7 significant digits.
pub fn fmt_float(value: f64) -> String {
    format!("{value:.6e}")
}

fn tsv_writer(path: &Path) -> Result<Writer<File>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("create {}", path.display()))
}

fn finish(mut writer: Writer<File>, path: &Path, rows: usize, what: &str) -> Result<()> {
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    info!(path = %path.display(), rows, "wrote {what}");
    Ok(())
}

/// Every defined pair with its verdict.
pub fn write_llr_table(path: &Path, records: &[LlrRecord]) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    writer.write_record([
        "drug",
        "adverse_event",
        "logLR",
        "threshold_5th_percentile",
        "significant",
        "source_database",
    ])?;
    for r in records {
        writer.write_record([
            r.drug.clone(),
            r.adverse_event.clone(),
            fmt_float(r.log_lr),
            fmt_float(r.threshold),
            r.verdict.as_str().to_string(),
            r.database.clone(),
        ])?;
    }
    finish(writer, path, records.len(), "llr table")
}

/// The accepted drug -> adverse event relation; its first two columns feed
/// straight back into `enrich`.
pub fn write_significant(path: &Path, records: &[LlrRecord]) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    writer.write_record([
        "drug",
        "adverse_event",
        "logLR",
        "threshold_5th_percentile",
        "database",
    ])?;
    for r in records {
        writer.write_record([
            r.drug.clone(),
            r.adverse_event.clone(),
            fmt_float(r.log_lr),
            fmt_float(r.threshold),
            r.database.clone(),
        ])?;
    }
    finish(writer, path, records.len(), "significant pairs")
}

pub fn write_llr_parquet(path: &Path, records: &[LlrRecord]) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut df = DataFrame::new(vec![
        Series::new(
            "drug".into(),
            records.iter().map(|r| r.drug.clone()).collect::<Vec<_>>(),
        ),
        Series::new(
            "adverse_event".into(),
            records
                .iter()
                .map(|r| r.adverse_event.clone())
                .collect::<Vec<_>>(),
        ),
        Series::new(
            "logLR".into(),
            records.iter().map(|r| r.log_lr).collect::<Vec<_>>(),
        ),
        Series::new(
            "threshold_5th_percentile".into(),
            records.iter().map(|r| r.threshold).collect::<Vec<_>>(),
        ),
        Series::new(
            "significant".into(),
            records
                .iter()
                .map(|r| r.verdict.is_significant())
                .collect::<Vec<_>>(),
        ),
        Series::new(
            "source_database".into(),
            records
                .iter()
                .map(|r| r.database.clone())
                .collect::<Vec<_>>(),
        ),
    ])?;
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    ParquetWriter::new(file).finish(&mut df)?;
    info!(path = %path.display(), rows = df.height(), "wrote llr snapshot");
    Ok(())
}

/// Uncorrected p-values, one row per scored pair.
pub fn write_pvalues(path: &Path, rows: &[AssociationRow]) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    writer.write_record(["adverse_event", "target", "p_value"])?;
    for r in rows {
        writer.write_record([
            r.adverse_event.clone(),
            r.target.clone(),
            fmt_float(r.p_value),
        ])?;
    }
    finish(writer, path, rows.len(), "p-values")
}

/// The full corrected table, counts included.
pub fn write_qvalues(path: &Path, rows: &[AssociationRow]) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    writer.write_record([
        "adverse_event",
        "target",
        "overlap_len",
        "se_drug_len",
        "tg_drug_len",
        "p_value",
        "q_value",
    ])?;
    for r in rows {
        writer.write_record([
            r.adverse_event.clone(),
            r.target.clone(),
            r.overlap_len.to_string(),
            r.se_drug_len.to_string(),
            r.tg_drug_len.to_string(),
            fmt_float(r.p_value),
            fmt_float(r.q_value),
        ])?;
    }
    finish(writer, path, rows.len(), "q-values")
}

pub fn write_accepted(path: &Path, rows: &[AssociationRow]) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    writer.write_record(["adverse_event", "target", "p_value", "q_value"])?;
    for r in rows {
        writer.write_record([
            r.adverse_event.clone(),
            r.target.clone(),
            fmt_float(r.p_value),
            fmt_float(r.q_value),
        ])?;
    }
    finish(writer, path, rows.len(), "accepted associations")
}

pub fn write_traceability(path: &Path, rows: &[TraceRow]) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    writer.write_record([
        "drug",
        "adverse_event",
        "target",
        "p_value",
        "q_value",
        "adr_databases",
        "target_databases",
    ])?;
    for r in rows {
        writer.write_record([
            r.drug.clone(),
            r.adverse_event.clone(),
            r.target.clone(),
            fmt_float(r.p_value),
            fmt_float(r.q_value),
            r.adr_sources.join(";"),
            r.target_sources.join(";"),
        ])?;
    }
    finish(writer, path, rows.len(), "traceability table")
}
