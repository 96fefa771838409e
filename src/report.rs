//! Report assembly and the per-column pipeline.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::column::{Column, Table};
use crate::config::ProfileConfig;
use crate::error::{ProfileError, Result};
use crate::infer::infer;
use crate::rank::{DetailPair, Distribution, rank};
use crate::sample::sample_rows;
use crate::stats::{SummaryRow, compute};

/// Summary row and detail tables for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnReport {
    pub label: String,
    pub summary: SummaryRow,
    pub detail: DetailPair,
}

/// Per-column results in input column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    columns: Vec<ColumnReport>,
}

impl Report {
    pub fn columns(&self) -> &[ColumnReport] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&ColumnReport> {
        self.columns.iter().find(|c| c.label == label)
    }

    pub fn summaries(&self) -> impl Iterator<Item = &SummaryRow> {
        self.columns.iter().map(|c| &c.summary)
    }
}

/// Zip labels, summaries and detail pairs into a report.
///
/// All three inputs must have one entry per column, in the same order.
pub fn assemble(
    labels: Vec<String>,
    summaries: Vec<SummaryRow>,
    details: Vec<DetailPair>,
) -> Result<Report> {
    if labels.len() != summaries.len() || labels.len() != details.len() {
        return Err(ProfileError::invalid_input(format!(
            "{} labels, {} summaries and {} detail pairs do not line up",
            labels.len(),
            summaries.len(),
            details.len()
        )));
    }

    let columns = labels
        .into_iter()
        .zip(summaries)
        .zip(details)
        .map(|((label, summary), detail)| {
            if summary.label != label {
                return Err(ProfileError::invalid_input(format!(
                    "summary for '{}' found where '{}' was expected",
                    summary.label, label
                )));
            }
            Ok(ColumnReport {
                label,
                summary,
                detail,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Report { columns })
}

/// Infer, summarize and rank a single column.
///
/// Values are counted once; the summary and both detail tables read the
/// same distribution.
pub fn profile_column(
    column: &Column,
    max_detail_values: usize,
) -> Result<(SummaryRow, DetailPair)> {
    info!("Working on column '{}' ...", column.label());
    let typed = infer(column);
    let summary = Distribution::of(&typed)
        .and_then(|distribution| {
            let summary = compute(&typed, &distribution)?;
            Ok((summary, distribution))
        })
        .map_err(|e| ProfileError::column(column.label(), e));
    let (summary, distribution) = summary?;
    let detail = rank(&distribution, max_detail_values);
    debug!(
        column = column.label(),
        column_type = %typed.column_type(),
        distinct = summary.unique_count,
        "Profiled column"
    );
    Ok((summary, detail))
}

/// Profile every column of `table`.
///
/// Sampling, when configured, happens once up front so all columns see the
/// same rows. Columns are then processed in parallel; the first failure
/// aborts the run and no report is produced.
pub fn profile(table: &Table, config: &ProfileConfig) -> Result<Report> {
    if table.column_count() == 0 {
        return Err(ProfileError::invalid_input("table has no columns"));
    }
    if table.row_count() == 0 {
        return Err(ProfileError::invalid_input("table has no rows"));
    }

    let sampled;
    let table = match config.sample_percent() {
        Some(percent) => {
            sampled = match config.seed() {
                Some(seed) => sample_rows(table, percent, &mut StdRng::seed_from_u64(seed))?,
                None => sample_rows(table, percent, &mut rand::thread_rng())?,
            };
            info!(
                "Sampled {} of {} rows ({}%)",
                sampled.row_count(),
                table.row_count(),
                percent
            );
            if sampled.row_count() == 0 {
                return Err(ProfileError::invalid_input(format!(
                    "a {percent}% sample of {} rows is empty",
                    table.row_count()
                )));
            }
            &sampled
        }
        None => table,
    };

    let max_detail_values = config.max_detail_values();
    let results = table
        .columns()
        .par_iter()
        .map(|column| profile_column(column, max_detail_values))
        .collect::<Result<Vec<_>>>()?;

    let (summaries, details): (Vec<_>, Vec<_>) = results.into_iter().unzip();
    assemble(table.labels(), summaries, details)
}
