//! Table cleaning: sparse-row removal, date canonicalization, deduplication.
//!
//! [`clean`] never mutates its input. Stages run in a fixed order and the
//! returned [`CleaningStats`] always satisfies
//! `original_rows == cleaned_rows + removed_rows + duplicates_removed`.

use std::collections::HashSet;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    dates,
    model::{ColumnType, Row, Table},
};

/// Rows missing at least this share of their columns are dropped.
pub const SPARSE_ROW_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleaningStats {
    pub original_rows: usize,
    pub cleaned_rows: usize,
    pub removed_rows: usize,
    /// `original_rows - removed_rows - cleaned_rows`, so always equal to
    /// `duplicates_removed`.
    pub missing_values_fixed: usize,
    pub duplicates_removed: usize,
    /// Date fields parsed and written in `YYYY-MM-DD` form among the rows that
    /// survive deduplication.
    pub dates_standardized: usize,
    /// Subset of `dates_standardized` whose text actually changed.
    pub dates_rewritten: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned {
    pub table: Table,
    pub stats: CleaningStats,
}

pub fn clean(table: &Table) -> Cleaned {
    let original_rows = table.row_count();

    let (dense, removed_rows) = drop_sparse_rows(table);
    let date_columns = table
        .columns_of_type(ColumnType::Date)
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>();
    let normalized = dense
        .into_iter()
        .map(|row| normalize_dates(row, &date_columns))
        .collect::<Vec<_>>();

    let mut seen = HashSet::with_capacity(normalized.len());
    let mut rows = Vec::with_capacity(normalized.len());
    let mut duplicates_removed = 0usize;
    let mut dates_standardized = 0usize;
    let mut dates_rewritten = 0usize;
    for outcome in normalized {
        if seen.contains(&outcome.row) {
            duplicates_removed += 1;
            continue;
        }
        seen.insert(outcome.row.clone());
        dates_standardized += outcome.standardized;
        dates_rewritten += outcome.rewritten;
        rows.push(outcome.row);
    }

    let cleaned_rows = rows.len();
    let stats = CleaningStats {
        original_rows,
        cleaned_rows,
        removed_rows,
        missing_values_fixed: original_rows - removed_rows - cleaned_rows,
        duplicates_removed,
        dates_standardized,
        dates_rewritten,
    };
    debug!("Cleaning stats: {stats:?}");
    info!(
        "Cleaned {} row(s) -> {} (sparse {}, duplicates {}, dates {})",
        original_rows, cleaned_rows, removed_rows, duplicates_removed, dates_standardized
    );
    Cleaned {
        table: table.with_rows(rows),
        stats,
    }
}

/// Fraction of the table's columns that `row` leaves empty or absent.
pub fn missing_ratio(table: &Table, row: &Row) -> f64 {
    let total = table.column_count();
    if total == 0 {
        return 0.0;
    }
    let missing = table
        .columns()
        .iter()
        .filter(|c| row.is_missing(&c.name))
        .count();
    missing as f64 / total as f64
}

fn drop_sparse_rows(table: &Table) -> (Vec<Row>, usize) {
    let mut removed = 0usize;
    let kept = table
        .rows()
        .iter()
        .filter(|row| {
            let keep = missing_ratio(table, row) < SPARSE_ROW_THRESHOLD;
            if !keep {
                removed += 1;
            }
            keep
        })
        .cloned()
        .collect();
    (kept, removed)
}

struct NormalizedRow {
    row: Row,
    standardized: usize,
    rewritten: usize,
}

fn normalize_dates(mut row: Row, date_columns: &[&str]) -> NormalizedRow {
    let mut standardized = 0usize;
    let mut rewritten = 0usize;
    for column in date_columns {
        let raw = row.value(column);
        if raw.is_empty() {
            continue;
        }
        if let Some(canonical) = dates::canonicalize_date(raw) {
            standardized += 1;
            if canonical != raw {
                rewritten += 1;
                row.set(*column, canonical);
            }
        }
    }
    NormalizedRow {
        row,
        standardized,
        rewritten,
    }
}
