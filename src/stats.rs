use std::collections::HashSet;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::model::{ColumnType, Table};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStats {
    pub total_rows: usize,
    pub total_columns: usize,
    pub missing_values: usize,
    pub duplicate_rows: usize,
    pub columns_info: Vec<ColumnInfo>,
    pub summary: Vec<NumericSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub distinct: usize,
    pub missing: usize,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// Summary of one `number` column. Every statistic is `None` when the column
/// holds no parseable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
}

/// Parses a field as a finite number, ignoring surrounding whitespace.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn compute_stats(table: &Table) -> DataStats {
    let columns_info = table
        .columns()
        .iter()
        .map(|column| {
            let mut distinct = HashSet::new();
            let mut missing = 0usize;
            for row in table.rows() {
                match row.get(&column.name) {
                    Some(value) if !value.is_empty() => {
                        distinct.insert(value);
                    }
                    _ => missing += 1,
                }
            }
            ColumnInfo {
                name: column.name.clone(),
                distinct: distinct.len(),
                missing,
                column_type: column.column_type,
            }
        })
        .collect::<Vec<_>>();
    let missing_values = columns_info.iter().map(|c| c.missing).sum();

    let unique_rows = table.rows().iter().collect::<HashSet<_>>().len();
    let duplicate_rows = table.row_count() - unique_rows;

    let summary = table
        .columns_of_type(ColumnType::Number)
        .map(|column| {
            let mut accumulator = NumericAccumulator::default();
            table
                .rows()
                .iter()
                .filter_map(|row| parse_number(row.value(&column.name)))
                .for_each(|value| accumulator.add(value));
            accumulator.summarize(&column.name)
        })
        .collect::<Vec<_>>();

    debug!(
        "Computed stats over {} row(s): {} missing value(s), {} duplicate row(s)",
        table.row_count(),
        missing_values,
        duplicate_rows
    );
    info!("Summarized {} numeric column(s)", summary.len());

    DataStats {
        total_rows: table.row_count(),
        total_columns: table.column_count(),
        missing_values,
        duplicate_rows,
        columns_info,
        summary,
    }
}

#[derive(Debug, Default)]
pub struct NumericAccumulator {
    values: Vec<f64>,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl NumericAccumulator {
    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.min = Some(self.min.map_or(value, |current| current.min(value)));
        self.max = Some(self.max.map_or(value, |current| current.max(value)));
        self.values.push(value);
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.sum / self.values.len() as f64)
        }
    }

    pub fn median(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        if sorted.len().is_multiple_of(2) {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }

    /// Population standard deviation (divisor is the count, not count - 1).
    pub fn std_dev(&self) -> Option<f64> {
        let mean = self.mean()?;
        let variance = self
            .values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / self.values.len() as f64;
        Some(variance.sqrt())
    }

    pub fn summarize(&self, column: &str) -> NumericSummary {
        NumericSummary {
            column: column.to_string(),
            min: self.min,
            max: self.max,
            mean: self.mean(),
            median: self.median(),
            std: self.std_dev(),
        }
    }
}

impl DataStats {
    pub fn column_rows(&self) -> Vec<Vec<String>> {
        self.columns_info
            .iter()
            .map(|info| {
                vec![
                    info.name.clone(),
                    info.column_type.to_string(),
                    info.distinct.to_string(),
                    info.missing.to_string(),
                ]
            })
            .collect()
    }

    pub fn summary_rows(&self) -> Vec<Vec<String>> {
        self.summary
            .iter()
            .map(|s| {
                vec![
                    s.column.clone(),
                    format_metric(s.min),
                    format_metric(s.max),
                    format_metric(s.mean),
                    format_metric(s.median),
                    format_metric(s.std),
                ]
            })
            .collect()
    }
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}

fn format_metric(metric: Option<f64>) -> String {
    metric.map(format_number).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulate(values: &[f64]) -> NumericAccumulator {
        let mut acc = NumericAccumulator::default();
        values.iter().for_each(|v| acc.add(*v));
        acc
    }

    #[test]
    fn median_of_even_count_averages_central_pair() {
        assert_eq!(accumulate(&[4.0, 1.0, 3.0, 2.0]).median(), Some(2.5));
    }

    #[test]
    fn median_of_odd_count_is_central_value() {
        assert_eq!(accumulate(&[3.0, 1.0, 2.0]).median(), Some(2.0));
    }

    #[test]
    fn std_dev_uses_population_divisor() {
        let acc = accumulate(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(acc.mean(), Some(5.0));
        assert_eq!(acc.std_dev(), Some(2.0));
        assert_eq!(accumulate(&[30.0]).std_dev(), Some(0.0));
    }

    #[test]
    fn empty_accumulator_yields_no_statistics() {
        let summary = NumericAccumulator::default().summarize("x");
        assert_eq!(summary.min, None);
        assert_eq!(summary.std, None);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json, serde_json::json!({"column": "x"}));
    }

    #[test]
    fn parse_number_rejects_text_and_non_finite() {
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn format_number_trims_whole_values() {
        assert_eq!(format_number(30.0), "30");
        assert_eq!(format_number(2.5), "2.5000");
    }
}
