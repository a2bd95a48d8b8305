//! Chart-ready aggregates for the dashboard.
//!
//! [`compute_charts`] picks columns by declared type and emits at most one chart
//! of each kind. A kind whose required columns are absent is simply left out.
//! Rendering is somebody else's job: every chart names the keys a renderer
//! should read from its data points.

use std::{cmp::Ordering, collections::HashMap};

use chrono::NaiveDate;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    dates,
    model::{Column, ColumnType, Table},
    stats::parse_number,
};

pub const BAR_CATEGORY_LIMIT: usize = 10;
pub const PIE_CATEGORY_LIMIT: usize = 5;
pub const SCATTER_POINT_LIMIT: usize = 100;
pub const HISTOGRAM_MAX_BINS: usize = 10;
pub const UNKNOWN_CATEGORY: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarChart {
    pub title: String,
    pub data: Vec<BarDatum>,
    pub x_key: String,
    pub y_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarDatum {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineChart {
    pub title: String,
    pub data: Vec<LinePoint>,
    pub x_key: String,
    pub y_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinePoint {
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterChart {
    pub title: String,
    pub data: Vec<ScatterPoint>,
    pub x_key: String,
    pub y_key: String,
    pub x_label: String,
    pub y_label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieChart {
    pub title: String,
    pub data: Vec<PieSlice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieSlice {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChartSpec {
    BarChart(BarChart),
    LineChart(LineChart),
    ScatterChart(ScatterChart),
    PieChart(PieChart),
}

impl ChartSpec {
    pub fn title(&self) -> &str {
        match self {
            ChartSpec::BarChart(c) => &c.title,
            ChartSpec::LineChart(c) => &c.title,
            ChartSpec::ScatterChart(c) => &c.title,
            ChartSpec::PieChart(c) => &c.title,
        }
    }

    pub fn point_count(&self) -> usize {
        match self {
            ChartSpec::BarChart(c) => c.data.len(),
            ChartSpec::LineChart(c) => c.data.len(),
            ChartSpec::ScatterChart(c) => c.data.len(),
            ChartSpec::PieChart(c) => c.data.len(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar_chart: Option<BarChart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_chart: Option<LineChart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scatter_chart: Option<ScatterChart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pie_chart: Option<PieChart>,
}

impl ChartSet {
    pub fn is_empty(&self) -> bool {
        self.bar_chart.is_none()
            && self.line_chart.is_none()
            && self.scatter_chart.is_none()
            && self.pie_chart.is_none()
    }

    /// Present charts in bar, line, scatter, pie order.
    pub fn into_specs(self) -> Vec<ChartSpec> {
        let mut specs = Vec::new();
        specs.extend(self.bar_chart.map(ChartSpec::BarChart));
        specs.extend(self.line_chart.map(ChartSpec::LineChart));
        specs.extend(self.scatter_chart.map(ChartSpec::ScatterChart));
        specs.extend(self.pie_chart.map(ChartSpec::PieChart));
        specs
    }
}

pub fn compute_charts(table: &Table) -> ChartSet {
    let numeric = table.columns_of_type(ColumnType::Number).collect::<Vec<_>>();
    let categorical = table.categorical_columns().collect::<Vec<_>>();
    let date = table.columns_of_type(ColumnType::Date).collect::<Vec<_>>();
    debug!(
        "Chart candidates: {} numeric, {} categorical, {} date column(s)",
        numeric.len(),
        categorical.len(),
        date.len()
    );

    let bar_chart = match (categorical.first(), numeric.first()) {
        (Some(column), _) => Some(category_bar_chart(table, column)),
        (None, Some(column)) => Some(histogram_chart(table, column)),
        (None, None) => None,
    };
    let line_chart = match (date.first(), numeric.first()) {
        (Some(date_column), Some(value_column)) => {
            Some(time_series_chart(table, date_column, value_column))
        }
        _ => None,
    };
    let scatter_chart = match numeric.as_slice() {
        [x, y, ..] => Some(scatter_chart(table, x, y)),
        _ => None,
    };
    let pie_chart = categorical
        .get(1)
        .or(categorical.first())
        .map(|column| pie_chart(table, column));

    ChartSet {
        bar_chart,
        line_chart,
        scatter_chart,
        pie_chart,
    }
}

/// Occurrence counts per stringified value, most frequent first. Ties keep
/// first-seen order.
pub fn count_categories(table: &Table, column: &str) -> Vec<(String, usize)> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for row in table.rows() {
        let value = match row.value(column) {
            "" => UNKNOWN_CATEGORY,
            other => other,
        };
        match positions.get(value) {
            Some(&idx) => counts[idx].1 += 1,
            None => {
                positions.insert(value, counts.len());
                counts.push((value.to_string(), 1));
            }
        }
    }
    counts
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1))
        .collect()
}

fn category_bar_chart(table: &Table, column: &Column) -> BarChart {
    let data = count_categories(table, &column.name)
        .into_iter()
        .take(BAR_CATEGORY_LIMIT)
        .map(|(category, count)| BarDatum { category, count })
        .collect();
    BarChart {
        title: format!("Count by {}", column.name),
        data,
        x_key: "category".to_string(),
        y_key: "count".to_string(),
    }
}

fn histogram_chart(table: &Table, column: &Column) -> BarChart {
    let values = numeric_values(table, &column.name);
    BarChart {
        title: format!("Distribution of {}", column.name),
        data: histogram(&values),
        x_key: "category".to_string(),
        y_key: "count".to_string(),
    }
}

/// Equal-width bins over `[min, max]`; the maximum lands in the last bin.
pub fn histogram(values: &[f64]) -> Vec<BarDatum> {
    if values.is_empty() {
        return Vec::new();
    }
    let bin_count = ((values.len() as f64).sqrt().ceil() as usize).clamp(1, HISTOGRAM_MAX_BINS);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / bin_count as f64;

    let mut bins = (0..bin_count)
        .map(|idx| {
            let lower = min + idx as f64 * width;
            let upper = min + (idx + 1) as f64 * width;
            BarDatum {
                category: format!("{lower:.1}-{upper:.1}"),
                count: 0,
            }
        })
        .collect::<Vec<_>>();
    for value in values {
        let idx = if width > 0.0 {
            (((value - min) / width).floor() as usize).min(bin_count - 1)
        } else {
            0
        };
        bins[idx].count += 1;
    }
    bins
}

fn time_series_chart(table: &Table, date_column: &Column, value_column: &Column) -> LineChart {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, f64, usize)> = Vec::new();
    for row in table.rows() {
        let date = row.value(&date_column.name);
        let Some(value) = parse_number(row.value(&value_column.name)) else {
            continue;
        };
        if date.is_empty() {
            continue;
        }
        match positions.get(date) {
            Some(&idx) => {
                groups[idx].1 += value;
                groups[idx].2 += 1;
            }
            None => {
                positions.insert(date, groups.len());
                groups.push((date, value, 1));
            }
        }
    }

    let data = groups
        .into_iter()
        .map(|(date, sum, count)| (dates::parse_calendar_date(date), date, sum / count as f64))
        .sorted_by(|a, b| chronological(a.0, b.0))
        .map(|(_, date, value)| LinePoint {
            date: date.to_string(),
            value,
        })
        .collect();

    LineChart {
        title: format!("{} Over Time", value_column.name),
        data,
        x_key: "date".to_string(),
        y_key: "value".to_string(),
    }
}

/// Parseable dates ascending, unparseable ones after them in original order.
fn chronological(left: Option<NaiveDate>, right: Option<NaiveDate>) -> Ordering {
    match (left, right) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn scatter_chart(table: &Table, x: &Column, y: &Column) -> ScatterChart {
    let data = table
        .rows()
        .iter()
        .filter_map(|row| {
            Some(ScatterPoint {
                x: parse_number(row.value(&x.name))?,
                y: parse_number(row.value(&y.name))?,
            })
        })
        .take(SCATTER_POINT_LIMIT)
        .collect();
    ScatterChart {
        title: format!("{} vs {}", x.name, y.name),
        data,
        x_key: "x".to_string(),
        y_key: "y".to_string(),
        x_label: x.name.clone(),
        y_label: y.name.clone(),
    }
}

fn pie_chart(table: &Table, column: &Column) -> PieChart {
    let data = count_categories(table, &column.name)
        .into_iter()
        .take(PIE_CATEGORY_LIMIT)
        .map(|(name, value)| PieSlice { name, value })
        .collect();
    PieChart {
        title: format!("Distribution of {}", column.name),
        data,
    }
}

fn numeric_values(table: &Table, column: &str) -> Vec<f64> {
    table
        .rows()
        .iter()
        .filter_map(|row| parse_number(row.value(column)))
        .collect()
}
