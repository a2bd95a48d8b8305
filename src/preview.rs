//! Plain-text tables for terminal output.

use std::fmt::Write as _;

use crate::{
    charts::ChartSpec,
    model::Table,
    stats::format_number,
};

const COLUMN_GAP: &str = "  ";
const MIN_RULE_WIDTH: usize = 3;

/// Aligns `rows` under `headers`, with a dashed rule between them. Cells beyond
/// the header width are ignored; control whitespace renders as spaces.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|h| cell_width(h).max(MIN_RULE_WIDTH))
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", render_line(headers, &widths));
    let rules = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", render_line(&rules, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", render_line(row, &widths));
    }
    output
}

/// First `limit` rows of `table`, column types shown beside the names.
pub fn render_preview(table: &Table, limit: usize) -> String {
    let headers = table
        .columns()
        .iter()
        .map(|c| format!("{} ({})", c.name, c.column_type))
        .collect::<Vec<_>>();
    let rows = table
        .head(limit)
        .iter()
        .map(|row| table.row_cells(row))
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

/// Header and body rows describing one chart's data points.
pub fn chart_rows(chart: &ChartSpec) -> (Vec<String>, Vec<Vec<String>>) {
    match chart {
        ChartSpec::BarChart(bar) => (
            vec![bar.x_key.clone(), bar.y_key.clone()],
            bar.data
                .iter()
                .map(|d| vec![d.category.clone(), d.count.to_string()])
                .collect(),
        ),
        ChartSpec::LineChart(line) => (
            vec![line.x_key.clone(), line.y_key.clone()],
            line.data
                .iter()
                .map(|p| vec![p.date.clone(), format_number(p.value)])
                .collect(),
        ),
        ChartSpec::ScatterChart(scatter) => (
            vec![scatter.x_label.clone(), scatter.y_label.clone()],
            scatter
                .data
                .iter()
                .map(|p| vec![format_number(p.x), format_number(p.y)])
                .collect(),
        ),
        ChartSpec::PieChart(pie) => (
            vec!["name".to_string(), "value".to_string()],
            pie.data
                .iter()
                .map(|s| vec![s.name.clone(), s.value.to_string()])
                .collect(),
        ),
    }
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let text = sanitize(cell);
            let padding = width.saturating_sub(cell_width(&text));
            format!("{text}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join(COLUMN_GAP);
    line.truncate(line.trim_end().len());
    line
}

fn cell_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}
