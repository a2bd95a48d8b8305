//! Column type inference.
//!
//! The default [`InferenceMode::FirstRow`] commits every column's type from
//! the first data row alone. A column whose first value is atypical (blank,
//! a placeholder, a typo) is typed from that value for the whole table;
//! downstream statistics trust the declared type and never re-infer.
//! [`InferenceMode::Majority`] votes across a sample instead.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{dates, model::ColumnType};

const BOOLEAN_TOKENS: &[&str] = &["true", "false", "0", "1", "yes", "no", "y", "n"];

/// Vote order for majority ties, which is also the single-value decision order.
const PRIORITY: [ColumnType; 4] = [
    ColumnType::Number,
    ColumnType::Date,
    ColumnType::Boolean,
    ColumnType::String,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum InferenceMode {
    #[default]
    FirstRow,
    /// Majority vote over the first `sample_rows` rows (0 scans every row).
    #[serde(rename_all = "camelCase")]
    Majority { sample_rows: usize },
}

fn numeric_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("valid numeric pattern"))
}

pub fn is_numeric_literal(value: &str) -> bool {
    numeric_pattern().is_match(value)
}

pub fn is_boolean_literal(value: &str) -> bool {
    let lowered = value.to_ascii_lowercase();
    BOOLEAN_TOKENS.contains(&lowered.as_str())
}

/// Classifies one raw value; the first matching rule wins.
pub fn infer_value_type(value: &str) -> ColumnType {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        ColumnType::String
    } else if is_numeric_literal(trimmed) {
        ColumnType::Number
    } else if dates::looks_like_date(trimmed) {
        ColumnType::Date
    } else if is_boolean_literal(trimmed) {
        ColumnType::Boolean
    } else {
        ColumnType::String
    }
}

/// Infers one type per header slot from tokenized data rows. Rows shorter
/// than the header contribute an empty value for the slots they lack.
pub fn infer_column_types(
    column_count: usize,
    rows: &[Vec<String>],
    mode: InferenceMode,
) -> Vec<ColumnType> {
    let types = match mode {
        InferenceMode::FirstRow => {
            let first = rows.first();
            (0..column_count)
                .map(|idx| {
                    first
                        .and_then(|row| row.get(idx))
                        .map(|value| infer_value_type(value))
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>()
        }
        InferenceMode::Majority { sample_rows } => {
            let limit = if sample_rows == 0 {
                rows.len()
            } else {
                sample_rows.min(rows.len())
            };
            (0..column_count)
                .map(|idx| majority_type(rows[..limit].iter().filter_map(|row| row.get(idx))))
                .collect::<Vec<_>>()
        }
    };
    debug!("Inferred column types ({mode:?}): {types:?}");
    types
}

fn majority_type<'a, I>(values: I) -> ColumnType
where
    I: Iterator<Item = &'a String>,
{
    let mut votes = [0usize; PRIORITY.len()];
    for value in values.filter(|v| !v.trim().is_empty()) {
        let inferred = infer_value_type(value);
        if let Some(slot) = PRIORITY.iter().position(|t| *t == inferred) {
            votes[slot] += 1;
        }
    }
    let best = votes.iter().copied().max().unwrap_or(0);
    if best == 0 {
        return ColumnType::String;
    }
    PRIORITY
        .iter()
        .zip(votes)
        .find(|(_, count)| *count == best)
        .map(|(ty, _)| *ty)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|v| v.to_string()).collect())
            .collect()
    }

    #[test]
    fn decision_order_matches_rules() {
        assert_eq!(infer_value_type(""), ColumnType::String);
        assert_eq!(infer_value_type("   "), ColumnType::String);
        assert_eq!(infer_value_type("42"), ColumnType::Number);
        assert_eq!(infer_value_type("-3.75"), ColumnType::Number);
        assert_eq!(infer_value_type("1"), ColumnType::Number);
        assert_eq!(infer_value_type("2023-01-05"), ColumnType::Date);
        assert_eq!(infer_value_type("05/01/2023"), ColumnType::Date);
        assert_eq!(infer_value_type("YES"), ColumnType::Boolean);
        assert_eq!(infer_value_type("n"), ColumnType::Boolean);
        assert_eq!(infer_value_type("Alice"), ColumnType::String);
    }

    #[test]
    fn numeric_pattern_rejects_loose_forms() {
        assert!(!is_numeric_literal("1e5"));
        assert!(!is_numeric_literal(".5"));
        assert!(!is_numeric_literal("5."));
        assert!(!is_numeric_literal("+5"));
        assert!(!is_numeric_literal("1,000"));
    }

    #[test]
    fn non_ascii_digits_are_not_numbers() {
        assert_eq!(infer_value_type("\u{0661}\u{0662}"), ColumnType::String);
        assert_eq!(infer_value_type("\u{0661}/\u{0662}/2024"), ColumnType::String);
        assert!(!is_numeric_literal("\u{ff11}\u{ff12}"));
    }

    #[test]
    fn first_row_mode_commits_from_row_one() {
        let data = rows(&[&["", "x"], &["10", "20"], &["11", "21"]]);
        let types = infer_column_types(2, &data, InferenceMode::FirstRow);
        assert_eq!(types, vec![ColumnType::String, ColumnType::String]);
    }

    #[test]
    fn short_first_row_defaults_missing_slots_to_string() {
        let data = rows(&[&["1"]]);
        let types = infer_column_types(3, &data, InferenceMode::FirstRow);
        assert_eq!(
            types,
            vec![ColumnType::Number, ColumnType::String, ColumnType::String]
        );
    }

    #[test]
    fn majority_mode_skips_blank_leading_values() {
        let data = rows(&[&[""], &["10"], &["11"], &["abc"]]);
        let types = infer_column_types(1, &data, InferenceMode::Majority { sample_rows: 0 });
        assert_eq!(types, vec![ColumnType::Number]);
    }

    #[test]
    fn majority_mode_respects_sample_limit_and_ties() {
        let data = rows(&[&["abc"], &["10"], &["11"], &["12"]]);
        let types = infer_column_types(1, &data, InferenceMode::Majority { sample_rows: 2 });
        assert_eq!(types, vec![ColumnType::Number]);
    }
}
