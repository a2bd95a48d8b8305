//! Delimited-text tokenizer.
//!
//! Turns raw file text into a typed [`Table`]: the first non-blank line is the
//! header, every following non-blank line a data row. The separator is `;`
//! when the header carries semicolons but no commas outside quotes, otherwise
//! `,`. Fields honor double quotes (separator is literal inside quotes, `""` is
//! an escaped quote). Column types are assigned inline through [`crate::inference`].
//!
//! Reading is line-oriented, so a quoted field cannot span lines.

use log::{debug, error};
use thiserror::Error;

use crate::{
    inference::{self, InferenceMode},
    model::{Column, Row, Table, TableError},
};

pub const COMMA: char = ',';
pub const SEMICOLON: char = ';';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("File appears to be empty")]
    Empty,
    #[error("Expected a header line and at least one data row, found {found} non-blank line(s)")]
    MissingDataRows { found: usize },
    #[error("Header line does not define any columns")]
    NoColumns,
    #[error(transparent)]
    InvalidTable(#[from] TableError),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer {
    inference: InferenceMode,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inference(mut self, mode: InferenceMode) -> Self {
        self.inference = mode;
        self
    }

    /// Tokenizes `raw`, reporting malformed input as an error.
    pub fn try_parse(&self, raw: &str) -> Result<Table, ParseError> {
        let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        if text.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        let lines = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>();
        if lines.len() < 2 {
            return Err(ParseError::MissingDataRows { found: lines.len() });
        }

        let separator = detect_separator(lines[0]);
        let header_tokens = split_fields(lines[0], separator);
        if header_tokens.is_empty() {
            return Err(ParseError::NoColumns);
        }
        let names = header_names(&header_tokens);
        debug!(
            "Header has {} column(s) using separator '{}'",
            names.len(),
            separator
        );

        let data = lines[1..]
            .iter()
            .map(|line| split_fields(line, separator))
            .collect::<Vec<_>>();
        let types = inference::infer_column_types(names.len(), &data, self.inference);

        let rows = data
            .into_iter()
            .map(|tokens| Row::with_values(names.iter().cloned().zip(tokens)))
            .collect::<Vec<_>>();
        let columns = names
            .into_iter()
            .zip(types)
            .map(|(name, ty)| Column::new(name, ty))
            .collect::<Vec<_>>();

        debug!("Tokenized {} data row(s)", rows.len());
        Ok(Table::new(columns, rows)?)
    }

    /// Tokenizes `raw`; on malformed input logs the failure and yields the
    /// empty table.
    pub fn parse(&self, raw: &str) -> Table {
        match self.try_parse(raw) {
            Ok(table) => table,
            Err(err) => {
                error!("Failed to parse file: {err}");
                Table::empty()
            }
        }
    }
}

pub fn parse(raw: &str) -> Table {
    Tokenizer::new().parse(raw)
}

pub fn try_parse(raw: &str) -> Result<Table, ParseError> {
    Tokenizer::new().try_parse(raw)
}

/// Semicolon when the header has semicolons but no commas outside quotes,
/// otherwise comma.
pub fn detect_separator(header_line: &str) -> char {
    let mut in_quotes = false;
    let mut semicolons = false;
    for ch in header_line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            COMMA if !in_quotes => return COMMA,
            SEMICOLON if !in_quotes => semicolons = true,
            _ => {}
        }
    }
    if semicolons { SEMICOLON } else { COMMA }
}

/// Splits one line into field values. Quotes are stripped; whitespace
/// outside quotes at the edges of a field is dropped.
pub fn split_fields(line: &str, separator: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c == separator && !in_quotes => {
                fields.push(finish_field(&mut field, quoted));
                quoted = false;
            }
            c if c.is_whitespace() && !in_quotes && (quoted || field.is_empty()) => {}
            c => field.push(c),
        }
    }
    fields.push(finish_field(&mut field, quoted));
    fields
}

fn finish_field(field: &mut String, quoted: bool) -> String {
    let value = std::mem::take(field);
    if quoted {
        value
    } else {
        value.trim_end().to_string()
    }
}

fn header_names(tokens: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(tokens.len());
    for (idx, token) in tokens.iter().enumerate() {
        let trimmed = token.trim();
        let name = if trimmed.is_empty() || names.iter().any(|n| n == trimmed) {
            synthesize_name(idx, &names)
        } else {
            trimmed.to_string()
        };
        names.push(name);
    }
    names
}

fn synthesize_name(idx: usize, taken: &[String]) -> String {
    let base = format!("column_{idx}");
    let mut candidate = base.clone();
    let mut suffix = 2;
    while taken.iter().any(|n| *n == candidate) {
        candidate = format!("{base}_{suffix}");
        suffix += 1;
    }
    candidate
}
