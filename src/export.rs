//! Delimited-text reconstruction of a table for download.
//!
//! Output is a comma-separated header line followed by one line per row, values
//! in column order and missing fields written empty. With [`Quoting::Always`]
//! every field is quoted, so edge whitespace, separators and quotes survive and
//! the artifact tokenizes back into the same rows. [`Quoting::Never`] writes
//! values verbatim, matching older exports and corrupting such fields.

use anyhow::{Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::model::Table;

pub const EXPORT_DELIMITER: u8 = b',';
pub const DEFAULT_EXPORT_NAME: &str = "cleaned_data.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quoting {
    #[default]
    Always,
    Never,
}

impl Quoting {
    fn quote_style(self) -> QuoteStyle {
        match self {
            Quoting::Always => QuoteStyle::Always,
            Quoting::Never => QuoteStyle::Never,
        }
    }
}

pub fn to_delimited_text(table: &Table, quoting: Quoting) -> Result<String> {
    if table.columns().is_empty() {
        return Ok(String::new());
    }
    let mut writer = WriterBuilder::new()
        .delimiter(EXPORT_DELIMITER)
        .quote_style(quoting.quote_style())
        .double_quote(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer
        .write_record(table.headers())
        .context("Writing export header")?;
    for (idx, row) in table.rows().iter().enumerate() {
        writer
            .write_record(table.row_cells(row))
            .with_context(|| format!("Writing export row {}", idx + 1))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("Flushing export buffer: {}", err.error()))?;
    String::from_utf8(bytes).context("Export produced invalid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, ColumnType, Row};

    fn sample() -> Table {
        Table::new(
            vec![
                Column::new("name", ColumnType::String),
                Column::new("note", ColumnType::String),
            ],
            vec![
                Row::with_values([("name", "Alice"), ("note", "likes tea, coffee")]),
                Row::with_values([("name", "Bob")]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn every_field_is_quoted_by_default() {
        let text = to_delimited_text(&sample(), Quoting::default()).unwrap();
        assert_eq!(
            text,
            "\"name\",\"note\"\n\"Alice\",\"likes tea, coffee\"\n\"Bob\",\"\"\n"
        );
    }

    #[test]
    fn padded_and_semicolon_values_survive_tokenizing() {
        let table = Table::new(
            vec![Column::new("a;b", ColumnType::String)],
            vec![
                Row::with_values([("a;b", " padded ")]),
                Row::with_values([("a;b", "x;y")]),
            ],
        )
        .unwrap();
        let text = to_delimited_text(&table, Quoting::Always).unwrap();
        let parsed = crate::tokenizer::try_parse(&text).unwrap();
        assert_eq!(parsed.headers(), vec!["a;b"]);
        assert_eq!(parsed.rows()[0].get("a;b"), Some(" padded "));
        assert_eq!(parsed.rows()[1].get("a;b"), Some("x;y"));
    }

    #[test]
    fn never_quoting_reproduces_raw_join() {
        let text = to_delimited_text(&sample(), Quoting::Never).unwrap();
        assert_eq!(text, "name,note\nAlice,likes tea, coffee\nBob,\n");
    }

    #[test]
    fn empty_table_exports_nothing() {
        assert_eq!(
            to_delimited_text(&Table::empty(), Quoting::default()).unwrap(),
            ""
        );
    }
}
