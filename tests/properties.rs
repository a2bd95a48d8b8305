use dataglow::{
    clean::clean,
    export::{Quoting, to_delimited_text},
    model::{Column, ColumnType, Row, Table},
    tokenizer,
};
use proptest::prelude::*;

const COLUMN_TYPES: [ColumnType; 4] = [
    ColumnType::String,
    ColumnType::Number,
    ColumnType::Date,
    ColumnType::Boolean,
];

fn cell() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("1/2/2024".to_string()),
        Just("2024-01-02".to_string()),
        Just("2024/1/2".to_string()),
        Just("31/12/99".to_string()),
        Just("yes".to_string()),
        Just("42".to_string()),
        "[a-c]{1,2}",
    ]
}

fn table_strategy() -> impl Strategy<Value = Table> {
    (1usize..5).prop_flat_map(|width| {
        (
            proptest::collection::vec(0usize..COLUMN_TYPES.len(), width),
            proptest::collection::vec(proptest::collection::vec(cell(), width), 0..25),
        )
            .prop_map(|(types, cells)| {
                let columns = types
                    .iter()
                    .enumerate()
                    .map(|(idx, ty)| Column::new(format!("c{idx}"), COLUMN_TYPES[*ty]))
                    .collect::<Vec<_>>();
                let rows = cells
                    .into_iter()
                    .map(|values| {
                        Row::with_values(
                            values
                                .into_iter()
                                .enumerate()
                                .map(|(idx, value)| (format!("c{idx}"), value)),
                        )
                    })
                    .collect();
                Table::new(columns, rows).expect("generated table")
            })
    })
}

fn text_field() -> impl Strategy<Value = String> {
    "[a-z0-9,;\" ]{0,6}"
}

fn delimited_text() -> impl Strategy<Value = (usize, Vec<Vec<String>>)> {
    (2usize..5).prop_flat_map(|width| {
        (
            Just(width),
            proptest::collection::vec(proptest::collection::vec(text_field(), width), 1..15),
        )
    })
}

fn render(width: usize, rows: &[Vec<String>]) -> String {
    let columns = (0..width)
        .map(|idx| Column::new(format!("c{idx}"), ColumnType::String))
        .collect::<Vec<_>>();
    let rows = rows
        .iter()
        .map(|values| {
            Row::with_values(
                values
                    .iter()
                    .enumerate()
                    .map(|(idx, value)| (format!("c{idx}"), value.clone())),
            )
        })
        .collect();
    let table = Table::new(columns, rows).expect("generated table");
    to_delimited_text(&table, Quoting::Always).expect("export")
}

proptest! {
    #[test]
    fn cleaning_accounts_for_every_row(table in table_strategy()) {
        let stats = clean(&table).stats;
        prop_assert_eq!(
            stats.cleaned_rows + stats.removed_rows + stats.duplicates_removed,
            stats.original_rows
        );
        prop_assert_eq!(stats.original_rows, table.row_count());
    }

    #[test]
    fn cleaning_is_idempotent(table in table_strategy()) {
        let once = clean(&table);
        let twice = clean(&once.table);
        prop_assert_eq!(&twice.table, &once.table);
        prop_assert_eq!(twice.stats.removed_rows, 0);
        prop_assert_eq!(twice.stats.duplicates_removed, 0);
        prop_assert_eq!(twice.stats.dates_rewritten, 0);
    }

    #[test]
    fn cleaned_table_keeps_schema(table in table_strategy()) {
        let cleaned = clean(&table);
        prop_assert_eq!(cleaned.table.columns(), table.columns());
    }

    #[test]
    fn later_rows_never_change_column_types(
        (width, rows) in delimited_text(),
        extra in proptest::collection::vec(text_field(), 1..6)
    ) {
        let base = render(width, &rows);
        let mut extended = rows.clone();
        extended.extend(extra.iter().map(|value| vec![value.clone(); width]));
        let longer = render(width, &extended);

        let left = tokenizer::try_parse(&base).expect("parse base");
        let right = tokenizer::try_parse(&longer).expect("parse extended");
        prop_assert_eq!(left.columns(), right.columns());
    }

    #[test]
    fn exported_text_tokenizes_back_to_same_rows((width, rows) in delimited_text()) {
        let text = render(width, &rows);
        let table = tokenizer::try_parse(&text).expect("re-tokenize export");
        prop_assert_eq!(table.row_count(), rows.len());
        for (parsed, expected) in table.rows().iter().zip(&rows) {
            let cells = table.row_cells(parsed);
            prop_assert_eq!(&cells, expected);
        }
    }
}
