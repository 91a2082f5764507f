use tablequery::error::TableError;
use tablequery::locale::Locale;
use tablequery::table::{Cell, ColumnDescription, DataTable, TableRow};
use tablequery::value::{Value, ValueType};

fn sales_table() -> DataTable {
    let mut table = DataTable::new().with_locale(Locale::new("en-US"));
    table
        .add_columns([
            ColumnDescription::new("region", ValueType::Text, "Region"),
            ColumnDescription::new("sales", ValueType::Number, "Sales").with_pattern("#,##0"),
            ColumnDescription::new("day", ValueType::Date, "Day"),
        ])
        .unwrap();
    table
}

#[test]
fn test_schema_accessors() {
    let table = sales_table();
    assert_eq!(table.num_columns(), 3);
    assert_eq!(table.column_index("sales"), Some(1));
    assert_eq!(table.column_by_id("day").unwrap().value_type(), ValueType::Date);
    assert_eq!(table.column(1).unwrap().pattern(), Some("#,##0"));
    assert!(table.column_by_id("missing").is_none());
}

#[test]
fn test_duplicate_column_id_rejected() {
    let mut table = sales_table();
    let err = table
        .add_column(ColumnDescription::new("region", ValueType::Text, "Region 2"))
        .unwrap_err();
    assert_eq!(err, TableError::DuplicateColumnId("region".to_string()));
}

#[test]
fn test_row_padding_and_rejection() {
    let mut table = sales_table();

    // A short row pads with typed nulls.
    table
        .add_row(TableRow::from_values(vec![Value::text("east")]))
        .unwrap();
    assert_eq!(table.cell(0, 1).unwrap().value(), &Value::Number(None));
    assert_eq!(table.cell(0, 2).unwrap().value(), &Value::Date(None));

    // A long row is rejected.
    assert!(matches!(
        table.add_row(TableRow::from_values(vec![
            Value::text("east"),
            Value::number(1.0),
            Value::Date(None),
            Value::number(9.0),
        ])),
        Err(TableError::RowTooLong { got: 4, expected: 3 })
    ));

    // A mistyped cell is rejected and the table is unchanged.
    assert!(matches!(
        table.add_row(TableRow::from_values(vec![Value::number(1.0)])),
        Err(TableError::TypeMismatch { .. })
    ));
    assert_eq!(table.num_rows(), 1);
}

#[test]
fn test_cell_formatted_text_survives() {
    let mut table = sales_table();
    let mut row = TableRow::new();
    row.add_cell(Cell::new(Value::text("west")));
    row.add_cell(Cell::new(Value::number(1200.0)).with_formatted_value("1,200"));
    table.add_row(row).unwrap();
    assert_eq!(table.cell(0, 1).unwrap().formatted_value(), Some("1,200"));
}

#[test]
fn test_clone_empty_keeps_schema_and_drops_rows() {
    let mut table = sales_table();
    table.set_custom_property("source", "unit-test");
    table
        .add_row(TableRow::from_values(vec![Value::text("east")]))
        .unwrap();

    let empty = table.clone_empty();
    assert_eq!(empty.num_rows(), 0);
    assert_eq!(empty.num_columns(), 3);
    assert_eq!(empty.locale(), table.locale());
    assert_eq!(empty.custom_properties().get("source").unwrap(), "unit-test");
}

#[test]
fn test_row_and_cell_custom_properties() {
    let mut table = sales_table();
    let mut row = TableRow::new();
    row.add_cell(Cell::new(Value::text("east")).with_custom_property("style", "bold"));
    row.set_custom_property("highlight", "true");
    table.add_row(row).unwrap();

    let stored = table.row(0).unwrap();
    assert_eq!(stored.custom_properties().get("highlight").unwrap(), "true");
    assert_eq!(
        stored.cell(0).unwrap().custom_properties().get("style").unwrap(),
        "bold"
    );
}
