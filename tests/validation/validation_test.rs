use tablequery::error::{InvalidQueryCode, QueryError};
use tablequery::locale::Locale;
use tablequery::prelude::execute;
use tablequery::query::{AbstractColumn, AggregationType, ColumnSort, Query, ScalarFunction};
use tablequery::table::{ColumnDescription, DataTable, TableRow};
use tablequery::validation::validate;
use tablequery::value::{Value, ValueType};

fn orders() -> DataTable {
    let mut table = DataTable::new();
    table
        .add_columns([
            ColumnDescription::new("customer", ValueType::Text, "Customer"),
            ColumnDescription::new("region", ValueType::Text, "Region"),
            ColumnDescription::new("total", ValueType::Number, "Total"),
            ColumnDescription::new("placed", ValueType::Date, "Placed"),
        ])
        .unwrap();
    table
        .add_row(TableRow::from_values(vec![
            Value::text("ada"),
            Value::text("east"),
            Value::number(10.0),
            Value::date(2021, 0, 1).unwrap(),
        ]))
        .unwrap();
    table
}

fn expect_code(query: &Query, code: InvalidQueryCode) {
    match validate(query, &orders()) {
        Err(QueryError::InvalidQuery { code: actual, .. }) => assert_eq!(actual, code),
        other => panic!("expected {code:?}, got {other:?}"),
    }
}

#[test]
fn test_execute_validates_first() {
    let query = Query::new().with_selection(vec![AbstractColumn::simple("nope")]);
    let err = execute(&query, orders(), &Locale::new("en-US")).unwrap_err();
    assert!(matches!(
        err,
        QueryError::InvalidQuery {
            code: InvalidQueryCode::NoColumn,
            ..
        }
    ));
}

#[test]
fn test_messages_carry_the_offending_column() {
    let query = Query::new().with_selection(vec![AbstractColumn::aggregation(
        AggregationType::Avg,
        "region",
    )]);
    let err = validate(&query, &orders()).unwrap_err();
    let text = err.to_string();
    assert!(text.contains("AVG_SUM_ONLY_NUMERIC"));
    assert!(text.contains("region"));
}

#[test]
fn test_cross_clause_rules() {
    // Aggregated SELECT with an ungrouped bare column.
    expect_code(
        &Query::new().with_selection(vec![
            AbstractColumn::simple("customer"),
            AbstractColumn::aggregation(AggregationType::Sum, "total"),
        ]),
        InvalidQueryCode::UngroupedSelectColumn,
    );

    // GROUP BY without any aggregation.
    expect_code(
        &Query::new()
            .with_selection(vec![AbstractColumn::simple("customer")])
            .with_group(vec![AbstractColumn::simple("customer")]),
        InvalidQueryCode::CannotGroupWithoutAgg,
    );

    // A key cannot be both a group and a pivot column.
    expect_code(
        &Query::new()
            .with_selection(vec![AbstractColumn::aggregation(
                AggregationType::Sum,
                "total",
            )])
            .with_group(vec![AbstractColumn::simple("region")])
            .with_pivot(vec![AbstractColumn::simple("region")]),
        InvalidQueryCode::ColInGroupAndPivot,
    );

    // ORDER BY must stay within an aggregated SELECT.
    expect_code(
        &Query::new()
            .with_selection(vec![
                AbstractColumn::simple("region"),
                AbstractColumn::aggregation(AggregationType::Sum, "total"),
            ])
            .with_group(vec![AbstractColumn::simple("region")])
            .with_sort(vec![ColumnSort::asc(AbstractColumn::simple("customer"))]),
        InvalidQueryCode::SortColNotInSelect,
    );
}

#[test]
fn test_scalar_function_keys_validate_recursively() {
    // year(total) is a type error even when nested inside another function.
    let query = Query::new().with_selection(vec![AbstractColumn::scalar(
        ScalarFunction::Sum,
        vec![
            AbstractColumn::scalar(
                ScalarFunction::Year,
                vec![AbstractColumn::simple("region")],
            ),
            AbstractColumn::simple("total"),
        ],
    )]);
    expect_code(&query, InvalidQueryCode::InvalidScalarFunctionArgs);
}

#[test]
fn test_representative_valid_queries_pass() {
    let table = orders();

    let grouped = Query::new()
        .with_selection(vec![
            AbstractColumn::simple("region"),
            AbstractColumn::aggregation(AggregationType::Avg, "total"),
        ])
        .with_group(vec![AbstractColumn::simple("region")])
        .with_sort(vec![ColumnSort::desc(AbstractColumn::aggregation(
            AggregationType::Avg,
            "total",
        ))]);
    assert!(validate(&grouped, &table).is_ok());

    let pivoted = Query::new()
        .with_selection(vec![
            AbstractColumn::simple("region"),
            AbstractColumn::aggregation(AggregationType::Count, "customer"),
        ])
        .with_group(vec![AbstractColumn::simple("region")])
        .with_pivot(vec![AbstractColumn::scalar(
            ScalarFunction::Year,
            vec![AbstractColumn::simple("placed")],
        )]);
    assert!(validate(&pivoted, &table).is_ok());

    let plain = Query::new()
        .with_selection(vec![AbstractColumn::simple("customer")])
        .with_row_skipping(3)
        .with_row_limit(5);
    assert!(validate(&plain, &table).is_ok());
}
