use tablequery::engine::execute;
use tablequery::error::ReasonCode;
use tablequery::locale::Locale;
use tablequery::query::{
    AbstractColumn, AggregationType, ColumnSort, ComparisonOperator, Query, QueryFilter,
    ScalarFunction,
};
use tablequery::table::{ColumnDescription, DataTable, TableRow};
use tablequery::value::{Value, ValueType};

fn locale() -> Locale {
    Locale::new("en-US")
}

fn run(query: &Query, table: DataTable) -> DataTable {
    execute(query, table, &locale()).unwrap()
}

fn grid(table: &DataTable) -> Vec<Vec<Value>> {
    table
        .rows()
        .iter()
        .map(|row| row.cells().iter().map(|c| c.value().clone()).collect())
        .collect()
}

fn ids(table: &DataTable) -> Vec<String> {
    table
        .columns()
        .iter()
        .map(|c| c.id().to_string())
        .collect()
}

fn simple(id: &str) -> AbstractColumn {
    AbstractColumn::simple(id)
}

fn agg(aggregation: AggregationType, id: &str) -> AbstractColumn {
    AbstractColumn::aggregation(aggregation, id)
}

fn name_amount_table(rows: &[(&str, f64)]) -> DataTable {
    let mut table = DataTable::new();
    table
        .add_columns([
            ColumnDescription::new("name", ValueType::Text, "Name"),
            ColumnDescription::new("amount", ValueType::Number, "Amount"),
        ])
        .unwrap();
    for (name, amount) in rows {
        table
            .add_row(TableRow::from_values(vec![
                Value::text(*name),
                Value::number(*amount),
            ]))
            .unwrap();
    }
    table
}

fn number_column_table(values: std::ops::Range<i64>) -> DataTable {
    let mut table = DataTable::new();
    table
        .add_column(ColumnDescription::new("x", ValueType::Number, "X"))
        .unwrap();
    for v in values {
        table
            .add_row(TableRow::from_values(vec![Value::number(v as f64)]))
            .unwrap();
    }
    table
}

// === Concrete end-to-end scenarios ===

#[test]
fn test_aggregation_with_group_by() {
    let table = name_amount_table(&[("a", 1.0), ("a", 2.0), ("b", 5.0)]);
    let query = Query::new()
        .with_selection(vec![simple("name"), agg(AggregationType::Sum, "amount")])
        .with_group(vec![simple("name")])
        .with_sort(vec![ColumnSort::asc(simple("name"))]);

    let result = run(&query, table);
    assert_eq!(ids(&result), vec!["name", "sum-amount"]);
    assert_eq!(
        grid(&result),
        vec![
            vec![Value::text("a"), Value::number(3.0)],
            vec![Value::text("b"), Value::number(5.0)],
        ]
    );
}

#[test]
fn test_pivot() {
    let mut table = DataTable::new();
    table
        .add_columns([
            ColumnDescription::new("k", ValueType::Text, "K"),
            ColumnDescription::new("p", ValueType::Text, "P"),
            ColumnDescription::new("v", ValueType::Number, "V"),
        ])
        .unwrap();
    for (k, p, v) in [("a", "x", 1.0), ("a", "y", 2.0), ("b", "x", 3.0)] {
        table
            .add_row(TableRow::from_values(vec![
                Value::text(k),
                Value::text(p),
                Value::number(v),
            ]))
            .unwrap();
    }
    let query = Query::new()
        .with_selection(vec![simple("k"), agg(AggregationType::Sum, "v")])
        .with_group(vec![simple("k")])
        .with_pivot(vec![simple("p")])
        .with_sort(vec![ColumnSort::asc(simple("k"))]);

    let result = run(&query, table);
    assert_eq!(ids(&result), vec!["k", "x sum-v", "y sum-v"]);
    assert_eq!(result.column(1).unwrap().value_type(), ValueType::Number);
    assert_eq!(result.column(2).unwrap().value_type(), ValueType::Number);
    assert_eq!(
        grid(&result),
        vec![
            vec![Value::text("a"), Value::number(1.0), Value::number(2.0)],
            vec![Value::text("b"), Value::number(3.0), Value::Number(None)],
        ]
    );
}

#[test]
fn test_filter_with_like() {
    let mut table = DataTable::new();
    table
        .add_column(ColumnDescription::new("n", ValueType::Text, "N"))
        .unwrap();
    for n in ["alpha", "beta", "gamma"] {
        table
            .add_row(TableRow::from_values(vec![Value::text(n)]))
            .unwrap();
    }
    let query = Query::new()
        .with_selection(vec![simple("n")])
        .with_filter(QueryFilter::column_value(
            simple("n"),
            Value::text("a%"),
            ComparisonOperator::Like,
        ));

    let result = run(&query, table);
    assert_eq!(grid(&result), vec![vec![Value::text("alpha")]]);
}

#[test]
fn test_pagination_attaches_truncation_warning() {
    let table = number_column_table(0..10);
    let query = Query::new()
        .with_selection(vec![simple("x")])
        .with_row_limit(3)
        .with_row_offset(5);

    let result = run(&query, table);
    assert_eq!(
        grid(&result),
        vec![
            vec![Value::number(5.0)],
            vec![Value::number(6.0)],
            vec![Value::number(7.0)],
        ]
    );
    assert_eq!(result.warnings().len(), 1);
    assert_eq!(result.warnings()[0].reason, ReasonCode::DataTruncated);
}

#[test]
fn test_scalar_function_in_group_by() {
    let mut table = DataTable::new();
    table
        .add_column(ColumnDescription::new("d", ValueType::Date, "D"))
        .unwrap();
    for (y, m, d) in [(2021, 0, 15), (2021, 5, 3), (2022, 0, 2)] {
        table
            .add_row(TableRow::from_values(vec![Value::date(y, m, d).unwrap()]))
            .unwrap();
    }
    let year_of_d = AbstractColumn::scalar(ScalarFunction::Year, vec![simple("d")]);
    let query = Query::new()
        .with_selection(vec![year_of_d.clone(), agg(AggregationType::Count, "d")])
        .with_group(vec![year_of_d.clone()])
        .with_sort(vec![ColumnSort::asc(year_of_d)]);

    let result = run(&query, table);
    assert_eq!(ids(&result), vec!["year_d", "count-d"]);
    assert_eq!(
        grid(&result),
        vec![
            vec![Value::number(2021.0), Value::number(2.0)],
            vec![Value::number(2022.0), Value::number(1.0)],
        ]
    );
}

// === Universal properties ===

#[test]
fn test_empty_query_is_identity() {
    let table = name_amount_table(&[("a", 1.0), ("b", 2.0)]);
    let result = run(&Query::new(), table.clone());
    assert_eq!(result, table);
}

#[test]
fn test_selecting_all_columns_in_order_is_identity() {
    let table = name_amount_table(&[("a", 1.0), ("b", 2.0)]);
    let query = Query::new().with_selection(vec![simple("name"), simple("amount")]);
    let result = run(&query, table.clone());
    assert_eq!(result, table);
}

#[test]
fn test_grouping_is_invariant_to_row_order() {
    let forwards = name_amount_table(&[("a", 1.0), ("a", 2.0), ("b", 5.0)]);
    let backwards = name_amount_table(&[("b", 5.0), ("a", 2.0), ("a", 1.0)]);
    let query = Query::new()
        .with_selection(vec![simple("name"), agg(AggregationType::Sum, "amount")])
        .with_group(vec![simple("name")])
        .with_sort(vec![ColumnSort::asc(simple("name"))]);

    assert_eq!(grid(&run(&query, forwards)), grid(&run(&query, backwards)));
}

#[test]
fn test_pivot_symmetry() {
    let build = || {
        let mut table = DataTable::new();
        table
            .add_columns([
                ColumnDescription::new("k", ValueType::Text, "K"),
                ColumnDescription::new("p1", ValueType::Text, "P1"),
                ColumnDescription::new("p2", ValueType::Text, "P2"),
                ColumnDescription::new("v", ValueType::Number, "V"),
            ])
            .unwrap();
        for (k, p1, p2, v) in [
            ("a", "m", "u", 1.0),
            ("a", "n", "u", 2.0),
            ("b", "m", "w", 3.0),
            ("b", "n", "u", 4.0),
        ] {
            table
                .add_row(TableRow::from_values(vec![
                    Value::text(k),
                    Value::text(p1),
                    Value::text(p2),
                    Value::number(v),
                ]))
                .unwrap();
        }
        table
    };

    let query = |pivot: Vec<AbstractColumn>| {
        Query::new()
            .with_selection(vec![simple("k"), agg(AggregationType::Sum, "v")])
            .with_group(vec![simple("k")])
            .with_pivot(pivot)
            .with_sort(vec![ColumnSort::asc(simple("k"))])
    };

    let first = run(&query(vec![simple("p1"), simple("p2")]), build());
    let second = run(&query(vec![simple("p2"), simple("p1")]), build());

    // Every pivoted column of the first result appears in the second with
    // the pivot vector transposed, holding the same cells.
    for (index, id) in ids(&first).iter().enumerate() {
        if index == 0 {
            continue;
        }
        let (vector, agg_id) = id.split_once(' ').unwrap();
        let (a, b) = vector.split_once(',').unwrap();
        let transposed = format!("{b},{a} {agg_id}");
        let other_index = second.column_index(&transposed).unwrap();
        for row in 0..first.num_rows() {
            assert_eq!(
                first.cell(row, index).unwrap().value(),
                second.cell(row, other_index).unwrap().value(),
                "mismatch at {id} / {transposed}"
            );
        }
    }
}

#[test]
fn test_aggregation_null_semantics() {
    let mut table = DataTable::new();
    table
        .add_column(ColumnDescription::new("v", ValueType::Number, "V"))
        .unwrap();
    for value in [None, None, None] {
        table
            .add_row(TableRow::from_values(vec![Value::Number(value)]))
            .unwrap();
    }
    let query = Query::new().with_selection(vec![
        agg(AggregationType::Count, "v"),
        agg(AggregationType::Sum, "v"),
        agg(AggregationType::Avg, "v"),
        agg(AggregationType::Min, "v"),
        agg(AggregationType::Max, "v"),
    ]);

    let result = run(&query, table);
    assert_eq!(
        grid(&result),
        vec![vec![
            Value::number(0.0),
            Value::Number(None),
            Value::Number(None),
            Value::Number(None),
            Value::Number(None),
        ]]
    );
}

#[test]
fn test_aggregations_skip_nulls_among_values() {
    let mut table = DataTable::new();
    table
        .add_column(ColumnDescription::new("v", ValueType::Number, "V"))
        .unwrap();
    for value in [Some(4.0), None, Some(8.0)] {
        table
            .add_row(TableRow::from_values(vec![Value::Number(value)]))
            .unwrap();
    }
    let query = Query::new().with_selection(vec![
        agg(AggregationType::Count, "v"),
        agg(AggregationType::Avg, "v"),
        agg(AggregationType::Min, "v"),
    ]);

    let result = run(&query, table);
    assert_eq!(
        grid(&result),
        vec![vec![
            Value::number(2.0),
            Value::number(6.0),
            Value::number(4.0),
        ]]
    );
}

#[test]
fn test_sort_is_stable() {
    let mut table = DataTable::new();
    table
        .add_columns([
            ColumnDescription::new("k", ValueType::Text, "K"),
            ColumnDescription::new("i", ValueType::Number, "I"),
        ])
        .unwrap();
    for (k, i) in [("b", 0.0), ("a", 1.0), ("b", 2.0), ("a", 3.0)] {
        table
            .add_row(TableRow::from_values(vec![
                Value::text(k),
                Value::number(i),
            ]))
            .unwrap();
    }
    let query = Query::new().with_sort(vec![ColumnSort::asc(simple("k"))]);

    let result = run(&query, table);
    let order: Vec<Value> = result
        .rows()
        .iter()
        .map(|r| r.cell(1).unwrap().value().clone())
        .collect();
    assert_eq!(
        order,
        vec![
            Value::number(1.0),
            Value::number(3.0),
            Value::number(0.0),
            Value::number(2.0),
        ]
    );
}

#[test]
fn test_descending_sort_negates() {
    let table = number_column_table(0..4);
    let query = Query::new().with_sort(vec![ColumnSort::desc(simple("x"))]);
    let result = run(&query, table);
    assert_eq!(
        grid(&result),
        vec![
            vec![Value::number(3.0)],
            vec![Value::number(2.0)],
            vec![Value::number(1.0)],
            vec![Value::number(0.0)],
        ]
    );
}

#[test]
fn test_skipping_keeps_every_kth_row() {
    let table = number_column_table(0..10);
    let query = Query::new().with_row_skipping(3);
    let result = run(&query, table);
    assert_eq!(
        grid(&result),
        vec![
            vec![Value::number(0.0)],
            vec![Value::number(3.0)],
            vec![Value::number(6.0)],
            vec![Value::number(9.0)],
        ]
    );
}

#[test]
fn test_skipping_of_one_is_identity() {
    let table = number_column_table(0..5);
    let query = Query::new().with_row_skipping(1);
    assert_eq!(run(&query, table.clone()), table);
}

#[test]
fn test_skipping_runs_before_pagination() {
    let table = number_column_table(0..10);
    let query = Query::new()
        .with_row_skipping(2)
        .with_row_limit(2)
        .with_row_offset(1);
    let result = run(&query, table);
    // Skip 2 keeps 0,2,4,6,8; offset 1 limit 2 takes 2 and 4.
    assert_eq!(
        grid(&result),
        vec![vec![Value::number(2.0)], vec![Value::number(4.0)]]
    );
    assert_eq!(result.warnings().len(), 1);
}

#[test]
fn test_pagination_without_trailing_cut_has_no_warning() {
    let table = number_column_table(0..10);
    let query = Query::new().with_row_limit(5).with_row_offset(5);
    let result = run(&query, table);
    assert_eq!(result.num_rows(), 5);
    assert!(result.warnings().is_empty());
}

// === Scalar functions and labels through the pipeline ===

#[test]
fn test_scalar_function_over_aggregations() {
    let table = name_amount_table(&[("a", 1.0), ("a", 2.0), ("b", 5.0)]);
    let ratio = AbstractColumn::scalar(
        ScalarFunction::Quotient,
        vec![
            agg(AggregationType::Sum, "amount"),
            agg(AggregationType::Count, "amount"),
        ],
    );
    let query = Query::new()
        .with_selection(vec![simple("name"), ratio])
        .with_group(vec![simple("name")])
        .with_sort(vec![ColumnSort::asc(simple("name"))]);

    let result = run(&query, table);
    assert_eq!(
        ids(&result),
        vec!["name", "quotient_sum-amount,count-amount"]
    );
    assert_eq!(
        grid(&result),
        vec![
            vec![Value::text("a"), Value::number(1.5)],
            vec![Value::text("b"), Value::number(5.0)],
        ]
    );
}

#[test]
fn test_scalar_function_evaluated_at_selection() {
    let table = name_amount_table(&[("a", 2.0), ("b", 3.0)]);
    let doubled = AbstractColumn::scalar(
        ScalarFunction::Product,
        vec![
            simple("amount"),
            AbstractColumn::scalar(ScalarFunction::Constant(Value::number(2.0)), vec![]),
        ],
    );
    let query = Query::new().with_selection(vec![simple("name"), doubled]);

    let result = run(&query, table);
    assert_eq!(
        grid(&result),
        vec![
            vec![Value::text("a"), Value::number(4.0)],
            vec![Value::text("b"), Value::number(6.0)],
        ]
    );
}

#[test]
fn test_labels_apply_and_compose_with_pivot() {
    let mut table = DataTable::new();
    table
        .add_columns([
            ColumnDescription::new("k", ValueType::Text, "K"),
            ColumnDescription::new("p", ValueType::Text, "P"),
            ColumnDescription::new("v", ValueType::Number, "V"),
        ])
        .unwrap();
    for (k, p, v) in [("a", "x", 1.0), ("a", "y", 2.0)] {
        table
            .add_row(TableRow::from_values(vec![
                Value::text(k),
                Value::text(p),
                Value::number(v),
            ]))
            .unwrap();
    }
    let query = Query::new()
        .with_selection(vec![simple("k"), agg(AggregationType::Sum, "v")])
        .with_group(vec![simple("k")])
        .with_pivot(vec![simple("p")])
        .with_label(simple("k"), "Key")
        .with_label(agg(AggregationType::Sum, "v"), "Total");

    let result = run(&query, table);
    let labels: Vec<&str> = result.columns().iter().map(|c| c.label()).collect();
    assert_eq!(labels, vec!["Key", "x Total", "y Total"]);
}

#[test]
fn test_filter_group_sort_pipeline() {
    let table = name_amount_table(&[
        ("a", 1.0),
        ("b", 10.0),
        ("a", 2.0),
        ("c", 1.0),
        ("b", 20.0),
    ]);
    let query = Query::new()
        .with_selection(vec![simple("name"), agg(AggregationType::Sum, "amount")])
        .with_filter(QueryFilter::negation(QueryFilter::column_value(
            simple("name"),
            Value::text("c"),
            ComparisonOperator::Eq,
        )))
        .with_group(vec![simple("name")])
        .with_sort(vec![ColumnSort::desc(agg(AggregationType::Sum, "amount"))]);

    let result = run(&query, table);
    assert_eq!(
        grid(&result),
        vec![
            vec![Value::text("b"), Value::number(30.0)],
            vec![Value::text("a"), Value::number(3.0)],
        ]
    );
}

#[test]
fn test_global_aggregation_over_empty_table_yields_one_row() {
    let table = name_amount_table(&[]);
    let query = Query::new().with_selection(vec![
        agg(AggregationType::Count, "amount"),
        agg(AggregationType::Sum, "amount"),
    ]);
    let result = run(&query, table);
    assert_eq!(
        grid(&result),
        vec![vec![Value::number(0.0), Value::Number(None)]]
    );
}

#[test]
fn test_grouped_query_over_empty_table_yields_no_rows() {
    let table = name_amount_table(&[]);
    let query = Query::new()
        .with_selection(vec![simple("name"), agg(AggregationType::Sum, "amount")])
        .with_group(vec![simple("name")]);
    let result = run(&query, table);
    assert_eq!(result.num_rows(), 0);
    assert_eq!(ids(&result), vec!["name", "sum-amount"]);
}

#[test]
fn test_min_max_keep_target_type() {
    let mut table = DataTable::new();
    table
        .add_columns([
            ColumnDescription::new("k", ValueType::Text, "K"),
            ColumnDescription::new("d", ValueType::Date, "D"),
        ])
        .unwrap();
    for (k, (y, m, day)) in [("a", (2021, 0, 5)), ("a", (2020, 6, 1)), ("b", (2022, 2, 9))] {
        table
            .add_row(TableRow::from_values(vec![
                Value::text(k),
                Value::date(y, m, day).unwrap(),
            ]))
            .unwrap();
    }
    let query = Query::new()
        .with_selection(vec![simple("k"), agg(AggregationType::Min, "d")])
        .with_group(vec![simple("k")])
        .with_sort(vec![ColumnSort::asc(simple("k"))]);

    let result = run(&query, table);
    assert_eq!(result.column(1).unwrap().value_type(), ValueType::Date);
    assert_eq!(
        grid(&result),
        vec![
            vec![Value::text("a"), Value::date(2020, 6, 1).unwrap()],
            vec![Value::text("b"), Value::date(2022, 2, 9).unwrap()],
        ]
    );
}
