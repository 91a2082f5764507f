use tablequery::query::{
    AbstractColumn, AggregationType, ColumnSort, ComparisonOperator, Query, QueryFilter,
    QueryOptions, ScalarFunction,
};
use tablequery::value::Value;

fn simple(id: &str) -> AbstractColumn {
    AbstractColumn::simple(id)
}

fn sum(id: &str) -> AbstractColumn {
    AbstractColumn::aggregation(AggregationType::Sum, id)
}

#[test]
fn test_full_query_emission() {
    let query = Query::new()
        .with_selection(vec![simple("name"), sum("amount")])
        .with_filter(QueryFilter::and(vec![
            QueryFilter::column_value(
                simple("amount"),
                Value::number(3.0),
                ComparisonOperator::Gt,
            ),
            QueryFilter::negation(QueryFilter::is_null(simple("name"))),
        ]))
        .with_group(vec![simple("name")])
        .with_sort(vec![ColumnSort::desc(sum("amount"))])
        .with_row_limit(10)
        .with_row_offset(2)
        .with_label(simple("name"), "Name")
        .with_format(sum("amount"), "#,##0");

    insta::assert_snapshot!(
        query.to_query_string().unwrap(),
        @r##"SELECT `name`, sum(`amount`) WHERE (`amount` > 3.0 AND NOT (`name` IS NULL)) GROUP BY `name` ORDER BY sum(`amount`) DESC LIMIT 10 OFFSET 2 LABEL `name` "Name" FORMAT sum(`amount`) "#,##0""##
    );
}

#[test]
fn test_scalar_functions_pivot_and_options() {
    let year_of_day = AbstractColumn::scalar(ScalarFunction::Year, vec![simple("day")]);
    let query = Query::new()
        .with_selection(vec![
            year_of_day.clone(),
            AbstractColumn::aggregation(AggregationType::Count, "day"),
        ])
        .with_group(vec![year_of_day])
        .with_pivot(vec![simple("region")])
        .with_row_skipping(2)
        .with_options(QueryOptions {
            no_values: false,
            no_format: true,
        });

    insta::assert_snapshot!(
        query.to_query_string().unwrap(),
        @"SELECT year(`day`), count(`day`) GROUP BY year(`day`) PIVOT `region` SKIPPING 2 OPTIONS NO_FORMAT"
    );
}

#[test]
fn test_typed_literals_and_reversed_comparisons() {
    let query = Query::new().with_filter(QueryFilter::or(vec![
        QueryFilter::value_column(
            Value::date(2021, 0, 15).unwrap(),
            simple("day"),
            ComparisonOperator::Gt,
        ),
        QueryFilter::column_value(
            simple("name"),
            Value::text("a%"),
            ComparisonOperator::Like,
        ),
    ]));

    insta::assert_snapshot!(
        query.to_query_string().unwrap(),
        @r#"WHERE (DATE '2021-1-15' > `day` OR `name` LIKE "a%")"#
    );
}

#[test]
fn test_binary_scalar_functions_render_infix() {
    let query = Query::new().with_selection(vec![AbstractColumn::scalar(
        ScalarFunction::Difference,
        vec![simple("a"), simple("b")],
    )]);
    assert_eq!(query.to_query_string().unwrap(), "SELECT (`a` - `b`)");
}

#[test]
fn test_constant_renders_its_literal() {
    let query = Query::new().with_selection(vec![
        simple("a"),
        AbstractColumn::scalar(
            ScalarFunction::Product,
            vec![
                simple("a"),
                AbstractColumn::scalar(
                    ScalarFunction::Constant(Value::number(2.0)),
                    vec![],
                ),
            ],
        ),
    ]);
    assert_eq!(
        query.to_query_string().unwrap(),
        "SELECT `a`, (`a` * 2.0)"
    );
}

#[test]
fn test_emission_is_deterministic() {
    let build = || {
        Query::new()
            .with_selection(vec![simple("k"), sum("v")])
            .with_group(vec![simple("k")])
            .with_sort(vec![ColumnSort::asc(simple("k"))])
    };
    assert_eq!(build(), build());
    assert_eq!(
        build().to_query_string().unwrap(),
        build().to_query_string().unwrap()
    );
    assert_eq!(
        build().to_query_string().unwrap(),
        "SELECT `k`, sum(`v`) GROUP BY `k` ORDER BY `k`"
    );
}

#[test]
fn test_unquotable_ids_are_rejected_at_emission() {
    let query = Query::new().with_selection(vec![simple("bad`tick")]);
    assert!(query.to_query_string().is_err());
}

#[test]
fn test_unlimited_queries_emit_no_limit_clause() {
    let query = Query::new()
        .with_selection(vec![simple("a")])
        .with_row_offset(4);
    assert_eq!(query.to_query_string().unwrap(), "SELECT `a` OFFSET 4");
}
