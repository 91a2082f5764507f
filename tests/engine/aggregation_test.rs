use tablequery::engine::aggregation::{AggregationTree, ValueAggregator};
use tablequery::query::AggregationType;
use tablequery::value::{Value, ValueType};

#[test]
fn test_aggregator_over_dates() {
    let mut agg = ValueAggregator::new(ValueType::Date);
    for (y, m, d) in [(2021, 5, 3), (2020, 0, 1), (2022, 11, 31)] {
        agg.aggregate(&Value::date(y, m, d).unwrap());
    }
    assert_eq!(
        agg.value(AggregationType::Min),
        Value::date(2020, 0, 1).unwrap()
    );
    assert_eq!(
        agg.value(AggregationType::Max),
        Value::date(2022, 11, 31).unwrap()
    );
    assert_eq!(agg.value(AggregationType::Count), Value::number(3.0));
}

#[test]
fn test_aggregator_ignores_nulls() {
    let mut agg = ValueAggregator::new(ValueType::Number);
    agg.aggregate(&Value::Number(None));
    agg.aggregate(&Value::number(4.0));
    agg.aggregate(&Value::Number(None));
    agg.aggregate(&Value::number(6.0));
    assert_eq!(agg.value(AggregationType::Count), Value::number(2.0));
    assert_eq!(agg.value(AggregationType::Sum), Value::number(10.0));
    assert_eq!(agg.value(AggregationType::Avg), Value::number(5.0));
}

#[test]
fn test_every_node_along_the_path_accumulates() {
    let mut tree = AggregationTree::new(2, vec![("v".to_string(), ValueType::Number)]);
    for (a, b, v) in [("x", "p", 1.0), ("x", "q", 2.0), ("y", "p", 4.0)] {
        tree.aggregate(
            &[Value::text(a), Value::text(b)],
            &[Value::number(v)],
        )
        .unwrap();
    }

    // Full paths hold their own slices.
    assert_eq!(
        tree.value_at(
            &[Value::text("x"), Value::text("q")],
            "v",
            AggregationType::Sum
        )
        .unwrap(),
        Some(Value::number(2.0))
    );
    // Prefix paths hold the union of their subtrees.
    assert_eq!(
        tree.value_at(&[Value::text("x")], "v", AggregationType::Sum)
            .unwrap(),
        Some(Value::number(3.0))
    );
    // The root holds everything.
    assert_eq!(
        tree.value_at(&[], "v", AggregationType::Sum).unwrap(),
        Some(Value::number(7.0))
    );
}

#[test]
fn test_multiple_targets_are_tracked_independently() {
    let mut tree = AggregationTree::new(
        1,
        vec![
            ("v".to_string(), ValueType::Number),
            ("w".to_string(), ValueType::Text),
        ],
    );
    tree.aggregate(
        &[Value::text("k")],
        &[Value::number(5.0), Value::text("beta")],
    )
    .unwrap();
    tree.aggregate(
        &[Value::text("k")],
        &[Value::Number(None), Value::text("alpha")],
    )
    .unwrap();

    assert_eq!(
        tree.value_at(&[Value::text("k")], "v", AggregationType::Count)
            .unwrap(),
        Some(Value::number(1.0))
    );
    assert_eq!(
        tree.value_at(&[Value::text("k")], "w", AggregationType::Min)
            .unwrap(),
        Some(Value::text("alpha"))
    );
}

#[test]
fn test_paths_enumerate_in_key_order_per_level() {
    let mut tree = AggregationTree::new(2, vec![("v".to_string(), ValueType::Number)]);
    let keys = [
        (2.0, "b"),
        (1.0, "z"),
        (2.0, "a"),
        (1.0, "a"),
    ];
    for (first, second) in keys {
        tree.aggregate(
            &[Value::number(first), Value::text(second)],
            &[Value::number(1.0)],
        )
        .unwrap();
    }
    assert_eq!(
        tree.paths_to_leaves(),
        vec![
            vec![Value::number(1.0), Value::text("a")],
            vec![Value::number(1.0), Value::text("z")],
            vec![Value::number(2.0), Value::text("a")],
            vec![Value::number(2.0), Value::text("b")],
        ]
    );
}

#[test]
fn test_unobserved_path_has_no_value() {
    let mut tree = AggregationTree::new(1, vec![("v".to_string(), ValueType::Number)]);
    tree.aggregate(&[Value::text("seen")], &[Value::number(1.0)])
        .unwrap();
    assert!(tree.contains_path(&[Value::text("seen")]));
    assert!(!tree.contains_path(&[Value::text("unseen")]));
    assert_eq!(
        tree.value_at(&[Value::text("unseen")], "v", AggregationType::Count)
            .unwrap(),
        None
    );
}
