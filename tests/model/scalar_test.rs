use tablequery::query::ScalarFunction;
use tablequery::value::{Value, ValueType};

#[test]
fn test_quarter_boundaries() {
    let cases = [
        (0, 1.0),  // January
        (2, 1.0),  // March
        (3, 2.0),  // April
        (8, 3.0),  // September
        (11, 4.0), // December
    ];
    for (month, quarter) in cases {
        assert_eq!(
            ScalarFunction::Quarter
                .evaluate(&[Value::date(2021, month, 1).unwrap()])
                .unwrap(),
            Value::number(quarter)
        );
    }
}

#[test]
fn test_dayofweek_over_a_week() {
    // 2021-08-01 was a Sunday; the week runs Sunday=1 .. Saturday=7.
    for offset in 0..7u32 {
        assert_eq!(
            ScalarFunction::DayOfWeek
                .evaluate(&[Value::date(2021, 7, 1 + offset).unwrap()])
                .unwrap(),
            Value::number((offset + 1) as f64)
        );
    }
}

#[test]
fn test_datediff_across_year_boundary() {
    let jan_2 = Value::date(2022, 0, 2).unwrap();
    let dec_30 = Value::date(2021, 11, 30).unwrap();
    assert_eq!(
        ScalarFunction::DateDiff.evaluate(&[jan_2, dec_30]).unwrap(),
        Value::number(3.0)
    );
}

#[test]
fn test_todate_truncates_datetime() {
    assert_eq!(
        ScalarFunction::ToDate
            .evaluate(&[Value::datetime(2021, 4, 20, 23, 59, 59, 999).unwrap()])
            .unwrap(),
        Value::date(2021, 4, 20).unwrap()
    );
}

#[test]
fn test_todate_from_epoch_millis() {
    // 2021-01-01T00:00:00Z is 1609459200000 ms after the epoch.
    assert_eq!(
        ScalarFunction::ToDate
            .evaluate(&[Value::number(1_609_459_200_000.0)])
            .unwrap(),
        Value::date(2021, 0, 1).unwrap()
    );
    // The epoch itself.
    assert_eq!(
        ScalarFunction::ToDate.evaluate(&[Value::number(0.0)]).unwrap(),
        Value::date(1970, 0, 1).unwrap()
    );
}

#[test]
fn test_time_extraction() {
    let t = Value::timeofday(14, 35, 6, 7).unwrap();
    assert_eq!(
        ScalarFunction::Hour.evaluate(&[t.clone()]).unwrap(),
        Value::number(14.0)
    );
    assert_eq!(
        ScalarFunction::Minute.evaluate(&[t.clone()]).unwrap(),
        Value::number(35.0)
    );
    assert_eq!(
        ScalarFunction::Second.evaluate(&[t.clone()]).unwrap(),
        Value::number(6.0)
    );
    assert_eq!(
        ScalarFunction::Millisecond.evaluate(&[t]).unwrap(),
        Value::number(7.0)
    );
}

#[test]
fn test_constant_carries_its_type() {
    let constant = ScalarFunction::Constant(Value::text("fixed"));
    assert_eq!(constant.return_type(&[]), ValueType::Text);
    assert_eq!(constant.evaluate(&[]).unwrap(), Value::text("fixed"));
    assert!(constant.validate(&[]).is_ok());
}

#[test]
fn test_nulls_propagate_to_the_declared_return_type() {
    assert_eq!(
        ScalarFunction::DateDiff
            .evaluate(&[Value::Date(None), Value::date(2021, 0, 1).unwrap()])
            .unwrap(),
        Value::Number(None)
    );
    assert_eq!(
        ScalarFunction::ToDate.evaluate(&[Value::DateTime(None)]).unwrap(),
        Value::Date(None)
    );
    assert_eq!(
        ScalarFunction::Lower.evaluate(&[Value::Text(None)]).unwrap(),
        Value::Text(None)
    );
}

#[test]
fn test_validation_messages_name_the_function() {
    let err = ScalarFunction::Upper
        .validate(&[ValueType::Number])
        .unwrap_err();
    assert!(err.to_string().contains("upper"));

    let err = ScalarFunction::DateDiff.validate(&[ValueType::Date]).unwrap_err();
    assert!(err.to_string().contains("datediff"));
}
