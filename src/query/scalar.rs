//! The scalar-function catalog.
//!
//! Deterministic per-row functions with declared arity and type rules. Any
//! null argument produces the null of the declared return type.

use chrono::{DateTime, Datelike};

use crate::error::{InvalidQueryCode, QueryError, QueryResult};
use crate::value::{DateTimeValue, DateValue, TimeOfDayValue, Value, ValueType};

/// A scalar function. `Constant` carries its value; every other variant is a
/// pure function of its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarFunction {
    // Date part extraction
    Year,
    Month,
    Day,
    Quarter,
    DayOfWeek,
    // Time part extraction
    Hour,
    Minute,
    Second,
    Millisecond,
    // Date arithmetic
    DateDiff,
    Now,
    ToDate,
    // Numeric arithmetic
    Sum,
    Difference,
    Product,
    Quotient,
    Modulo,
    // Text
    Upper,
    Lower,
    // Literal
    Constant(Value),
}

impl ScalarFunction {
    /// Canonical lowercase name as emitted in query strings.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarFunction::Year => "year",
            ScalarFunction::Month => "month",
            ScalarFunction::Day => "day",
            ScalarFunction::Quarter => "quarter",
            ScalarFunction::DayOfWeek => "dayofweek",
            ScalarFunction::Hour => "hour",
            ScalarFunction::Minute => "minute",
            ScalarFunction::Second => "second",
            ScalarFunction::Millisecond => "millisecond",
            ScalarFunction::DateDiff => "datediff",
            ScalarFunction::Now => "now",
            ScalarFunction::ToDate => "todate",
            ScalarFunction::Sum => "sum",
            ScalarFunction::Difference => "difference",
            ScalarFunction::Product => "product",
            ScalarFunction::Quotient => "quotient",
            ScalarFunction::Modulo => "modulo",
            ScalarFunction::Upper => "upper",
            ScalarFunction::Lower => "lower",
            ScalarFunction::Constant(_) => "constant",
        }
    }

    /// Look a function up by name, case-insensitively. `constant` is not
    /// nameable; constants are built from parsed literals.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "year" => Some(ScalarFunction::Year),
            "month" => Some(ScalarFunction::Month),
            "day" => Some(ScalarFunction::Day),
            "quarter" => Some(ScalarFunction::Quarter),
            "dayofweek" => Some(ScalarFunction::DayOfWeek),
            "hour" => Some(ScalarFunction::Hour),
            "minute" => Some(ScalarFunction::Minute),
            "second" => Some(ScalarFunction::Second),
            "millisecond" => Some(ScalarFunction::Millisecond),
            "datediff" => Some(ScalarFunction::DateDiff),
            "now" => Some(ScalarFunction::Now),
            "todate" => Some(ScalarFunction::ToDate),
            "sum" => Some(ScalarFunction::Sum),
            "difference" => Some(ScalarFunction::Difference),
            "product" => Some(ScalarFunction::Product),
            "quotient" => Some(ScalarFunction::Quotient),
            "modulo" => Some(ScalarFunction::Modulo),
            "upper" => Some(ScalarFunction::Upper),
            "lower" => Some(ScalarFunction::Lower),
            _ => None,
        }
    }

    fn arity(&self) -> usize {
        match self {
            ScalarFunction::Now | ScalarFunction::Constant(_) => 0,
            ScalarFunction::DateDiff
            | ScalarFunction::Sum
            | ScalarFunction::Difference
            | ScalarFunction::Product
            | ScalarFunction::Quotient
            | ScalarFunction::Modulo => 2,
            _ => 1,
        }
    }

    fn is_binary_numeric(&self) -> bool {
        matches!(
            self,
            ScalarFunction::Sum
                | ScalarFunction::Difference
                | ScalarFunction::Product
                | ScalarFunction::Quotient
                | ScalarFunction::Modulo
        )
    }

    fn operator_symbol(&self) -> Option<&'static str> {
        match self {
            ScalarFunction::Sum => Some("+"),
            ScalarFunction::Difference => Some("-"),
            ScalarFunction::Product => Some("*"),
            ScalarFunction::Quotient => Some("/"),
            ScalarFunction::Modulo => Some("%"),
            _ => None,
        }
    }

    /// Check argument types, raising an invalid-query error with a readable
    /// message on mismatch.
    pub fn validate(&self, arg_types: &[ValueType]) -> QueryResult<()> {
        if arg_types.len() != self.arity() {
            return Err(invalid_args(format!(
                "Function '{}' takes {} argument(s) but was given {}.",
                self.name(),
                self.arity(),
                arg_types.len()
            )));
        }
        let check = |index: usize, allowed: &[ValueType]| -> QueryResult<()> {
            let actual = arg_types[index];
            if allowed.contains(&actual) {
                Ok(())
            } else {
                Err(invalid_args(format!(
                    "Function '{}' cannot be applied to a {} argument.",
                    self.name(),
                    actual
                )))
            }
        };
        match self {
            ScalarFunction::Year
            | ScalarFunction::Month
            | ScalarFunction::Day
            | ScalarFunction::Quarter
            | ScalarFunction::DayOfWeek => check(0, &[ValueType::Date, ValueType::DateTime]),
            ScalarFunction::Hour
            | ScalarFunction::Minute
            | ScalarFunction::Second
            | ScalarFunction::Millisecond => check(0, &[ValueType::TimeOfDay, ValueType::DateTime]),
            ScalarFunction::DateDiff => {
                check(0, &[ValueType::Date, ValueType::DateTime])?;
                check(1, &[ValueType::Date, ValueType::DateTime])
            }
            ScalarFunction::ToDate => check(
                0,
                &[ValueType::Date, ValueType::DateTime, ValueType::Number],
            ),
            ScalarFunction::Upper | ScalarFunction::Lower => check(0, &[ValueType::Text]),
            _ if self.is_binary_numeric() => {
                check(0, &[ValueType::Number])?;
                check(1, &[ValueType::Number])
            }
            ScalarFunction::Now | ScalarFunction::Constant(_) => Ok(()),
            _ => Ok(()),
        }
    }

    /// The declared return type for valid argument types.
    pub fn return_type(&self, _arg_types: &[ValueType]) -> ValueType {
        match self {
            ScalarFunction::Year
            | ScalarFunction::Month
            | ScalarFunction::Day
            | ScalarFunction::Quarter
            | ScalarFunction::DayOfWeek
            | ScalarFunction::Hour
            | ScalarFunction::Minute
            | ScalarFunction::Second
            | ScalarFunction::Millisecond
            | ScalarFunction::DateDiff
            | ScalarFunction::Sum
            | ScalarFunction::Difference
            | ScalarFunction::Product
            | ScalarFunction::Quotient
            | ScalarFunction::Modulo => ValueType::Number,
            ScalarFunction::Now => ValueType::DateTime,
            ScalarFunction::ToDate => ValueType::Date,
            ScalarFunction::Upper | ScalarFunction::Lower => ValueType::Text,
            ScalarFunction::Constant(v) => v.value_type(),
        }
    }

    /// Apply the function. Any null argument short-circuits to the null of
    /// the return type.
    pub fn evaluate(&self, args: &[Value]) -> QueryResult<Value> {
        if args.len() != self.arity() {
            return Err(QueryError::Internal(format!(
                "function '{}' evaluated with {} argument(s), expected {}",
                self.name(),
                args.len(),
                self.arity()
            )));
        }
        if args.iter().any(Value::is_null) {
            let arg_types: Vec<ValueType> = args.iter().map(Value::value_type).collect();
            return Ok(Value::null_of(self.return_type(&arg_types)));
        }
        match self {
            ScalarFunction::Year => date_number(&args[0], |d| d.year() as f64),
            ScalarFunction::Month => date_number(&args[0], |d| d.month() as f64),
            ScalarFunction::Day => date_number(&args[0], |d| d.day() as f64),
            ScalarFunction::Quarter => date_number(&args[0], |d| (d.month() / 3 + 1) as f64),
            ScalarFunction::DayOfWeek => date_number(&args[0], |d| {
                (d.to_naive().weekday().num_days_from_sunday() + 1) as f64
            }),
            ScalarFunction::Hour => time_number(&args[0], |t| t.hour() as f64),
            ScalarFunction::Minute => time_number(&args[0], |t| t.minute() as f64),
            ScalarFunction::Second => time_number(&args[0], |t| t.second() as f64),
            ScalarFunction::Millisecond => time_number(&args[0], |t| t.millisecond() as f64),
            ScalarFunction::DateDiff => {
                let a = date_part(&args[0])?;
                let b = date_part(&args[1])?;
                let days = a.to_naive().signed_duration_since(b.to_naive()).num_days();
                Ok(Value::number(days as f64))
            }
            ScalarFunction::Now => {
                let now = chrono::Utc::now().naive_utc();
                Ok(Value::DateTime(Some(DateTimeValue::from_naive(now))))
            }
            ScalarFunction::ToDate => match &args[0] {
                Value::Date(Some(d)) => Ok(Value::Date(Some(*d))),
                Value::DateTime(Some(dt)) => Ok(Value::Date(Some(dt.date_part()))),
                Value::Number(Some(ms)) => Ok(millis_to_date(*ms)),
                other => Err(wrong_argument(self, other)),
            },
            ScalarFunction::Sum => numeric_op(self, args, |a, b| Some(a + b)),
            ScalarFunction::Difference => numeric_op(self, args, |a, b| Some(a - b)),
            ScalarFunction::Product => numeric_op(self, args, |a, b| Some(a * b)),
            ScalarFunction::Quotient => {
                numeric_op(self, args, |a, b| if b == 0.0 { None } else { Some(a / b) })
            }
            ScalarFunction::Modulo => {
                numeric_op(self, args, |a, b| if b == 0.0 { None } else { Some(a % b) })
            }
            ScalarFunction::Upper => text_op(self, &args[0], |s| s.to_uppercase()),
            ScalarFunction::Lower => text_op(self, &args[0], |s| s.to_lowercase()),
            ScalarFunction::Constant(v) => Ok(v.clone()),
        }
    }

    /// Render the query-language form given already-rendered arguments.
    /// Binary numeric functions render infix; constants render their
    /// literal; everything else renders `name(args)`.
    pub fn to_query_string(&self, args: &[String]) -> QueryResult<String> {
        if let Some(symbol) = self.operator_symbol() {
            return Ok(format!("({} {} {})", args[0], symbol, args[1]));
        }
        if let ScalarFunction::Constant(v) = self {
            return v.to_query_string();
        }
        Ok(format!("{}({})", self.name(), args.join(", ")))
    }
}

/// Calendar fields shared by DATE and DATETIME arguments.
fn date_part(value: &Value) -> QueryResult<DateValue> {
    match value {
        Value::Date(Some(d)) => Ok(*d),
        Value::DateTime(Some(dt)) => Ok(dt.date_part()),
        other => Err(QueryError::Internal(format!(
            "expected a date argument, got {}",
            other.value_type()
        ))),
    }
}

fn date_number(value: &Value, f: impl Fn(&DateValue) -> f64) -> QueryResult<Value> {
    let date = date_part(value)?;
    Ok(Value::number(f(&date)))
}

/// Clock fields shared by TIMEOFDAY and DATETIME arguments.
fn time_number(value: &Value, f: impl Fn(&TimeOfDayValue) -> f64) -> QueryResult<Value> {
    let time = match value {
        Value::TimeOfDay(Some(t)) => *t,
        Value::DateTime(Some(dt)) => dt.time_part(),
        other => {
            return Err(QueryError::Internal(format!(
                "expected a time argument, got {}",
                other.value_type()
            )))
        }
    };
    Ok(Value::number(f(&time)))
}

/// Milliseconds since the epoch, GMT. Unconvertible inputs produce the null
/// date.
fn millis_to_date(ms: f64) -> Value {
    if !ms.is_finite() {
        return Value::Date(None);
    }
    match DateTime::from_timestamp_millis(ms as i64) {
        Some(dt) => Value::Date(Some(DateValue::from_naive(dt.naive_utc().date()))),
        None => Value::Date(None),
    }
}

fn numeric_op(
    function: &ScalarFunction,
    args: &[Value],
    f: impl Fn(f64, f64) -> Option<f64>,
) -> QueryResult<Value> {
    match (&args[0], &args[1]) {
        (Value::Number(Some(a)), Value::Number(Some(b))) => Ok(Value::Number(f(*a, *b))),
        (other, _) => Err(wrong_argument(function, other)),
    }
}

fn text_op(
    function: &ScalarFunction,
    arg: &Value,
    f: impl Fn(&str) -> String,
) -> QueryResult<Value> {
    match arg {
        Value::Text(Some(s)) => Ok(Value::text(f(s))),
        other => Err(wrong_argument(function, other)),
    }
}

fn wrong_argument(function: &ScalarFunction, value: &Value) -> QueryError {
    QueryError::Internal(format!(
        "function '{}' evaluated with a {} argument",
        function.name(),
        value.value_type()
    ))
}

fn invalid_args(message: String) -> QueryError {
    QueryError::invalid_query(InvalidQueryCode::InvalidScalarFunctionArgs, message)
}
