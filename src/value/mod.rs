//! The typed value model.
//!
//! A [`Value`] is one of six scalar types, each with its own null
//! inhabitant. Values are immutable, totally ordered within a type, and know
//! how to render themselves as query-language literals.

mod compare;
mod datetime;

pub use compare::ValueComparator;
pub use datetime::{DateTimeValue, DateValue, TimeOfDayValue};

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};

/// Errors raised when constructing a value from invalid calendar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("invalid date: year {year}, month {month}, day {day}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("invalid time of day: {hour}:{minute}:{second}.{millisecond}")]
    InvalidTimeOfDay {
        hour: u32,
        minute: u32,
        second: u32,
        millisecond: u32,
    },
}

/// The six scalar types of the value model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Boolean,
    Number,
    Text,
    Date,
    DateTime,
    TimeOfDay,
}

impl ValueType {
    /// The type code used in the query-language surface.
    pub fn code(&self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Number => "number",
            ValueType::Text => "string",
            ValueType::Date => "date",
            ValueType::DateTime => "datetime",
            ValueType::TimeOfDay => "timeofday",
        }
    }

    /// Arbitrary but stable rank used to order values of different types.
    fn rank(&self) -> u8 {
        match self {
            ValueType::Boolean => 0,
            ValueType::Number => 1,
            ValueType::Text => 2,
            ValueType::Date => 3,
            ValueType::DateTime => 4,
            ValueType::TimeOfDay => 5,
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A typed scalar value. `None` payloads are the typed nulls.
#[derive(Debug, Clone)]
pub enum Value {
    Boolean(Option<bool>),
    Number(Option<f64>),
    Text(Option<String>),
    Date(Option<DateValue>),
    DateTime(Option<DateTimeValue>),
    TimeOfDay(Option<TimeOfDayValue>),
}

impl Value {
    /// The null value of a given type. Total over [`ValueType`].
    pub fn null_of(value_type: ValueType) -> Value {
        match value_type {
            ValueType::Boolean => Value::Boolean(None),
            ValueType::Number => Value::Number(None),
            ValueType::Text => Value::Text(None),
            ValueType::Date => Value::Date(None),
            ValueType::DateTime => Value::DateTime(None),
            ValueType::TimeOfDay => Value::TimeOfDay(None),
        }
    }

    pub fn boolean(value: bool) -> Value {
        Value::Boolean(Some(value))
    }

    pub fn number(value: f64) -> Value {
        Value::Number(Some(value))
    }

    pub fn text(value: impl Into<String>) -> Value {
        Value::Text(Some(value.into()))
    }

    /// A date value from year / 0-indexed month / day, validating the fields.
    pub fn date(year: i32, month: u32, day: u32) -> Result<Value, ValueError> {
        Ok(Value::Date(Some(DateValue::new(year, month, day)?)))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn datetime(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        millisecond: u32,
    ) -> Result<Value, ValueError> {
        Ok(Value::DateTime(Some(DateTimeValue::new(
            year,
            month,
            day,
            hour,
            minute,
            second,
            millisecond,
        )?)))
    }

    pub fn timeofday(
        hour: u32,
        minute: u32,
        second: u32,
        millisecond: u32,
    ) -> Result<Value, ValueError> {
        Ok(Value::TimeOfDay(Some(TimeOfDayValue::new(
            hour,
            minute,
            second,
            millisecond,
        )?)))
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Boolean(_) => ValueType::Boolean,
            Value::Number(_) => ValueType::Number,
            Value::Text(_) => ValueType::Text,
            Value::Date(_) => ValueType::Date,
            Value::DateTime(_) => ValueType::DateTime,
            Value::TimeOfDay(_) => ValueType::TimeOfDay,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Boolean(v) => v.is_none(),
            Value::Number(v) => v.is_none(),
            Value::Text(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::DateTime(v) => v.is_none(),
            Value::TimeOfDay(v) => v.is_none(),
        }
    }

    /// Total order. Within a type, null sorts below every non-null and nulls
    /// tie; across types the ordering falls back to the type rank. The
    /// engine only ever compares values of one type (schema enforcement
    /// guarantees it); the cross-type branch exists so the order stays
    /// total.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => match (a, b) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(x), Some(y)) => x.total_cmp(y),
            },
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::TimeOfDay(a), Value::TimeOfDay(b)) => a.cmp(b),
            _ => self.value_type().rank().cmp(&other.value_type().rank()),
        }
    }

    /// Render the value as a literal the query parser round-trips.
    ///
    /// Nulls have no literal form; asking for one is a programming error.
    pub fn to_query_string(&self) -> QueryResult<String> {
        if self.is_null() {
            return Err(QueryError::Internal(
                "null value has no query literal".into(),
            ));
        }
        match self {
            Value::Boolean(Some(b)) => Ok(b.to_string()),
            Value::Number(Some(n)) => number_literal(*n),
            Value::Text(Some(s)) => quote_string(s),
            Value::Date(Some(d)) => Ok(format!(
                "DATE '{}-{}-{}'",
                d.year(),
                d.month() + 1,
                d.day()
            )),
            Value::TimeOfDay(Some(t)) => Ok(format!("TIMEOFDAY '{}'", time_literal_body(t))),
            Value::DateTime(Some(dt)) => Ok(format!(
                "DATETIME '{}-{}-{} {}'",
                dt.year(),
                dt.month() + 1,
                dt.day(),
                time_literal_body(&dt.time_part())
            )),
            _ => unreachable!("null handled above"),
        }
    }
}

/// `H:m:s` with a `.SSS` suffix only when the milliseconds are nonzero.
fn time_literal_body(t: &TimeOfDayValue) -> String {
    if t.millisecond() == 0 {
        format!("{}:{}:{}", t.hour(), t.minute(), t.second())
    } else {
        format!(
            "{}:{}:{}.{:03}",
            t.hour(),
            t.minute(),
            t.second(),
            t.millisecond()
        )
    }
}

/// Render a number literal. Non-finite numbers have no literal form.
pub(crate) fn number_literal(n: f64) -> QueryResult<String> {
    if !n.is_finite() {
        return Err(QueryError::Internal(format!(
            "non-finite number {n} has no query literal"
        )));
    }
    let mut buffer = ryu::Buffer::new();
    Ok(buffer.format(n).to_string())
}

/// Quote a text literal: double quotes unless the contents contain one, then
/// single quotes; strings containing both kinds are rejected.
pub(crate) fn quote_string(s: &str) -> QueryResult<String> {
    if !s.contains('"') {
        Ok(format!("\"{s}\""))
    } else if !s.contains('\'') {
        Ok(format!("'{s}'"))
    } else {
        Err(QueryError::Internal(format!(
            "string literal contains both quote kinds: {s}"
        )))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Boolean(None)
            | Value::Number(None)
            | Value::Text(None)
            | Value::Date(None)
            | Value::DateTime(None)
            | Value::TimeOfDay(None) => f.write_str("null"),
            Value::Boolean(Some(b)) => write!(f, "{b}"),
            Value::Number(Some(n)) => {
                let mut buffer = ryu::Buffer::new();
                f.write_str(buffer.format(*n))
            }
            Value::Text(Some(s)) => f.write_str(s),
            Value::Date(Some(d)) => write!(f, "{d}"),
            Value::DateTime(Some(dt)) => write!(f, "{dt}"),
            Value::TimeOfDay(Some(t)) => write!(f, "{t}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value_type().rank().hash(state);
        match self {
            Value::Boolean(v) => v.hash(state),
            Value::Number(v) => v.map(f64::to_bits).hash(state),
            Value::Text(v) => v.hash(state),
            Value::Date(v) => v.hash(state),
            Value::DateTime(v) => v.hash(state),
            Value::TimeOfDay(v) => v.hash(state),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::boolean(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::text(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::text(value)
    }
}
