//! Pattern-driven value formatting.
//!
//! Pattern compilation is fallible; the engine turns a failed compile into
//! an `ILLEGAL_FORMATTING_PATTERNS` warning and leaves the column alone.
//! Null values always format to the empty string.
//!
//! Supported pattern languages, by column type:
//!
//! - NUMBER: decimal patterns like `#,##0.00`, `0.0%`, `$#,##0` - a prefix,
//!   a digit body with optional grouping and fraction digits, a suffix.
//! - DATE / DATETIME / TIMEOFDAY: `SimpleDateFormat`-style subsets such as
//!   `yyyy-MM-dd` or `HH:mm:ss.SSS`, with `'...'`-quoted literals.
//! - BOOLEAN: `true-label:false-label`.
//! - TEXT: the identity.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::locale::Locale;
use crate::value::{Value, ValueType};

/// Errors raised when compiling a pattern or parsing formatted text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    #[error("illegal formatting pattern '{pattern}' for type {value_type}")]
    IllegalPattern {
        pattern: String,
        value_type: ValueType,
    },

    #[error("cannot parse '{text}' as {value_type}")]
    UnparseableText { text: String, value_type: ValueType },
}

/// A compiled formatter for one column type.
#[derive(Debug, Clone)]
pub enum Formatter {
    Number(NumberFormat),
    Boolean(BooleanFormat),
    Text,
    Calendar(CalendarFormat),
}

/// Compile a pattern for a column type and locale.
pub fn compile(
    value_type: ValueType,
    pattern: &str,
    locale: &Locale,
) -> Result<Formatter, FormatError> {
    match value_type {
        ValueType::Number => NumberFormat::compile(pattern, locale).map(Formatter::Number),
        ValueType::Boolean => BooleanFormat::compile(pattern).map(Formatter::Boolean),
        ValueType::Text => Ok(Formatter::Text),
        ValueType::Date | ValueType::DateTime | ValueType::TimeOfDay => {
            CalendarFormat::compile(pattern, value_type).map(Formatter::Calendar)
        }
    }
}

impl Formatter {
    /// Render a value. Nulls render as the empty string.
    pub fn format(&self, value: &Value) -> String {
        if value.is_null() {
            return String::new();
        }
        match self {
            Formatter::Number(f) => f.format(value),
            Formatter::Boolean(f) => f.format(value),
            Formatter::Text => value.to_string(),
            Formatter::Calendar(f) => f.format(value),
        }
    }

    /// Parse formatted text back into a value, where the pattern language
    /// supports it (numbers and booleans).
    pub fn parse(&self, text: &str) -> Result<Value, FormatError> {
        match self {
            Formatter::Number(f) => f.parse(text),
            Formatter::Boolean(f) => f.parse(text),
            Formatter::Text => Ok(Value::text(text)),
            Formatter::Calendar(_) => Err(FormatError::UnparseableText {
                text: text.to_string(),
                value_type: ValueType::Date,
            }),
        }
    }
}

// =============================================================================
// Numbers
// =============================================================================

/// A compiled decimal pattern.
#[derive(Debug, Clone)]
pub struct NumberFormat {
    prefix: String,
    suffix: String,
    grouping: bool,
    min_fraction_digits: usize,
    max_fraction_digits: usize,
    percent: bool,
    decimal_separator: char,
    grouping_separator: char,
}

static NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^#0]*)([#,0]+(?:\.[#0]+)?)([^#0]*)$").unwrap());

impl NumberFormat {
    pub fn compile(pattern: &str, locale: &Locale) -> Result<Self, FormatError> {
        let captures = NUMBER_PATTERN
            .captures(pattern)
            .ok_or_else(|| illegal(pattern, ValueType::Number))?;
        let prefix = captures.get(1).map_or("", |m| m.as_str()).to_string();
        let body = captures.get(2).map_or("", |m| m.as_str()).to_string();
        let suffix = captures.get(3).map_or("", |m| m.as_str()).to_string();

        let (integer_part, fraction_part) = match body.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (body.as_str(), None),
        };
        if integer_part.is_empty() {
            return Err(illegal(pattern, ValueType::Number));
        }
        let min_fraction_digits = fraction_part
            .map(|f| f.chars().take_while(|&c| c == '0').count())
            .unwrap_or(0);
        let max_fraction_digits = fraction_part.map(|f| f.len()).unwrap_or(0);

        Ok(Self {
            grouping: integer_part.contains(','),
            min_fraction_digits,
            max_fraction_digits,
            percent: prefix.contains('%') || suffix.contains('%'),
            prefix,
            suffix,
            decimal_separator: locale.decimal_separator(),
            grouping_separator: locale.grouping_separator(),
        })
    }

    fn format(&self, value: &Value) -> String {
        let Value::Number(Some(n)) = value else {
            return value.to_string();
        };
        let mut n = *n;
        if self.percent {
            n *= 100.0;
        }
        let rounded = format!("{:.*}", self.max_fraction_digits, n.abs());
        let (int_text, frac_text) = match rounded.split_once('.') {
            Some((i, f)) => (i.to_string(), f.to_string()),
            None => (rounded, String::new()),
        };
        let frac_text = trim_fraction(&frac_text, self.min_fraction_digits);
        let int_text = if self.grouping {
            group_digits(&int_text, self.grouping_separator)
        } else {
            int_text
        };

        let rendered_zero =
            int_text.chars().all(|c| c == '0') && frac_text.chars().all(|c| c == '0');
        let mut out = String::new();
        out.push_str(&self.prefix);
        if n.is_sign_negative() && !rendered_zero {
            out.push('-');
        }
        out.push_str(&int_text);
        if !frac_text.is_empty() {
            out.push(self.decimal_separator);
            out.push_str(&frac_text);
        }
        out.push_str(&self.suffix);
        out
    }

    fn parse(&self, text: &str) -> Result<Value, FormatError> {
        let unparseable = || FormatError::UnparseableText {
            text: text.to_string(),
            value_type: ValueType::Number,
        };
        let stripped = text
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(text)
            .strip_suffix(self.suffix.as_str())
            .unwrap_or(text);
        let normalized: String = stripped
            .chars()
            .filter(|&c| c != self.grouping_separator)
            .map(|c| if c == self.decimal_separator { '.' } else { c })
            .collect();
        let mut parsed: f64 = normalized.trim().parse().map_err(|_| unparseable())?;
        if self.percent {
            parsed /= 100.0;
        }
        Ok(Value::number(parsed))
    }
}

/// Drop trailing zeros down to the minimum fraction width.
fn trim_fraction(fraction: &str, min_digits: usize) -> String {
    let mut out: String = fraction.to_string();
    while out.len() > min_digits && out.ends_with('0') {
        out.pop();
    }
    out
}

/// Insert a grouping separator every three digits, right to left.
fn group_digits(digits: &str, separator: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let chars: Vec<char> = digits.chars().collect();
    for (index, c) in chars.iter().enumerate() {
        if index > 0 && (chars.len() - index) % 3 == 0 {
            out.push(separator);
        }
        out.push(*c);
    }
    out
}

// =============================================================================
// Booleans
// =============================================================================

/// A `true-label:false-label` pattern.
#[derive(Debug, Clone)]
pub struct BooleanFormat {
    true_label: String,
    false_label: String,
}

impl BooleanFormat {
    pub fn compile(pattern: &str) -> Result<Self, FormatError> {
        match pattern.split_once(':') {
            Some((true_label, false_label))
                if !true_label.is_empty()
                    && !false_label.is_empty()
                    && !false_label.contains(':') =>
            {
                Ok(Self {
                    true_label: true_label.to_string(),
                    false_label: false_label.to_string(),
                })
            }
            _ => Err(illegal(pattern, ValueType::Boolean)),
        }
    }

    fn format(&self, value: &Value) -> String {
        match value {
            Value::Boolean(Some(true)) => self.true_label.clone(),
            Value::Boolean(Some(false)) => self.false_label.clone(),
            other => other.to_string(),
        }
    }

    fn parse(&self, text: &str) -> Result<Value, FormatError> {
        if text.eq_ignore_ascii_case(&self.true_label) {
            Ok(Value::boolean(true))
        } else if text.eq_ignore_ascii_case(&self.false_label) {
            Ok(Value::boolean(false))
        } else {
            Err(FormatError::UnparseableText {
                text: text.to_string(),
                value_type: ValueType::Boolean,
            })
        }
    }
}

// =============================================================================
// Calendar types
// =============================================================================

/// One element of a compiled calendar pattern.
#[derive(Debug, Clone, PartialEq)]
enum CalendarToken {
    Year4,
    Year2,
    MonthPadded,
    Month,
    MonthShortName,
    DayPadded,
    Day,
    HourPadded,
    Hour,
    MinutePadded,
    Minute,
    SecondPadded,
    Second,
    Millis,
    Literal(String),
}

static MONTH_SHORT_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A compiled `SimpleDateFormat`-subset pattern.
#[derive(Debug, Clone)]
pub struct CalendarFormat {
    tokens: Vec<CalendarToken>,
}

impl CalendarFormat {
    pub fn compile(pattern: &str, value_type: ValueType) -> Result<Self, FormatError> {
        let mut tokens = Vec::new();
        let chars: Vec<char> = pattern.chars().collect();
        let mut index = 0;
        while index < chars.len() {
            let c = chars[index];
            if c == '\'' {
                // Quoted literal; '' is an escaped quote.
                let mut literal = String::new();
                index += 1;
                loop {
                    match chars.get(index) {
                        Some('\'') if chars.get(index + 1) == Some(&'\'') => {
                            literal.push('\'');
                            index += 2;
                        }
                        Some('\'') => {
                            index += 1;
                            break;
                        }
                        Some(&other) => {
                            literal.push(other);
                            index += 1;
                        }
                        None => return Err(illegal(pattern, value_type)),
                    }
                }
                tokens.push(CalendarToken::Literal(literal));
                continue;
            }
            if c.is_ascii_alphabetic() {
                let start = index;
                while index < chars.len() && chars[index] == c {
                    index += 1;
                }
                let run = index - start;
                tokens.push(match (c, run) {
                    ('y', 2) => CalendarToken::Year2,
                    ('y', _) => CalendarToken::Year4,
                    ('M', 1) => CalendarToken::Month,
                    ('M', 2) => CalendarToken::MonthPadded,
                    ('M', _) => CalendarToken::MonthShortName,
                    ('d', 1) => CalendarToken::Day,
                    ('d', _) => CalendarToken::DayPadded,
                    ('H', 1) => CalendarToken::Hour,
                    ('H', _) => CalendarToken::HourPadded,
                    ('m', 1) => CalendarToken::Minute,
                    ('m', _) => CalendarToken::MinutePadded,
                    ('s', 1) => CalendarToken::Second,
                    ('s', _) => CalendarToken::SecondPadded,
                    ('S', _) => CalendarToken::Millis,
                    _ => return Err(illegal(pattern, value_type)),
                });
                continue;
            }
            tokens.push(CalendarToken::Literal(c.to_string()));
            index += 1;
        }
        Ok(Self { tokens })
    }

    fn format(&self, value: &Value) -> String {
        let Some(fields) = CalendarFields::of(value) else {
            return value.to_string();
        };
        let mut out = String::new();
        for token in &self.tokens {
            match token {
                CalendarToken::Year4 => out.push_str(&format!("{:04}", fields.year)),
                CalendarToken::Year2 => {
                    out.push_str(&format!("{:02}", (fields.year % 100).abs()))
                }
                CalendarToken::MonthPadded => out.push_str(&format!("{:02}", fields.month + 1)),
                CalendarToken::Month => out.push_str(&(fields.month + 1).to_string()),
                CalendarToken::MonthShortName => {
                    out.push_str(MONTH_SHORT_NAMES[fields.month as usize % 12])
                }
                CalendarToken::DayPadded => out.push_str(&format!("{:02}", fields.day)),
                CalendarToken::Day => out.push_str(&fields.day.to_string()),
                CalendarToken::HourPadded => out.push_str(&format!("{:02}", fields.hour)),
                CalendarToken::Hour => out.push_str(&fields.hour.to_string()),
                CalendarToken::MinutePadded => out.push_str(&format!("{:02}", fields.minute)),
                CalendarToken::Minute => out.push_str(&fields.minute.to_string()),
                CalendarToken::SecondPadded => out.push_str(&format!("{:02}", fields.second)),
                CalendarToken::Second => out.push_str(&fields.second.to_string()),
                CalendarToken::Millis => out.push_str(&format!("{:03}", fields.millisecond)),
                CalendarToken::Literal(text) => out.push_str(text),
            }
        }
        out
    }
}

/// Calendar fields of any temporal value. A time of day borrows the
/// synthetic 1899-12-30 date; a date has a zero clock.
struct CalendarFields {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    millisecond: u32,
}

impl CalendarFields {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Date(Some(d)) => Some(Self {
                year: d.year(),
                month: d.month(),
                day: d.day(),
                hour: 0,
                minute: 0,
                second: 0,
                millisecond: 0,
            }),
            Value::DateTime(Some(dt)) => Some(Self {
                year: dt.year(),
                month: dt.month(),
                day: dt.day(),
                hour: dt.hour(),
                minute: dt.minute(),
                second: dt.second(),
                millisecond: dt.millisecond(),
            }),
            Value::TimeOfDay(Some(t)) => Some(Self {
                year: 1899,
                month: 11,
                day: 30,
                hour: t.hour(),
                minute: t.minute(),
                second: t.second(),
                millisecond: t.millisecond(),
            }),
            _ => None,
        }
    }
}

fn illegal(pattern: &str, value_type: ValueType) -> FormatError {
    FormatError::IllegalPattern {
        pattern: pattern.to_string(),
        value_type,
    }
}
