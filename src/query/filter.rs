//! Row filters.
//!
//! Filters form a small boolean tree over comparisons between columns and
//! values (or columns and columns), plus null tests. Matching happens
//! per row against the current table.

use std::collections::BTreeSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::engine::lookup::DataTableColumnLookup;
use crate::error::{QueryError, QueryResult};
use crate::query::column::{AbstractColumn, AggregationColumn, ScalarFunctionColumn};
use crate::table::{DataTable, TableRow};
use crate::value::Value;

/// Boolean connective for compound filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn code(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

/// Comparison operators between two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Contains,
    StartsWith,
    EndsWith,
    Matches,
    Like,
}

impl ComparisonOperator {
    /// The query-language spelling.
    pub fn code(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "=",
            ComparisonOperator::Ne => "!=",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Le => "<=",
            ComparisonOperator::Ge => ">=",
            ComparisonOperator::Contains => "CONTAINS",
            ComparisonOperator::StartsWith => "STARTS WITH",
            ComparisonOperator::EndsWith => "ENDS WITH",
            ComparisonOperator::Matches => "MATCHES",
            ComparisonOperator::Like => "LIKE",
        }
    }

    /// Ordered comparisons require both sides to have one type; the string
    /// operators compare display strings of any types.
    pub fn requires_matching_types(&self) -> bool {
        matches!(
            self,
            ComparisonOperator::Eq
                | ComparisonOperator::Ne
                | ComparisonOperator::Lt
                | ComparisonOperator::Gt
                | ComparisonOperator::Le
                | ComparisonOperator::Ge
        )
    }

    /// Evaluate `first op second`. Mismatched types under an ordered
    /// operator compare false without consulting the value order.
    pub fn is_match(&self, first: &Value, second: &Value) -> bool {
        if self.requires_matching_types() && first.value_type() != second.value_type() {
            return false;
        }
        match self {
            ComparisonOperator::Eq => first.compare(second).is_eq(),
            ComparisonOperator::Ne => first.compare(second).is_ne(),
            ComparisonOperator::Lt => first.compare(second).is_lt(),
            ComparisonOperator::Gt => first.compare(second).is_gt(),
            ComparisonOperator::Le => first.compare(second).is_le(),
            ComparisonOperator::Ge => first.compare(second).is_ge(),
            ComparisonOperator::Contains => first.to_string().contains(&second.to_string()),
            ComparisonOperator::StartsWith => first.to_string().starts_with(&second.to_string()),
            ComparisonOperator::EndsWith => first.to_string().ends_with(&second.to_string()),
            ComparisonOperator::Matches => full_regex_match(&first.to_string(), &second.to_string()),
            ComparisonOperator::Like => like_match(&first.to_string(), &second.to_string()),
        }
    }
}

/// Full-string regex match. A malformed pattern matches nothing.
fn full_regex_match(text: &str, pattern: &str) -> bool {
    match Regex::new(&format!("^(?:{pattern})$")) {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    }
}

/// SQL LIKE: `%` matches any run, `_` any single character, everything else
/// is literal. There is no escape mechanism.
fn like_match(text: &str, pattern: &str) -> bool {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    for c in pattern.chars() {
        match c {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).map(|re| re.is_match(text)).unwrap_or(false)
}

/// Matches rows whose value at a column is null.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnIsNullFilter {
    column: AbstractColumn,
}

/// Compares a column against a literal value. With `reversed`, the literal
/// is the left operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnValueFilter {
    column: AbstractColumn,
    value: Value,
    operator: ComparisonOperator,
    reversed: bool,
}

/// Compares two columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnColumnFilter {
    first: AbstractColumn,
    second: AbstractColumn,
    operator: ComparisonOperator,
}

/// A row filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryFilter {
    IsNull(ColumnIsNullFilter),
    ColumnValue(ColumnValueFilter),
    ColumnColumn(ColumnColumnFilter),
    Negation(Box<QueryFilter>),
    Compound {
        operator: LogicalOperator,
        subfilters: Vec<QueryFilter>,
    },
}

impl QueryFilter {
    pub fn is_null(column: AbstractColumn) -> Self {
        QueryFilter::IsNull(ColumnIsNullFilter { column })
    }

    pub fn column_value(
        column: AbstractColumn,
        value: Value,
        operator: ComparisonOperator,
    ) -> Self {
        QueryFilter::ColumnValue(ColumnValueFilter {
            column,
            value,
            operator,
            reversed: false,
        })
    }

    /// `value op column` instead of `column op value`.
    pub fn value_column(
        value: Value,
        column: AbstractColumn,
        operator: ComparisonOperator,
    ) -> Self {
        QueryFilter::ColumnValue(ColumnValueFilter {
            column,
            value,
            operator,
            reversed: true,
        })
    }

    pub fn column_column(
        first: AbstractColumn,
        second: AbstractColumn,
        operator: ComparisonOperator,
    ) -> Self {
        QueryFilter::ColumnColumn(ColumnColumnFilter {
            first,
            second,
            operator,
        })
    }

    pub fn negation(filter: QueryFilter) -> Self {
        QueryFilter::Negation(Box::new(filter))
    }

    pub fn and(subfilters: Vec<QueryFilter>) -> Self {
        QueryFilter::Compound {
            operator: LogicalOperator::And,
            subfilters,
        }
    }

    pub fn or(subfilters: Vec<QueryFilter>) -> Self {
        QueryFilter::Compound {
            operator: LogicalOperator::Or,
            subfilters,
        }
    }

    /// Does the filter accept this row? A compound filter with no
    /// subfilters is a programming error.
    pub fn is_match(&self, table: &DataTable, row: &TableRow) -> QueryResult<bool> {
        let lookup = DataTableColumnLookup::new(table);
        match self {
            QueryFilter::IsNull(f) => Ok(f.column.value(&lookup, row)?.is_null()),
            QueryFilter::ColumnValue(f) => {
                let column_value = f.column.value(&lookup, row)?;
                Ok(if f.reversed {
                    f.operator.is_match(&f.value, &column_value)
                } else {
                    f.operator.is_match(&column_value, &f.value)
                })
            }
            QueryFilter::ColumnColumn(f) => {
                let first = f.first.value(&lookup, row)?;
                let second = f.second.value(&lookup, row)?;
                Ok(f.operator.is_match(&first, &second))
            }
            QueryFilter::Negation(f) => Ok(!f.is_match(table, row)?),
            QueryFilter::Compound {
                operator,
                subfilters,
            } => {
                if subfilters.is_empty() {
                    return Err(QueryError::Internal(
                        "compound filter with no subfilters".into(),
                    ));
                }
                match operator {
                    LogicalOperator::And => {
                        for sub in subfilters {
                            if !sub.is_match(table, row)? {
                                return Ok(false);
                            }
                        }
                        Ok(true)
                    }
                    LogicalOperator::Or => {
                        for sub in subfilters {
                            if sub.is_match(table, row)? {
                                return Ok(true);
                            }
                        }
                        Ok(false)
                    }
                }
            }
        }
    }

    /// The top-level abstract columns referenced by the filter tree.
    pub fn all_columns(&self) -> Vec<AbstractColumn> {
        match self {
            QueryFilter::IsNull(f) => vec![f.column.clone()],
            QueryFilter::ColumnValue(f) => vec![f.column.clone()],
            QueryFilter::ColumnColumn(f) => vec![f.first.clone(), f.second.clone()],
            QueryFilter::Negation(f) => f.all_columns(),
            QueryFilter::Compound { subfilters, .. } => {
                subfilters.iter().flat_map(|f| f.all_columns()).collect()
            }
        }
    }

    /// Ids of every simple column referenced anywhere in the tree.
    pub fn all_column_ids(&self) -> BTreeSet<String> {
        self.all_columns()
            .iter()
            .flat_map(|c| c.all_simple_columns())
            .map(|c| c.id().to_string())
            .collect()
    }

    /// Every scalar-function column referenced anywhere in the tree.
    pub fn all_scalar_function_columns(&self) -> Vec<ScalarFunctionColumn> {
        self.all_columns()
            .iter()
            .flat_map(|c| c.all_scalar_function_columns())
            .collect()
    }

    /// Every aggregation column referenced anywhere in the tree.
    pub fn all_aggregation_columns(&self) -> Vec<AggregationColumn> {
        self.all_columns()
            .iter()
            .flat_map(|c| c.all_aggregation_columns())
            .collect()
    }

    /// Render the query-language form of the filter.
    pub fn to_query_string(&self) -> QueryResult<String> {
        match self {
            QueryFilter::IsNull(f) => Ok(format!("{} IS NULL", f.column.to_query_string()?)),
            QueryFilter::ColumnValue(f) => {
                let column = f.column.to_query_string()?;
                let value = f.value.to_query_string()?;
                Ok(if f.reversed {
                    format!("{value} {} {column}", f.operator.code())
                } else {
                    format!("{column} {} {value}", f.operator.code())
                })
            }
            QueryFilter::ColumnColumn(f) => Ok(format!(
                "{} {} {}",
                f.first.to_query_string()?,
                f.operator.code(),
                f.second.to_query_string()?
            )),
            QueryFilter::Negation(f) => Ok(format!("NOT ({})", f.to_query_string()?)),
            QueryFilter::Compound {
                operator,
                subfilters,
            } => {
                let parts = subfilters
                    .iter()
                    .map(|f| f.to_query_string())
                    .collect::<QueryResult<Vec<_>>>()?;
                Ok(format!(
                    "({})",
                    parts.join(&format!(" {} ", operator.code()))
                ))
            }
        }
    }
}
