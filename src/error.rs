//! Error taxonomy for the query engine.
//!
//! Two failure families exist: semantic problems with a query (reported to
//! the caller with a stable code and a readable message) and programming
//! errors inside the engine (reported as [`QueryError::Internal`]). Non-fatal
//! conditions become [`Warning`]s attached to the output table instead.

use serde::{Deserialize, Serialize};

use crate::value::ValueError;

/// Errors that can occur while validating, splitting, or executing a query.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("invalid query [{code}]: {message}")]
    InvalidQuery {
        code: InvalidQueryCode,
        message: String,
    },

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type QueryResult<T> = Result<T, QueryError>;

impl QueryError {
    /// Build an invalid-query error from a code and a formatted message.
    pub fn invalid_query(code: InvalidQueryCode, message: impl Into<String>) -> Self {
        QueryError::InvalidQuery {
            code,
            message: message.into(),
        }
    }

    /// The reason code a transport layer would attach to a response.
    pub fn reason(&self) -> ReasonCode {
        match self {
            QueryError::InvalidQuery { .. } => ReasonCode::InvalidQuery,
            QueryError::Table(_) => ReasonCode::InvalidQuery,
            QueryError::Value(_) => ReasonCode::InvalidQuery,
            QueryError::NotSupported(_) => ReasonCode::NotSupported,
            QueryError::Internal(_) => ReasonCode::InternalError,
        }
    }
}

/// Errors raised by [`crate::table::DataTable`] mutation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error("duplicate column id '{0}'")]
    DuplicateColumnId(String),

    #[error("column '{0}' does not exist")]
    ColumnNotFound(String),

    #[error("cell of type {value_type} does not match column '{column_id}' of type {column_type}")]
    TypeMismatch {
        column_id: String,
        column_type: crate::value::ValueType,
        value_type: crate::value::ValueType,
    },

    #[error("row has {got} cells but the table has {expected} columns")]
    RowTooLong { got: usize, expected: usize },
}

/// Stable machine-readable codes for invalid-query errors.
///
/// Every code maps one-to-one onto a validation rule; the human-readable
/// message carries the parameters (column ids, function names).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidQueryCode {
    /// A referenced column id does not exist in the table.
    NoColumn,
    /// A column id contains a backtick.
    InvalidColumnId,
    /// SUM / AVG applied to a non-numeric column.
    AvgSumOnlyNumeric,
    /// Scalar function applied to the wrong number or types of arguments.
    InvalidScalarFunctionArgs,
    /// The same column appears twice in SELECT.
    DuplicateSelectColumn,
    /// The same column appears twice in ORDER BY.
    DuplicateSortColumn,
    /// The same column appears twice in GROUP BY.
    DuplicateGroupColumn,
    /// The same column appears twice in PIVOT.
    DuplicatePivotColumn,
    /// An aggregation column appears in GROUP BY.
    AggInGroupBy,
    /// An aggregation column appears in PIVOT.
    AggInPivot,
    /// An aggregation column appears in WHERE.
    AggInWhere,
    /// A selected non-aggregated column is not grouped.
    UngroupedSelectColumn,
    /// A column is selected both plainly and aggregated.
    SelectWithAndWithoutAgg,
    /// The target of a selected aggregation appears in GROUP BY.
    AggTargetInGroupBy,
    /// GROUP BY without any aggregation in SELECT.
    CannotGroupWithoutAgg,
    /// PIVOT without any aggregation in SELECT.
    CannotPivotWithoutAgg,
    /// A column appears in both GROUP BY and PIVOT.
    ColInGroupAndPivot,
    /// An ORDER BY column is missing from an aggregated SELECT.
    SortColNotInSelect,
    /// ORDER BY on an aggregation while PIVOT is in use.
    NoAggSortWithPivot,
    /// An aggregation in ORDER BY is missing from SELECT.
    AggSortNotInSelect,
    /// A LABEL column is missing from SELECT.
    LabelColNotInSelect,
    /// A FORMAT column is missing from SELECT.
    FormatColNotInSelect,
}

impl InvalidQueryCode {
    /// The stable wire form of the code.
    pub fn code(&self) -> &'static str {
        match self {
            InvalidQueryCode::NoColumn => "NO_COLUMN",
            InvalidQueryCode::InvalidColumnId => "INVALID_COLUMN_ID",
            InvalidQueryCode::AvgSumOnlyNumeric => "AVG_SUM_ONLY_NUMERIC",
            InvalidQueryCode::InvalidScalarFunctionArgs => "INVALID_SCALAR_FUNCTION_ARGS",
            InvalidQueryCode::DuplicateSelectColumn => "DUPLICATE_SELECT_COLUMN",
            InvalidQueryCode::DuplicateSortColumn => "DUPLICATE_SORT_COLUMN",
            InvalidQueryCode::DuplicateGroupColumn => "DUPLICATE_GROUP_COLUMN",
            InvalidQueryCode::DuplicatePivotColumn => "DUPLICATE_PIVOT_COLUMN",
            InvalidQueryCode::AggInGroupBy => "AGG_IN_GROUP_BY",
            InvalidQueryCode::AggInPivot => "AGG_IN_PIVOT",
            InvalidQueryCode::AggInWhere => "AGG_IN_WHERE",
            InvalidQueryCode::UngroupedSelectColumn => "UNGROUPED_SELECT_COLUMN",
            InvalidQueryCode::SelectWithAndWithoutAgg => "SELECT_WITH_AND_WITHOUT_AGG",
            InvalidQueryCode::AggTargetInGroupBy => "AGG_TARGET_IN_GROUP_BY",
            InvalidQueryCode::CannotGroupWithoutAgg => "CANNOT_GROUP_WITHOUT_AGG",
            InvalidQueryCode::CannotPivotWithoutAgg => "CANNOT_PIVOT_WITHOUT_AGG",
            InvalidQueryCode::ColInGroupAndPivot => "COL_IN_GROUP_AND_PIVOT",
            InvalidQueryCode::SortColNotInSelect => "SORT_COL_NOT_IN_SELECT",
            InvalidQueryCode::NoAggSortWithPivot => "NO_AGG_SORT_WITH_PIVOT",
            InvalidQueryCode::AggSortNotInSelect => "AGG_SORT_NOT_IN_SELECT",
            InvalidQueryCode::LabelColNotInSelect => "LABEL_COL_NOT_IN_SELECT",
            InvalidQueryCode::FormatColNotInSelect => "FORMAT_COL_NOT_IN_SELECT",
        }
    }
}

impl std::fmt::Display for InvalidQueryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Reason codes for warnings and responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReasonCode {
    DataTruncated,
    IllegalFormattingPatterns,
    InvalidQuery,
    NotSupported,
    InternalError,
    Other,
}

impl ReasonCode {
    pub fn code(&self) -> &'static str {
        match self {
            ReasonCode::DataTruncated => "DATA_TRUNCATED",
            ReasonCode::IllegalFormattingPatterns => "ILLEGAL_FORMATTING_PATTERNS",
            ReasonCode::InvalidQuery => "INVALID_QUERY",
            ReasonCode::NotSupported => "NOT_SUPPORTED",
            ReasonCode::InternalError => "INTERNAL_ERROR",
            ReasonCode::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A non-fatal diagnostic attached to an output table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub reason: ReasonCode,
    pub message: String,
}

impl Warning {
    pub fn new(reason: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.reason, self.message)
    }
}
