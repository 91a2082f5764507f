//! # tablequery
//!
//! An in-memory analytical query engine over typed, columnar-row data
//! tables.
//!
//! ## Architecture
//!
//! A client supplies a [`table::DataTable`] and a [`query::Query`] (built by
//! a grammar-driven parser, which lives outside this crate). The engine
//! validates the query against the table schema, executes it, and returns a
//! new table:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Query (AST) + DataTable                  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [validation]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Cross-clause invariants vs. table schema          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [engine]
//! ┌─────────────────────────────────────────────────────────┐
//! │  filter → group+pivot → sort → skip → paginate →         │
//! │  project → relabel → format                              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │              DataTable (+ warnings)                      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Backends that can evaluate part of a query themselves declare a
//! [`splitter::Capability`]; [`splitter::split`] partitions a query into a
//! data-source part and a completion part whose composition is equivalent to
//! the original.

pub mod engine;
pub mod error;
pub mod format;
pub mod locale;
pub mod query;
pub mod splitter;
pub mod table;
pub mod validation;
pub mod value;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::engine::execute;
    pub use crate::error::{
        InvalidQueryCode, QueryError, QueryResult, ReasonCode, TableError, Warning,
    };
    pub use crate::locale::{Collator, Locale};
    pub use crate::query::{
        AbstractColumn, AggregationColumn, AggregationType, ColumnSort, ComparisonOperator,
        LogicalOperator, Query, QueryFilter, QueryOptions, ScalarFunction, SimpleColumn,
        SortOrder,
    };
    pub use crate::splitter::{split, Capability, SplitQuery};
    pub use crate::table::{Cell, ColumnDescription, DataTable, TableRow};
    pub use crate::validation::validate;
    pub use crate::value::{Value, ValueComparator, ValueType};
}

// Also export the main entry points at the crate root for convenience
pub use engine::execute;
pub use error::{QueryError, QueryResult};
pub use query::Query;
pub use splitter::{split, Capability};
pub use table::DataTable;
pub use validation::validate;
pub use value::{Value, ValueType};
