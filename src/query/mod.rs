//! The query AST.
//!
//! A [`Query`] holds the optional clauses of the query language: selection,
//! filter, grouping, pivoting, ordering, row skipping, pagination, labels,
//! formatting patterns, and options. Queries are built by a parser or by the
//! splitter, validated once against a table schema, then executed.

pub mod column;
pub mod filter;
pub mod scalar;
pub mod writer;

pub use column::{
    AbstractColumn, AggregationColumn, AggregationType, ScalarFunctionColumn, SimpleColumn,
};
pub use filter::{ComparisonOperator, LogicalOperator, QueryFilter};
pub use scalar::ScalarFunction;

use serde::{Deserialize, Serialize};

use crate::error::QueryResult;
use writer::{Token, TokenStream};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnSort {
    pub column: AbstractColumn,
    pub order: SortOrder,
}

impl ColumnSort {
    pub fn asc(column: AbstractColumn) -> Self {
        Self {
            column,
            order: SortOrder::Asc,
        }
    }

    pub fn desc(column: AbstractColumn) -> Self {
        Self {
            column,
            order: SortOrder::Desc,
        }
    }
}

/// Rendering options carried on a query for the benefit of renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct QueryOptions {
    pub no_values: bool,
    pub no_format: bool,
}

impl QueryOptions {
    pub fn is_default(&self) -> bool {
        !self.no_values && !self.no_format
    }
}

/// A parsed query: all clauses optional, structural equality and hashing.
///
/// `row_skipping` and `row_offset` use 0 for "absent"; `row_limit` uses
/// `None` for unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Query {
    selection: Option<Vec<AbstractColumn>>,
    filter: Option<QueryFilter>,
    group: Option<Vec<AbstractColumn>>,
    pivot: Option<Vec<AbstractColumn>>,
    sort: Option<Vec<ColumnSort>>,
    row_skipping: u64,
    row_limit: Option<u64>,
    row_offset: u64,
    labels: Vec<(AbstractColumn, String)>,
    formats: Vec<(AbstractColumn, String)>,
    options: QueryOptions,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    // === Builders ===

    pub fn with_selection(mut self, columns: Vec<AbstractColumn>) -> Self {
        self.set_selection(columns);
        self
    }

    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.set_filter(filter);
        self
    }

    pub fn with_group(mut self, columns: Vec<AbstractColumn>) -> Self {
        self.set_group(columns);
        self
    }

    pub fn with_pivot(mut self, columns: Vec<AbstractColumn>) -> Self {
        self.set_pivot(columns);
        self
    }

    pub fn with_sort(mut self, sort: Vec<ColumnSort>) -> Self {
        self.set_sort(sort);
        self
    }

    pub fn with_row_skipping(mut self, skipping: u64) -> Self {
        self.row_skipping = skipping;
        self
    }

    pub fn with_row_limit(mut self, limit: u64) -> Self {
        self.row_limit = Some(limit);
        self
    }

    pub fn with_row_offset(mut self, offset: u64) -> Self {
        self.row_offset = offset;
        self
    }

    pub fn with_label(mut self, column: AbstractColumn, label: impl Into<String>) -> Self {
        self.add_label(column, label);
        self
    }

    pub fn with_format(mut self, column: AbstractColumn, pattern: impl Into<String>) -> Self {
        self.add_format(column, pattern);
        self
    }

    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    // === Setters ===

    pub fn set_selection(&mut self, columns: Vec<AbstractColumn>) {
        self.selection = Some(columns);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn set_filter(&mut self, filter: QueryFilter) {
        self.filter = Some(filter);
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
    }

    pub fn set_group(&mut self, columns: Vec<AbstractColumn>) {
        self.group = Some(columns);
    }

    pub fn set_pivot(&mut self, columns: Vec<AbstractColumn>) {
        self.pivot = Some(columns);
    }

    pub fn set_sort(&mut self, sort: Vec<ColumnSort>) {
        self.sort = Some(sort);
    }

    pub fn set_row_skipping(&mut self, skipping: u64) {
        self.row_skipping = skipping;
    }

    pub fn set_row_limit(&mut self, limit: Option<u64>) {
        self.row_limit = limit;
    }

    pub fn set_row_offset(&mut self, offset: u64) {
        self.row_offset = offset;
    }

    /// Set or replace the label for a column.
    pub fn add_label(&mut self, column: AbstractColumn, label: impl Into<String>) {
        let label = label.into();
        if let Some(entry) = self.labels.iter_mut().find(|(c, _)| *c == column) {
            entry.1 = label;
        } else {
            self.labels.push((column, label));
        }
    }

    pub fn set_labels(&mut self, labels: Vec<(AbstractColumn, String)>) {
        self.labels = labels;
    }

    /// Set or replace the formatting pattern for a column.
    pub fn add_format(&mut self, column: AbstractColumn, pattern: impl Into<String>) {
        let pattern = pattern.into();
        if let Some(entry) = self.formats.iter_mut().find(|(c, _)| *c == column) {
            entry.1 = pattern;
        } else {
            self.formats.push((column, pattern));
        }
    }

    pub fn set_formats(&mut self, formats: Vec<(AbstractColumn, String)>) {
        self.formats = formats;
    }

    pub fn set_options(&mut self, options: QueryOptions) {
        self.options = options;
    }

    // === Accessors ===

    pub fn selection(&self) -> Option<&[AbstractColumn]> {
        self.selection.as_deref()
    }

    pub fn filter(&self) -> Option<&QueryFilter> {
        self.filter.as_ref()
    }

    pub fn group(&self) -> Option<&[AbstractColumn]> {
        self.group.as_deref()
    }

    pub fn pivot(&self) -> Option<&[AbstractColumn]> {
        self.pivot.as_deref()
    }

    pub fn sort(&self) -> Option<&[ColumnSort]> {
        self.sort.as_deref()
    }

    pub fn row_skipping(&self) -> u64 {
        self.row_skipping
    }

    pub fn row_limit(&self) -> Option<u64> {
        self.row_limit
    }

    pub fn row_offset(&self) -> u64 {
        self.row_offset
    }

    pub fn labels(&self) -> &[(AbstractColumn, String)] {
        &self.labels
    }

    pub fn formats(&self) -> &[(AbstractColumn, String)] {
        &self.formats
    }

    pub fn options(&self) -> QueryOptions {
        self.options
    }

    pub fn label_for(&self, column: &AbstractColumn) -> Option<&str> {
        self.labels
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, l)| l.as_str())
    }

    pub fn format_for(&self, column: &AbstractColumn) -> Option<&str> {
        self.formats
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, p)| p.as_str())
    }

    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    pub fn has_group(&self) -> bool {
        self.group.as_ref().is_some_and(|g| !g.is_empty())
    }

    pub fn has_pivot(&self) -> bool {
        self.pivot.as_ref().is_some_and(|p| !p.is_empty())
    }

    pub fn has_sort(&self) -> bool {
        self.sort.as_ref().is_some_and(|s| !s.is_empty())
    }

    pub fn has_row_skipping(&self) -> bool {
        self.row_skipping > 0
    }

    pub fn has_row_limit(&self) -> bool {
        self.row_limit.is_some()
    }

    pub fn has_row_offset(&self) -> bool {
        self.row_offset > 0
    }

    pub fn has_labels(&self) -> bool {
        !self.labels.is_empty()
    }

    pub fn has_formats(&self) -> bool {
        !self.formats.is_empty()
    }

    pub fn has_options(&self) -> bool {
        !self.options.is_default()
    }

    /// True when no clause is set at all; executing an empty query is the
    /// identity transformation.
    pub fn is_empty(&self) -> bool {
        !self.has_selection()
            && !self.has_filter()
            && !self.has_group()
            && !self.has_pivot()
            && !self.has_sort()
            && !self.has_row_skipping()
            && !self.has_row_limit()
            && !self.has_row_offset()
            && !self.has_labels()
            && !self.has_formats()
            && !self.has_options()
    }

    // === Aggregate accessors across clauses ===

    /// The top-level abstract columns referenced by every clause, in clause
    /// order.
    pub fn all_columns(&self) -> Vec<AbstractColumn> {
        let mut all = Vec::new();
        if let Some(selection) = &self.selection {
            all.extend(selection.iter().cloned());
        }
        if let Some(filter) = &self.filter {
            all.extend(filter.all_columns());
        }
        if let Some(group) = &self.group {
            all.extend(group.iter().cloned());
        }
        if let Some(pivot) = &self.pivot {
            all.extend(pivot.iter().cloned());
        }
        if let Some(sort) = &self.sort {
            all.extend(sort.iter().map(|s| s.column.clone()));
        }
        all.extend(self.labels.iter().map(|(c, _)| c.clone()));
        all.extend(self.formats.iter().map(|(c, _)| c.clone()));
        all
    }

    /// Every aggregation column referenced anywhere, recursively, in clause
    /// order, without duplicates.
    pub fn all_aggregation_columns(&self) -> Vec<AggregationColumn> {
        let mut seen = Vec::new();
        for column in self.all_columns() {
            for agg in column.all_aggregation_columns() {
                if !seen.contains(&agg) {
                    seen.push(agg);
                }
            }
        }
        seen
    }

    /// Every scalar-function column referenced anywhere, recursively.
    pub fn all_scalar_function_columns(&self) -> Vec<ScalarFunctionColumn> {
        self.all_columns()
            .iter()
            .flat_map(|c| c.all_scalar_function_columns())
            .collect()
    }

    /// Ids of every simple column referenced anywhere, in first-mention
    /// order, without duplicates.
    pub fn all_simple_column_ids(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for column in self.all_columns() {
            for simple in column.all_simple_columns() {
                if !seen.iter().any(|s| s == simple.id()) {
                    seen.push(simple.id().to_string());
                }
            }
        }
        seen
    }

    /// Aggregation columns referenced from SELECT, recursively, in selection
    /// order, without duplicates.
    pub fn selection_aggregation_columns(&self) -> Vec<AggregationColumn> {
        let mut seen = Vec::new();
        for column in self.selection.iter().flatten() {
            for agg in column.all_aggregation_columns() {
                if !seen.contains(&agg) {
                    seen.push(agg);
                }
            }
        }
        seen
    }

    /// Selected scalar-function columns that contain an aggregation; these
    /// are materialized per pivot vector by the grouping stage.
    pub fn selection_scalar_with_aggregation_columns(&self) -> Vec<ScalarFunctionColumn> {
        self.selection
            .iter()
            .flatten()
            .filter_map(|c| match c {
                AbstractColumn::ScalarFunction(sf)
                    if !c.all_aggregation_columns().is_empty() =>
                {
                    Some(sf.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Does SELECT reference any aggregation, directly or inside a scalar
    /// function? Grouping and pivoting only happen when it does.
    pub fn has_aggregation(&self) -> bool {
        !self.selection_aggregation_columns().is_empty()
    }

    // === Query-string emission ===

    /// Render the canonical query-language form.
    pub fn to_query_string(&self) -> QueryResult<String> {
        let mut clauses: Vec<TokenStream> = Vec::new();

        if let Some(selection) = &self.selection {
            let mut ts = TokenStream::new();
            ts.push(Token::Select).space();
            ts.raw_list(
                selection
                    .iter()
                    .map(|c| c.to_query_string())
                    .collect::<QueryResult<Vec<_>>>()?,
            );
            clauses.push(ts);
        }
        if let Some(filter) = &self.filter {
            let mut ts = TokenStream::new();
            ts.push(Token::Where).space().raw(filter.to_query_string()?);
            clauses.push(ts);
        }
        if let Some(group) = &self.group {
            let mut ts = TokenStream::new();
            ts.push(Token::GroupBy).space();
            ts.raw_list(
                group
                    .iter()
                    .map(|c| c.to_query_string())
                    .collect::<QueryResult<Vec<_>>>()?,
            );
            clauses.push(ts);
        }
        if let Some(pivot) = &self.pivot {
            let mut ts = TokenStream::new();
            ts.push(Token::Pivot).space();
            ts.raw_list(
                pivot
                    .iter()
                    .map(|c| c.to_query_string())
                    .collect::<QueryResult<Vec<_>>>()?,
            );
            clauses.push(ts);
        }
        if let Some(sort) = &self.sort {
            let mut ts = TokenStream::new();
            ts.push(Token::OrderBy).space();
            for (i, entry) in sort.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.raw(entry.column.to_query_string()?);
                if entry.order == SortOrder::Desc {
                    ts.space().push(Token::Desc);
                }
            }
            clauses.push(ts);
        }
        if self.has_row_skipping() {
            let mut ts = TokenStream::new();
            ts.push(Token::Skipping)
                .space()
                .push(Token::LitInt(self.row_skipping));
            clauses.push(ts);
        }
        if let Some(limit) = self.row_limit {
            let mut ts = TokenStream::new();
            ts.push(Token::Limit).space().push(Token::LitInt(limit));
            clauses.push(ts);
        }
        if self.has_row_offset() {
            let mut ts = TokenStream::new();
            ts.push(Token::Offset)
                .space()
                .push(Token::LitInt(self.row_offset));
            clauses.push(ts);
        }
        if !self.labels.is_empty() {
            clauses.push(self.pairs_clause(Token::Label, &self.labels)?);
        }
        if !self.formats.is_empty() {
            clauses.push(self.pairs_clause(Token::Format, &self.formats)?);
        }
        if self.has_options() {
            let mut ts = TokenStream::new();
            ts.push(Token::Options);
            if self.options.no_values {
                ts.space().push(Token::NoValues);
            }
            if self.options.no_format {
                ts.space().push(Token::NoFormat);
            }
            clauses.push(ts);
        }

        let rendered = clauses
            .iter()
            .map(|ts| ts.serialize())
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(rendered.join(" "))
    }

    fn pairs_clause(
        &self,
        keyword: Token,
        pairs: &[(AbstractColumn, String)],
    ) -> QueryResult<TokenStream> {
        let mut ts = TokenStream::new();
        ts.push(keyword).space();
        for (i, (column, text)) in pairs.iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.raw(column.to_query_string()?)
                .space()
                .push(Token::LitString(text.clone()));
        }
        Ok(ts)
    }
}
