//! Query splitting.
//!
//! A data source advertises a [`Capability`]; [`split`] partitions a query
//! into a part the data source evaluates itself and a completion part the
//! engine runs over the data source's result. Composing the two is
//! observably equivalent to running the original query over the raw table.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::query::column::{AbstractColumn, AggregationType};
use crate::query::{Query, QueryOptions};

/// What a backend can evaluate by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// The backend executes whole queries.
    All,
    /// The backend only hands back the raw table.
    None,
    /// The backend can project columns.
    Select,
    /// The backend can sort and paginate.
    SortAndPagination,
    /// The backend speaks SQL (no pivot, no scalar functions).
    Sql,
}

impl Capability {
    pub fn code(&self) -> &'static str {
        match self {
            Capability::All => "ALL",
            Capability::None => "NONE",
            Capability::Select => "SELECT",
            Capability::SortAndPagination => "SORT_AND_PAGINATION",
            Capability::Sql => "SQL",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Capability {
    type Err = QueryError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.to_ascii_uppercase().as_str() {
            "ALL" => Ok(Capability::All),
            "NONE" => Ok(Capability::None),
            "SELECT" => Ok(Capability::Select),
            "SORT_AND_PAGINATION" => Ok(Capability::SortAndPagination),
            "SQL" => Ok(Capability::Sql),
            _ => Err(QueryError::NotSupported(format!(
                "unknown capability '{tag}'"
            ))),
        }
    }
}

/// The two halves of a split: the data-source query (`None` when the data
/// source is only asked for the raw table) and the completion query the
/// engine runs afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitQuery {
    pub data_source_query: Option<Query>,
    pub completion_query: Query,
}

/// Partition a query according to a capability.
pub fn split(query: &Query, capability: Capability) -> QueryResult<SplitQuery> {
    match capability {
        Capability::All => Ok(SplitQuery {
            data_source_query: Some(query.clone()),
            completion_query: Query::new(),
        }),
        Capability::None => Ok(engine_only(query)),
        Capability::Select => Ok(split_select(query)),
        Capability::SortAndPagination => Ok(split_sort_and_pagination(query)),
        Capability::Sql => Ok(split_sql(query)),
    }
}

/// The data source returns the raw table; the engine does everything.
fn engine_only(query: &Query) -> SplitQuery {
    SplitQuery {
        data_source_query: None,
        completion_query: query.clone(),
    }
}

/// SELECT capability: the data source projects every simple column the
/// query mentions anywhere; the engine runs the full query on top.
fn split_select(query: &Query) -> SplitQuery {
    let ids = query.all_simple_column_ids();
    let mut data_source = Query::new();
    if !ids.is_empty() {
        data_source.set_selection(ids.into_iter().map(AbstractColumn::simple).collect());
    }
    SplitQuery {
        data_source_query: Some(data_source),
        completion_query: query.clone(),
    }
}

fn split_sort_and_pagination(query: &Query) -> SplitQuery {
    if !query.all_scalar_function_columns().is_empty() {
        return engine_only(query);
    }
    // Filtering and aggregation must run before any reordering or
    // pagination, so they pin the whole query to the engine.
    if query.has_filter() || query.has_group() || query.has_pivot() || query.has_aggregation() {
        return SplitQuery {
            data_source_query: Some(Query::new()),
            completion_query: query.clone(),
        };
    }
    let mut data_source = Query::new();
    if let Some(sort) = query.sort() {
        data_source.set_sort(sort.to_vec());
    }
    let mut completion = Query::new();
    if let Some(selection) = query.selection() {
        completion.set_selection(selection.to_vec());
    }
    completion.set_labels(query.labels().to_vec());
    completion.set_formats(query.formats().to_vec());
    completion.set_options(query.options());
    if query.has_row_skipping() {
        // Skipping cannot run remotely, and pagination must come after it.
        completion.set_row_skipping(query.row_skipping());
        completion.set_row_limit(query.row_limit());
        completion.set_row_offset(query.row_offset());
    } else {
        data_source.set_row_limit(query.row_limit());
        data_source.set_row_offset(query.row_offset());
    }
    SplitQuery {
        data_source_query: Some(data_source),
        completion_query: completion,
    }
}

fn split_sql(query: &Query) -> SplitQuery {
    if !query.all_scalar_function_columns().is_empty() {
        return engine_only(query);
    }
    if query.has_pivot() {
        let decorates_aggregation = query
            .labels()
            .iter()
            .chain(query.formats())
            .any(|(column, _)| !column.all_aggregation_columns().is_empty());
        if decorates_aggregation {
            return engine_only(query);
        }
        return split_sql_with_pivot(query);
    }
    split_sql_without_pivot(query)
}

/// SQL cannot pivot. The data source groups by `G ++ P` and selects
/// `G ++ aggregations ++ P`; each `(G, P)` group then holds exactly one row,
/// so the completion re-aggregates every prior aggregation through MIN while
/// grouping by `G` and pivoting by `P`.
fn split_sql_with_pivot(query: &Query) -> SplitQuery {
    let group: Vec<AbstractColumn> = query.group().map(<[_]>::to_vec).unwrap_or_default();
    let pivot: Vec<AbstractColumn> = query.pivot().map(<[_]>::to_vec).unwrap_or_default();
    let aggregations = query.selection_aggregation_columns();

    let mut data_source = Query::new();
    let mut selection = group.clone();
    selection.extend(
        aggregations
            .iter()
            .map(|agg| AbstractColumn::Aggregation(agg.clone())),
    );
    selection.extend(pivot.iter().cloned());
    data_source.set_selection(selection);
    if let Some(filter) = query.filter() {
        data_source.set_filter(filter.clone());
    }
    let mut data_source_group = group;
    data_source_group.extend(pivot);
    data_source.set_group(data_source_group);

    let mut completion = query.clone();
    completion.clear_filter();
    if let Some(selection) = query.selection() {
        let reaggregated = selection
            .iter()
            .map(|column| match column {
                AbstractColumn::Aggregation(agg) => {
                    AbstractColumn::aggregation(AggregationType::Min, agg.id())
                }
                other => other.clone(),
            })
            .collect();
        completion.set_selection(reaggregated);
    }

    SplitQuery {
        data_source_query: Some(data_source),
        completion_query: completion,
    }
}

/// Without pivot the data source runs everything except decorations;
/// labels and formats are re-keyed onto the data source's output column ids.
fn split_sql_without_pivot(query: &Query) -> SplitQuery {
    let mut data_source = query.clone();
    data_source.set_labels(Vec::new());
    data_source.set_formats(Vec::new());
    data_source.set_options(QueryOptions::default());

    let mut completion = Query::new();
    completion.set_labels(rekey(query.labels()));
    completion.set_formats(rekey(query.formats()));
    completion.set_options(query.options());
    if query.has_row_skipping() {
        data_source.set_row_skipping(0);
        data_source.set_row_limit(None);
        data_source.set_row_offset(0);
        completion.set_row_skipping(query.row_skipping());
        completion.set_row_limit(query.row_limit());
        completion.set_row_offset(query.row_offset());
    }
    SplitQuery {
        data_source_query: Some(data_source),
        completion_query: completion,
    }
}

/// Address decorated columns by the id they carry in the data source's
/// output table.
fn rekey(pairs: &[(AbstractColumn, String)]) -> Vec<(AbstractColumn, String)> {
    pairs
        .iter()
        .map(|(column, text)| (AbstractColumn::simple(column.id()), text.clone()))
        .collect()
}
