//! Query validation.
//!
//! Enforces the cross-clause invariants of the query model against a table
//! schema. Validation stops at the first violation and reports it with a
//! stable code and a readable message.

use crate::error::{InvalidQueryCode, QueryError, QueryResult};
use crate::query::column::AbstractColumn;
use crate::query::Query;
use crate::table::DataTable;

/// Validate a query against a table schema.
pub fn validate(query: &Query, table: &DataTable) -> QueryResult<()> {
    validate_columns(query, table)?;
    validate_duplicates(query)?;
    validate_aggregation_placement(query)?;
    validate_grouping(query)?;
    validate_sort(query)?;
    validate_labels_and_formats(query)?;
    Ok(())
}

/// Every referenced column must exist and be well typed (aggregation
/// operators match their target types, scalar functions their argument
/// types).
fn validate_columns(query: &Query, table: &DataTable) -> QueryResult<()> {
    for column in query.all_columns() {
        column.validate(table)?;
    }
    Ok(())
}

/// No duplicate columns within SELECT, ORDER BY, GROUP BY, or PIVOT.
fn validate_duplicates(query: &Query) -> QueryResult<()> {
    let clauses: [(&[AbstractColumn], InvalidQueryCode, &str); 3] = [
        (
            query.selection().unwrap_or_default(),
            InvalidQueryCode::DuplicateSelectColumn,
            "SELECT",
        ),
        (
            query.group().unwrap_or_default(),
            InvalidQueryCode::DuplicateGroupColumn,
            "GROUP BY",
        ),
        (
            query.pivot().unwrap_or_default(),
            InvalidQueryCode::DuplicatePivotColumn,
            "PIVOT",
        ),
    ];
    for (columns, code, clause) in clauses {
        if let Some(duplicate) = first_duplicate(columns) {
            return Err(duplicate_error(code, clause, duplicate));
        }
    }
    let sort_columns: Vec<AbstractColumn> = query
        .sort()
        .unwrap_or_default()
        .iter()
        .map(|s| s.column.clone())
        .collect();
    if let Some(duplicate) = first_duplicate(&sort_columns) {
        return Err(duplicate_error(
            InvalidQueryCode::DuplicateSortColumn,
            "ORDER BY",
            duplicate,
        ));
    }
    Ok(())
}

fn first_duplicate(columns: &[AbstractColumn]) -> Option<&AbstractColumn> {
    columns
        .iter()
        .enumerate()
        .find(|(index, column)| columns[..*index].contains(column))
        .map(|(_, column)| column)
}

fn duplicate_error(code: InvalidQueryCode, clause: &str, column: &AbstractColumn) -> QueryError {
    QueryError::invalid_query(
        code,
        format!("Column '{}' appears more than once in {clause}.", column.id()),
    )
}

/// Aggregations may not appear in GROUP BY, PIVOT, or WHERE.
fn validate_aggregation_placement(query: &Query) -> QueryResult<()> {
    for column in query.group().unwrap_or_default() {
        if !column.all_aggregation_columns().is_empty() {
            return Err(QueryError::invalid_query(
                InvalidQueryCode::AggInGroupBy,
                format!("Aggregation '{}' found in GROUP BY.", column.id()),
            ));
        }
    }
    for column in query.pivot().unwrap_or_default() {
        if !column.all_aggregation_columns().is_empty() {
            return Err(QueryError::invalid_query(
                InvalidQueryCode::AggInPivot,
                format!("Aggregation '{}' found in PIVOT.", column.id()),
            ));
        }
    }
    if let Some(filter) = query.filter() {
        if let Some(agg) = filter.all_aggregation_columns().first() {
            return Err(QueryError::invalid_query(
                InvalidQueryCode::AggInWhere,
                format!("Aggregation '{}' found in WHERE.", agg.id()),
            ));
        }
    }
    Ok(())
}

/// The grouping rules: aggregated selections must group every bare column,
/// a column may not be selected both ways, grouping keys may not be
/// aggregation targets, GROUP BY / PIVOT require an aggregation, and a
/// column may not be both a group and a pivot key.
fn validate_grouping(query: &Query) -> QueryResult<()> {
    let group = query.group().unwrap_or_default();
    let pivot = query.pivot().unwrap_or_default();
    let selection = query.selection().unwrap_or_default();

    for column in selection {
        if let AbstractColumn::Simple(simple) = column {
            let also_aggregated = selection.iter().any(|other| {
                matches!(other, AbstractColumn::Aggregation(agg) if agg.column() == simple)
            });
            if also_aggregated {
                return Err(QueryError::invalid_query(
                    InvalidQueryCode::SelectWithAndWithoutAgg,
                    format!(
                        "Column '{}' is selected both with and without aggregation.",
                        simple.id()
                    ),
                ));
            }
        }
    }

    if query.has_aggregation() {
        for column in selection {
            if column.all_aggregation_columns().is_empty() && !is_grouped(column, group) {
                return Err(QueryError::invalid_query(
                    InvalidQueryCode::UngroupedSelectColumn,
                    format!(
                        "Cannot select column '{}'; it is neither grouped nor aggregated.",
                        column.id()
                    ),
                ));
            }
        }
    }

    for agg in query.selection_aggregation_columns() {
        let target = AbstractColumn::Simple(agg.column().clone());
        if group.contains(&target) {
            return Err(QueryError::invalid_query(
                InvalidQueryCode::AggTargetInGroupBy,
                format!(
                    "Column '{}' is aggregated in SELECT and cannot appear in GROUP BY.",
                    agg.column().id()
                ),
            ));
        }
    }

    if query.has_group() && !query.has_aggregation() {
        return Err(QueryError::invalid_query(
            InvalidQueryCode::CannotGroupWithoutAgg,
            "GROUP BY requires at least one aggregation in SELECT.",
        ));
    }
    if query.has_pivot() && !query.has_aggregation() {
        return Err(QueryError::invalid_query(
            InvalidQueryCode::CannotPivotWithoutAgg,
            "PIVOT requires at least one aggregation in SELECT.",
        ));
    }

    for column in group {
        if pivot.contains(column) {
            return Err(QueryError::invalid_query(
                InvalidQueryCode::ColInGroupAndPivot,
                format!("Column '{}' appears in both GROUP BY and PIVOT.", column.id()),
            ));
        }
    }
    Ok(())
}

/// A column is grouped when it appears in GROUP BY, or is a scalar function
/// whose arguments are all grouped, recursively. Constants are trivially
/// grouped.
fn is_grouped(column: &AbstractColumn, group: &[AbstractColumn]) -> bool {
    if group.contains(column) {
        return true;
    }
    match column {
        AbstractColumn::Simple(_) => false,
        AbstractColumn::Aggregation(_) => false,
        AbstractColumn::ScalarFunction(scalar) => scalar
            .arguments()
            .iter()
            .all(|argument| is_grouped(argument, group)),
    }
}

/// The ORDER BY rules in the presence of aggregation and pivoting.
fn validate_sort(query: &Query) -> QueryResult<()> {
    let selection = query.selection().unwrap_or_default();
    for entry in query.sort().unwrap_or_default() {
        let column = &entry.column;
        if query.has_aggregation() && !selection.contains(column) {
            return Err(QueryError::invalid_query(
                InvalidQueryCode::SortColNotInSelect,
                format!(
                    "ORDER BY column '{}' must appear in an aggregated SELECT.",
                    column.id()
                ),
            ));
        }
        let sort_aggs = column.all_aggregation_columns();
        if !sort_aggs.is_empty() && query.has_pivot() {
            return Err(QueryError::invalid_query(
                InvalidQueryCode::NoAggSortWithPivot,
                format!(
                    "ORDER BY cannot reference aggregation '{}' when PIVOT is in use.",
                    column.id()
                ),
            ));
        }
        let selected_aggs = query.selection_aggregation_columns();
        for agg in sort_aggs {
            if !selected_aggs.contains(&agg) {
                return Err(QueryError::invalid_query(
                    InvalidQueryCode::AggSortNotInSelect,
                    format!("ORDER BY aggregation '{}' must appear in SELECT.", agg.id()),
                ));
            }
        }
    }
    Ok(())
}

/// LABEL / FORMAT may only reference selected columns when a selection is
/// present; with no selection every column is implicitly selected.
fn validate_labels_and_formats(query: &Query) -> QueryResult<()> {
    let Some(selection) = query.selection() else {
        return Ok(());
    };
    for (column, _) in query.labels() {
        if !selection.contains(column) {
            return Err(QueryError::invalid_query(
                InvalidQueryCode::LabelColNotInSelect,
                format!("LABEL column '{}' is not in SELECT.", column.id()),
            ));
        }
    }
    for (column, _) in query.formats() {
        if !selection.contains(column) {
            return Err(QueryError::invalid_query(
                InvalidQueryCode::FormatColNotInSelect,
                format!("FORMAT column '{}' is not in SELECT.", column.id()),
            ));
        }
    }
    Ok(())
}
