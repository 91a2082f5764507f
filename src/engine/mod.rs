//! The execution engine.
//!
//! `execute` validates a query against the table schema, then runs the fixed
//! pipeline:
//!
//! ```text
//! filter → group+pivot → sort → skip → paginate → project → relabel → format
//! ```
//!
//! Each stage either passes the table through unchanged or produces a
//! transformed table. The engine is single-threaded and holds no state
//! across calls.

pub mod aggregation;
pub mod lookup;

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::error::{QueryError, QueryResult, ReasonCode, Warning};
use crate::format;
use crate::locale::Locale;
use crate::query::column::{AbstractColumn, AggregationColumn};
use crate::query::{Query, SortOrder};
use crate::table::{Cell, ColumnDescription, DataTable, TableRow};
use crate::value::{Value, ValueComparator, ValueType};

use aggregation::AggregationTree;
use lookup::{ColumnIndices, DataTableColumnLookup, GenericColumnLookup};

/// Validate and execute a query over a table, producing a new table.
pub fn execute(query: &Query, table: DataTable, locale: &Locale) -> QueryResult<DataTable> {
    crate::validation::validate(query, &table)?;
    QueryEngine::new(locale).run(query, table)
}

/// Per-execution pipeline state: the stage-to-stage column addressing.
struct QueryEngine<'a> {
    locale: &'a Locale,
    /// Schema of the input table, kept for type resolution after the
    /// working table has been reshaped.
    base_schema: DataTable,
    /// Output positions of materialized columns for the current stage.
    column_indices: ColumnIndices,
}

impl<'a> QueryEngine<'a> {
    fn new(locale: &'a Locale) -> Self {
        Self {
            locale,
            base_schema: DataTable::new(),
            column_indices: ColumnIndices::new(),
        }
    }

    fn run(&mut self, query: &Query, mut table: DataTable) -> QueryResult<DataTable> {
        self.base_schema = table.clone_empty();
        table = self.apply_filter(query, table)?;
        table = self.apply_group_and_pivot(query, table)?;
        table = self.apply_sort(query, table)?;
        table = self.apply_skipping(query, table)?;
        table = self.apply_pagination(query, table)?;
        table = self.apply_selection(query, table)?;
        self.apply_labels(query, &mut table);
        self.apply_formats(query, &mut table);
        Ok(table)
    }

    // === Filter ===

    fn apply_filter(&self, query: &Query, mut table: DataTable) -> QueryResult<DataTable> {
        let Some(filter) = query.filter() else {
            return Ok(table);
        };
        let rows = table.take_rows();
        let mut kept = Vec::new();
        for row in rows {
            if filter.is_match(&table, &row)? {
                kept.push(row);
            }
        }
        table.set_rows(kept);
        Ok(table)
    }

    // === Group + pivot ===

    fn apply_group_and_pivot(&mut self, query: &Query, table: DataTable) -> QueryResult<DataTable> {
        if !query.has_aggregation() {
            return Ok(table);
        }

        let group_columns: Vec<AbstractColumn> =
            query.group().map(<[_]>::to_vec).unwrap_or_default();
        let pivot_columns: Vec<AbstractColumn> =
            query.pivot().map(<[_]>::to_vec).unwrap_or_default();
        let aggregation_columns = query.selection_aggregation_columns();
        let scalar_agg_columns = query.selection_scalar_with_aggregation_columns();

        // Aggregation targets, distinct, typed from the input schema.
        let mut targets: Vec<(String, ValueType)> = Vec::new();
        for agg in &aggregation_columns {
            let id = agg.column().id();
            if !targets.iter().any(|(t, _)| t == id) {
                let target_type = table
                    .column_by_id(id)
                    .map(|c| c.value_type())
                    .ok_or_else(|| {
                        QueryError::Internal(format!("aggregation target '{id}' vanished"))
                    })?;
                targets.push((id.to_string(), target_type));
            }
        }

        let staging = self.build_staging_table(&table, &group_columns, &pivot_columns)?;

        // Fold every staged row into the tree along its key path.
        let depth = group_columns.len() + pivot_columns.len();
        let mut tree = AggregationTree::new(depth, targets.clone());
        {
            let staging_lookup = DataTableColumnLookup::new(&staging);
            for row in staging.rows() {
                let mut path = Vec::with_capacity(depth);
                for key_column in group_columns.iter().chain(&pivot_columns) {
                    path.push(key_column.value(&staging_lookup, row)?);
                }
                let mut values = Vec::with_capacity(targets.len());
                for (id, _) in &targets {
                    let index = staging.column_index(id).ok_or_else(|| {
                        QueryError::Internal(format!("aggregation target '{id}' vanished"))
                    })?;
                    let cell = row.cell(index).ok_or_else(|| {
                        QueryError::Internal(format!("row has no cell at index {index}"))
                    })?;
                    values.push(cell.value().clone());
                }
                tree.aggregate(&path, &values)?;
            }
        }

        // Row titles: distinct group-key prefixes, in sorted order. Column
        // titles: distinct pivot vectors, sorted, crossed with the
        // aggregation columns in selection order.
        let leaves = tree.paths_to_leaves();
        let group_len = group_columns.len();
        let mut row_titles: Vec<Vec<Value>> = Vec::new();
        for leaf in &leaves {
            let title = leaf[..group_len].to_vec();
            if row_titles.last() != Some(&title) {
                row_titles.push(title);
            }
        }
        let pivot_vectors: Vec<Vec<Value>> = if pivot_columns.is_empty() {
            vec![Vec::new()]
        } else {
            leaves
                .iter()
                .map(|leaf| leaf[group_len..].to_vec())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };

        // Emit the grouped table: group columns first, then one column per
        // (pivot vector, aggregation) title.
        let mut grouped = DataTable::new().with_locale(table.locale().clone());
        for (key, value) in table.custom_properties() {
            grouped.set_custom_property(key.clone(), value.clone());
        }
        grouped.extend_warnings(table.warnings().iter().cloned());

        self.column_indices.clear();
        for group_column in &group_columns {
            let column_type = group_column.value_type(&table)?;
            let label = match group_column {
                AbstractColumn::Simple(simple) => table
                    .column_by_id(simple.id())
                    .map(|c| c.label().to_string())
                    .unwrap_or_else(|| group_column.label()),
                _ => group_column.label(),
            };
            grouped.add_column(ColumnDescription::new(
                group_column.id(),
                column_type,
                label,
            ))?;
            self.column_indices
                .put(group_column.id(), grouped.num_columns() - 1);
        }

        let mut column_titles: Vec<(Vec<Value>, AggregationColumn)> = Vec::new();
        for vector in &pivot_vectors {
            for agg in &aggregation_columns {
                column_titles.push((vector.clone(), agg.clone()));
            }
        }
        let mut title_types = Vec::with_capacity(column_titles.len());
        for (vector, agg) in &column_titles {
            let target_type = targets
                .iter()
                .find(|(id, _)| id == agg.column().id())
                .map(|(_, ty)| *ty)
                .ok_or_else(|| QueryError::Internal("untracked aggregation target".into()))?;
            let result_type = agg.result_type(target_type);
            title_types.push(result_type);
            let id = pivoted_id(vector, &agg.id());
            grouped.add_column(ColumnDescription::new(id.clone(), result_type, id))?;
            self.column_indices.put_pivoted(
                agg.id(),
                grouped.num_columns() - 1,
                pivot_prefix(vector),
            );
        }

        for title in &row_titles {
            let mut row = TableRow::new();
            for value in title {
                row.add_cell(Cell::new(value.clone()));
            }
            for ((vector, agg), result_type) in column_titles.iter().zip(&title_types) {
                let path: Vec<Value> = title.iter().chain(vector.iter()).cloned().collect();
                let value = tree
                    .value_at(&path, agg.column().id(), agg.aggregation())?
                    .unwrap_or_else(|| Value::null_of(*result_type));
                row.add_cell(Cell::new(value));
            }
            grouped.push_row(row);
        }

        // Selected scalar functions containing aggregations get one column
        // per pivot vector, evaluated through a lookup scoped to that
        // vector.
        if !scalar_agg_columns.is_empty() {
            let mut pivoted_lookups: Vec<(Vec<Value>, GenericColumnLookup)> = Vec::new();
            for vector in &pivot_vectors {
                let mut scoped = GenericColumnLookup::new();
                for (index, group_column) in group_columns.iter().enumerate() {
                    scoped.put(group_column.id(), index);
                }
                for (title_index, (title_vector, agg)) in column_titles.iter().enumerate() {
                    if title_vector == vector {
                        scoped.put(agg.id(), group_len + title_index);
                    }
                }
                pivoted_lookups.push((vector.clone(), scoped));
            }

            for scalar in &scalar_agg_columns {
                let column = AbstractColumn::ScalarFunction(scalar.clone());
                let column_type = column.value_type(&self.base_schema)?;
                for (vector, scoped) in &pivoted_lookups {
                    let mut values = Vec::with_capacity(grouped.num_rows());
                    for row in grouped.rows() {
                        values.push(column.value(scoped, row)?);
                    }
                    let label = if vector.is_empty() {
                        column.label()
                    } else {
                        format!("{} {}", pivot_prefix(vector), column.label())
                    };
                    grouped.add_column(ColumnDescription::new(
                        pivoted_id(vector, &column.id()),
                        column_type,
                        label,
                    ))?;
                    let index = grouped.num_columns() - 1;
                    for (row, value) in grouped.rows_mut().iter_mut().zip(values) {
                        row.add_cell(Cell::new(value));
                    }
                    self.column_indices
                        .put_pivoted(column.id(), index, pivot_prefix(vector));
                }
            }
        }

        Ok(grouped)
    }

    /// A working copy of the table with any group/pivot scalar-function
    /// columns appended so their values are available for keying. Rows whose
    /// synthesized cells fail the schema check are dropped.
    fn build_staging_table(
        &self,
        table: &DataTable,
        group_columns: &[AbstractColumn],
        pivot_columns: &[AbstractColumn],
    ) -> QueryResult<DataTable> {
        let mut scalar_keys: Vec<AbstractColumn> = Vec::new();
        for column in group_columns.iter().chain(pivot_columns) {
            if matches!(column, AbstractColumn::ScalarFunction(_))
                && table.column_index(&column.id()).is_none()
                && !scalar_keys.iter().any(|k| k.id() == column.id())
            {
                scalar_keys.push(column.clone());
            }
        }
        if scalar_keys.is_empty() {
            return Ok(table.clone());
        }

        let mut staging = table.clone_empty();
        for key in &scalar_keys {
            let key_type = key.value_type(table)?;
            staging.add_column(ColumnDescription::new(key.id(), key_type, key.label()))?;
        }
        let lookup = DataTableColumnLookup::new(table);
        for row in table.rows() {
            let mut staged = row.clone();
            for key in &scalar_keys {
                staged.add_cell(Cell::new(key.value(&lookup, row)?));
            }
            if staging.add_row(staged).is_err() {
                continue;
            }
        }
        Ok(staging)
    }

    // === Sort ===

    fn apply_sort(&self, query: &Query, mut table: DataTable) -> QueryResult<DataTable> {
        let Some(sort) = query.sort() else {
            return Ok(table);
        };
        if sort.is_empty() {
            return Ok(table);
        }
        let comparator = ValueComparator::for_locale(self.locale);
        let rows = table.take_rows();
        let lookup = DataTableColumnLookup::new(&table);
        let mut keyed: Vec<(Vec<Value>, TableRow)> = Vec::with_capacity(rows.len());
        for row in rows {
            let mut keys = Vec::with_capacity(sort.len());
            for entry in sort {
                keys.push(entry.column.value(&lookup, &row)?);
            }
            keyed.push((keys, row));
        }
        keyed.sort_by(|(a, _), (b, _)| {
            for (index, entry) in sort.iter().enumerate() {
                let ordering = comparator.compare(&a[index], &b[index]);
                let ordering = if entry.order == SortOrder::Desc {
                    ordering.reverse()
                } else {
                    ordering
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
        table.set_rows(keyed.into_iter().map(|(_, row)| row).collect());
        Ok(table)
    }

    // === Skip ===

    fn apply_skipping(&self, query: &Query, mut table: DataTable) -> QueryResult<DataTable> {
        let step = query.row_skipping() as usize;
        if step <= 1 {
            return Ok(table);
        }
        let rows = table.take_rows();
        table.set_rows(
            rows.into_iter()
                .enumerate()
                .filter(|(index, _)| index % step == 0)
                .map(|(_, row)| row)
                .collect(),
        );
        Ok(table)
    }

    // === Paginate ===

    fn apply_pagination(&self, query: &Query, mut table: DataTable) -> QueryResult<DataTable> {
        if !query.has_row_limit() && !query.has_row_offset() {
            return Ok(table);
        }
        let total = table.num_rows();
        let start = (query.row_offset() as usize).min(total);
        let end = match query.row_limit() {
            Some(limit) => (start + limit as usize).min(total),
            None => total,
        };
        if end < total {
            table.add_warning(Warning::new(
                ReasonCode::DataTruncated,
                "Output was truncated to the requested page.",
            ));
        }
        let rows = table.take_rows();
        table.set_rows(rows.into_iter().take(end).skip(start).collect());
        Ok(table)
    }

    // === Select (project) ===

    fn apply_selection(&mut self, query: &Query, table: DataTable) -> QueryResult<DataTable> {
        let Some(selection) = query.selection() else {
            if self.column_indices.is_empty() {
                for (index, column) in table.columns().iter().enumerate() {
                    self.column_indices.put(column.id(), index);
                }
            }
            return Ok(table);
        };

        enum Source {
            Copy(usize),
            Evaluate(AbstractColumn),
        }

        let grouped = !self.column_indices.is_empty();
        let mut out = DataTable::new().with_locale(table.locale().clone());
        out.extend_warnings(table.warnings().iter().cloned());
        for (key, value) in table.custom_properties() {
            out.set_custom_property(key.clone(), value.clone());
        }

        let mut plan: Vec<Source> = Vec::new();
        let mut projected = ColumnIndices::new();
        for column in selection {
            let id = column.id();
            let positions = if grouped {
                self.column_indices.get(&id).map(<[_]>::to_vec)
            } else {
                table.column_index(&id).map(|index| vec![index])
            };
            match positions {
                Some(positions) => {
                    for index in positions {
                        let description = table
                            .column(index)
                            .ok_or_else(|| {
                                QueryError::Internal(format!("no column at index {index}"))
                            })?
                            .clone();
                        let out_index = out.num_columns();
                        out.add_column(description)?;
                        match self.column_indices.pivot_prefix(index) {
                            Some(prefix) => {
                                projected.put_pivoted(id.clone(), out_index, prefix.to_string())
                            }
                            None => projected.put(id.clone(), out_index),
                        }
                        plan.push(Source::Copy(index));
                    }
                }
                None => {
                    let column_type = column
                        .value_type(&table)
                        .or_else(|_| column.value_type(&self.base_schema))?;
                    out.add_column(ColumnDescription::new(
                        id.clone(),
                        column_type,
                        column.label(),
                    ))?;
                    projected.put(id.clone(), out.num_columns() - 1);
                    plan.push(Source::Evaluate(column.clone()));
                }
            }
        }

        let lookup = DataTableColumnLookup::new(&table);
        for row in table.rows() {
            let mut new_row = TableRow::new();
            for source in &plan {
                match source {
                    Source::Copy(index) => {
                        let cell = row.cell(*index).ok_or_else(|| {
                            QueryError::Internal(format!("row has no cell at index {index}"))
                        })?;
                        new_row.add_cell(cell.clone());
                    }
                    Source::Evaluate(column) => {
                        new_row.add_cell(Cell::new(column.value(&lookup, row)?));
                    }
                }
            }
            for (key, value) in row.custom_properties() {
                new_row.set_custom_property(key.clone(), value.clone());
            }
            out.push_row(new_row);
        }

        self.column_indices = projected;
        Ok(out)
    }

    // === Labels ===

    fn apply_labels(&self, query: &Query, table: &mut DataTable) {
        for (column, label) in query.labels() {
            for index in self.positions_of(&column.id(), table) {
                let composed = match self.column_indices.pivot_prefix(index) {
                    Some(prefix) => format!("{prefix} {label}"),
                    None => label.clone(),
                };
                if let Some(description) = table.column_mut(index) {
                    description.set_label(composed);
                }
            }
        }
    }

    // === Formatting ===

    fn apply_formats(&self, query: &Query, table: &mut DataTable) {
        for (column, pattern) in query.formats() {
            let id = column.id();
            let positions = self.positions_of(&id, table);
            let Some(&first) = positions.first() else {
                continue;
            };
            let Some(column_type) = table.column(first).map(|c| c.value_type()) else {
                continue;
            };
            let formatter = match format::compile(column_type, pattern, self.locale) {
                Ok(formatter) => formatter,
                Err(_) => {
                    table.add_warning(Warning::new(
                        ReasonCode::IllegalFormattingPatterns,
                        format!("Illegal formatting pattern '{pattern}' for column '{id}'."),
                    ));
                    continue;
                }
            };
            for index in positions {
                if let Some(description) = table.column_mut(index) {
                    description.set_pattern(pattern.clone());
                }
                for row in table.rows_mut() {
                    if let Some(cell) = row.cell_mut(index) {
                        let text = formatter.format(cell.value());
                        cell.set_formatted_value(text);
                    }
                }
            }
        }
    }

    /// Output positions addressed by a column id at the current stage.
    fn positions_of(&self, id: &str, table: &DataTable) -> Vec<usize> {
        match self.column_indices.get(id) {
            Some(positions) => positions.to_vec(),
            None => table.column_index(id).into_iter().collect(),
        }
    }
}

/// `v1,v2 agg-id` for a nonempty pivot vector, the bare id otherwise.
fn pivoted_id(vector: &[Value], id: &str) -> String {
    if vector.is_empty() {
        id.to_string()
    } else {
        format!("{} {}", pivot_prefix(vector), id)
    }
}

/// `v1,v2` - the display form of a pivot vector.
fn pivot_prefix(vector: &[Value]) -> String {
    vector
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
