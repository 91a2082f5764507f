//! Column lookups: mapping abstract columns to positional indices within a
//! row for a specific pipeline stage.

use std::collections::HashMap;

use crate::query::column::AbstractColumn;
use crate::table::DataTable;

/// Maps an abstract column to its current positional index.
pub trait ColumnLookup {
    fn column_index(&self, column: &AbstractColumn) -> Option<usize>;

    fn contains(&self, column: &AbstractColumn) -> bool {
        self.column_index(column).is_some()
    }
}

/// Identity lookup over a table: a column is addressable when the table has
/// a column with its generated id. This covers simple columns on a raw table
/// and any column materialized under its id by an earlier stage.
#[derive(Debug)]
pub struct DataTableColumnLookup<'a> {
    table: &'a DataTable,
}

impl<'a> DataTableColumnLookup<'a> {
    pub fn new(table: &'a DataTable) -> Self {
        Self { table }
    }
}

impl ColumnLookup for DataTableColumnLookup<'_> {
    fn column_index(&self, column: &AbstractColumn) -> Option<usize> {
        self.table.column_index(&column.id())
    }
}

/// Explicit dictionary lookup, populated by the engine after grouping and
/// pivoting so the same abstract column can be addressed at a later stage.
#[derive(Debug, Clone, Default)]
pub struct GenericColumnLookup {
    indices: HashMap<String, usize>,
}

impl GenericColumnLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, column_id: impl Into<String>, index: usize) {
        self.indices.insert(column_id.into(), index);
    }
}

impl ColumnLookup for GenericColumnLookup {
    fn column_index(&self, column: &AbstractColumn) -> Option<usize> {
        self.indices.get(&column.id()).copied()
    }
}

/// Output positions of each materialized column, keyed by the column's
/// generated id. Under pivoting one column id can own several positions, in
/// column-title order; `pivot_prefixes` carries the pivot-value label prefix
/// of each such position.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndices {
    indices: HashMap<String, Vec<usize>>,
    pivot_prefixes: HashMap<usize, String>,
}

impl ColumnIndices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn put(&mut self, column_id: impl Into<String>, index: usize) {
        self.indices.entry(column_id.into()).or_default().push(index);
    }

    pub fn put_pivoted(&mut self, column_id: impl Into<String>, index: usize, prefix: String) {
        self.put(column_id, index);
        if !prefix.is_empty() {
            self.pivot_prefixes.insert(index, prefix);
        }
    }

    pub fn get(&self, column_id: &str) -> Option<&[usize]> {
        self.indices.get(column_id).map(|v| v.as_slice())
    }

    pub fn pivot_prefix(&self, index: usize) -> Option<&str> {
        self.pivot_prefixes.get(&index).map(|s| s.as_str())
    }

    pub fn clear(&mut self) {
        self.indices.clear();
        self.pivot_prefixes.clear();
    }
}
