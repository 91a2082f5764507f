//! The data table: an ordered list of typed columns, an ordered list of
//! rows, warnings, and custom properties.

mod cell;
mod column;

pub use cell::{Cell, TableRow};
pub use column::ColumnDescription;

use std::collections::HashMap;

use crate::error::{TableError, Warning};
use crate::locale::Locale;

/// An in-memory table with a typed schema.
///
/// Column ids are unique. Every row has exactly one cell per column whose
/// value type matches the column (typed nulls always match). Short rows are
/// padded with typed nulls on insertion; long rows are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    columns: Vec<ColumnDescription>,
    column_index: HashMap<String, usize>,
    rows: Vec<TableRow>,
    warnings: Vec<Warning>,
    locale: Locale,
    custom_properties: HashMap<String, String>,
}

impl DataTable {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            column_index: HashMap::new(),
            rows: Vec::new(),
            warnings: Vec::new(),
            locale: Locale::default(),
            custom_properties: HashMap::new(),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// A new table with this table's columns, locale, and properties but no
    /// rows or warnings.
    pub fn clone_empty(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            column_index: self.column_index.clone(),
            rows: Vec::new(),
            warnings: Vec::new(),
            locale: self.locale.clone(),
            custom_properties: self.custom_properties.clone(),
        }
    }

    // === Columns ===

    pub fn add_column(&mut self, column: ColumnDescription) -> Result<(), TableError> {
        if self.column_index.contains_key(column.id()) {
            return Err(TableError::DuplicateColumnId(column.id().to_string()));
        }
        self.column_index
            .insert(column.id().to_string(), self.columns.len());
        self.columns.push(column);
        Ok(())
    }

    pub fn add_columns(
        &mut self,
        columns: impl IntoIterator<Item = ColumnDescription>,
    ) -> Result<(), TableError> {
        for column in columns {
            self.add_column(column)?;
        }
        Ok(())
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnDescription] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&ColumnDescription> {
        self.columns.get(index)
    }

    pub fn column_mut(&mut self, index: usize) -> Option<&mut ColumnDescription> {
        self.columns.get_mut(index)
    }

    pub fn column_by_id(&self, id: &str) -> Option<&ColumnDescription> {
        self.column_index.get(id).map(|&i| &self.columns[i])
    }

    /// Position of a column id within the schema.
    pub fn column_index(&self, id: &str) -> Option<usize> {
        self.column_index.get(id).copied()
    }

    // === Rows ===

    /// Add a row, padding a short row with typed nulls and rejecting rows
    /// that are too long or carry mismatched cell types.
    pub fn add_row(&mut self, mut row: TableRow) -> Result<(), TableError> {
        if row.len() > self.columns.len() {
            return Err(TableError::RowTooLong {
                got: row.len(),
                expected: self.columns.len(),
            });
        }
        for (i, cell) in row.cells().iter().enumerate() {
            let column = &self.columns[i];
            if cell.value().value_type() != column.value_type() {
                return Err(TableError::TypeMismatch {
                    column_id: column.id().to_string(),
                    column_type: column.value_type(),
                    value_type: cell.value().value_type(),
                });
            }
        }
        for column in &self.columns[row.len()..] {
            row.add_cell(Cell::null_of(column.value_type()));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn add_rows(&mut self, rows: impl IntoIterator<Item = TableRow>) -> Result<(), TableError> {
        for row in rows {
            self.add_row(row)?;
        }
        Ok(())
    }

    /// Append a row whose cells are already known to match the schema.
    pub(crate) fn push_row(&mut self, row: TableRow) {
        self.rows.push(row);
    }

    /// Move the rows out, leaving the schema in place.
    pub(crate) fn take_rows(&mut self) -> Vec<TableRow> {
        std::mem::take(&mut self.rows)
    }

    pub(crate) fn set_rows(&mut self, rows: Vec<TableRow>) {
        self.rows = rows;
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&TableRow> {
        self.rows.get(index)
    }

    pub fn rows_mut(&mut self) -> &mut [TableRow] {
        &mut self.rows
    }

    /// The cell at (row, column), if both exist.
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.cell(column))
    }

    // === Warnings, locale, properties ===

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn add_warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub(crate) fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = Warning>) {
        self.warnings.extend(warnings);
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    pub fn custom_properties(&self) -> &HashMap<String, String> {
        &self.custom_properties
    }

    pub fn set_custom_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.custom_properties.insert(key.into(), value.into());
    }
}

impl Default for DataTable {
    fn default() -> Self {
        Self::new()
    }
}
