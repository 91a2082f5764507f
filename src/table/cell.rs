//! Cells and rows.

use std::collections::HashMap;

use crate::value::{Value, ValueType};

/// One cell: a typed value, optional pre-rendered text, custom properties.
///
/// A null cell with non-empty formatted text is legal (a renderer may show
/// "N/A" for a missing number).
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct Cell {
    value: Value,
    formatted_value: Option<String>,
    custom_properties: HashMap<String, String>,
}

impl Cell {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            formatted_value: None,
            custom_properties: HashMap::new(),
        }
    }

    /// The null cell of a given type.
    pub fn null_of(value_type: ValueType) -> Self {
        Self::new(Value::null_of(value_type))
    }

    pub fn with_formatted_value(mut self, formatted: impl Into<String>) -> Self {
        self.formatted_value = Some(formatted.into());
        self
    }

    pub fn with_custom_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_properties.insert(key.into(), value.into());
        self
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn formatted_value(&self) -> Option<&str> {
        self.formatted_value.as_deref()
    }

    pub fn set_formatted_value(&mut self, formatted: impl Into<String>) {
        self.formatted_value = Some(formatted.into());
    }

    pub fn clear_formatted_value(&mut self) {
        self.formatted_value = None;
    }

    pub fn custom_properties(&self) -> &HashMap<String, String> {
        &self.custom_properties
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        Cell::new(value)
    }
}

/// An ordered list of cells plus row-level custom properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRow {
    cells: Vec<Cell>,
    custom_properties: HashMap<String, String>,
}

impl TableRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            custom_properties: HashMap::new(),
        }
    }

    /// A row of bare values.
    pub fn from_values(values: Vec<Value>) -> Self {
        Self::from_cells(values.into_iter().map(Cell::new).collect())
    }

    pub fn add_cell(&mut self, cell: impl Into<Cell>) {
        self.cells.push(cell.into());
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn cell_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.cells.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn custom_properties(&self) -> &HashMap<String, String> {
        &self.custom_properties
    }

    pub fn set_custom_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.custom_properties.insert(key.into(), value.into());
    }
}
