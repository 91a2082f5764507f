//! Per-column schema.

use std::collections::HashMap;

use crate::value::ValueType;

/// Schema of one table column: id, type, label, optional formatting pattern,
/// custom properties.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct ColumnDescription {
    id: String,
    value_type: ValueType,
    label: String,
    pattern: Option<String>,
    custom_properties: HashMap<String, String>,
}

impl ColumnDescription {
    pub fn new(id: impl Into<String>, value_type: ValueType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value_type,
            label: label.into(),
            pattern: None,
            custom_properties: HashMap::new(),
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_custom_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_properties.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn set_pattern(&mut self, pattern: impl Into<String>) {
        self.pattern = Some(pattern.into());
    }

    pub fn custom_properties(&self) -> &HashMap<String, String> {
        &self.custom_properties
    }

    pub fn set_custom_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.custom_properties.insert(key.into(), value.into());
    }
}
