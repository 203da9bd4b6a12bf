//! Column schemas shared by resolution and generation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Ordered column schema of one source table
///
/// When read from an upstream schema artifact, fields other than the table
/// name and columns are kept in `extra` so the artifact can be echoed intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSchema {
    #[serde(default)]
    pub domain: String,
    pub table_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub columns: Vec<ColumnSchema>,
}

impl SourceSchema {
    pub fn new(domain: impl Into<String>, table_name: impl Into<String>, columns: Vec<ColumnSchema>) -> Self {
        Self {
            domain: domain.into(),
            table_name: table_name.into(),
            extra: Map::new(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// Resolved source schemas for one run, keyed by source table name
///
/// Lookup only; callers walk `MappingSpecification::source_tables` for file order.
pub type SchemaCache = BTreeMap<String, SourceSchema>;
