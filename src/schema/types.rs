//! Schema types

use crate::types::{JsonObject, Row};
use serde::{Deserialize, Serialize};

/// Column storage type as seen by tabular consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Int,
    Bigint,
    Float,
    Double,
    Boolean,
    Date,
    Object,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::String => write!(f, "string"),
            ColumnType::Int => write!(f, "int"),
            ColumnType::Bigint => write!(f, "bigint"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Double => write!(f, "double"),
            ColumnType::Boolean => write!(f, "boolean"),
            ColumnType::Date => write!(f, "date"),
            ColumnType::Object => write!(f, "object"),
        }
    }
}

/// One named, typed column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Storage type
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl Column {
    /// Create a column
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    /// Create a string column
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::String)
    }
}

/// Ordered list of columns
///
/// Built once and passed around by value or reference. Nothing mutates a
/// schema after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Create a schema from its columns
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Columns in order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no column
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Look a column up by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Whether a column with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Column names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    /// Keep only the fields of `item` that are columns of this schema
    pub fn project(&self, item: &JsonObject) -> Row {
        item.iter()
            .filter(|(key, _)| self.contains(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl FromIterator<Column> for Schema {
    fn from_iter<T: IntoIterator<Item = Column>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
