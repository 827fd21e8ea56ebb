//! SharePoint list reading and writing

use super::client::SharePointClient;
use crate::error::Result;
use crate::limit::{LimitedRows, RecordsLimit};
use crate::schema::{Column, ColumnType, Schema};
use crate::types::{JsonObject, JsonValue, Row};
use serde_json::Value;
use tracing::{debug, info};

/// Storage type of a SharePoint field, `None` for fields that are skipped
pub fn column_type_for(type_as_string: &str) -> Option<ColumnType> {
    match type_as_string {
        "Text" | "Number" | "Boolean" => Some(ColumnType::String),
        "DateTime" => Some(ColumnType::Date),
        "URL" | "Location" => Some(ColumnType::Object),
        "Computed" | "Attachments" => None,
        _ => Some(ColumnType::String),
    }
}

/// Build a schema from list field definitions
///
/// Hidden and read-only fields are left out. `None` when the list declares
/// no field at all.
pub fn schema_from_fields(fields: &[JsonValue]) -> Option<Schema> {
    if fields.is_empty() {
        return None;
    }

    let schema = fields
        .iter()
        .filter(|field| !flag(field, "Hidden") && !flag(field, "ReadOnlyField"))
        .filter_map(|field| {
            let title = field.get("Title")?.as_str()?;
            let type_as_string = field.get("TypeAsString").and_then(Value::as_str)?;
            column_type_for(type_as_string).map(|column_type| Column::new(title, column_type))
        })
        .collect();
    Some(schema)
}

fn flag(field: &JsonValue, key: &str) -> bool {
    field.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Entity type name SharePoint assigns to the items of a list
pub fn list_item_type(title: &str) -> String {
    let mut chars = title.chars();
    let capitalized = match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect::<String>(),
        None => String::new(),
    };
    format!("SP.Data.{capitalized}ListItem")
}

/// Internal field name of a column title
pub fn internal_field_name(title: &str) -> String {
    title.replace(' ', "_x0020_")
}

// ============================================================================
// Reading
// ============================================================================

/// One SharePoint list
#[derive(Debug, Clone)]
pub struct SharePointList {
    client: SharePointClient,
    title: String,
}

impl SharePointList {
    /// Address a list by title
    pub fn new(client: SharePointClient, title: impl Into<String>) -> Self {
        Self {
            client,
            title: title.into(),
        }
    }

    /// List title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Schema of the list's visible, writable fields
    pub async fn read_schema(&self) -> Result<Option<Schema>> {
        let fields = self.client.get_list_fields(&self.title).await?;
        Ok(schema_from_fields(&fields))
    }

    /// Read every item, projected onto `schema`, then apply the limit
    pub async fn read_rows(&self, schema: &Schema, limit: RecordsLimit) -> Result<Vec<Row>> {
        let items = self.client.get_list_items(&self.title).await?;
        info!("Read {} items from list '{}'", items.len(), self.title);

        let rows = items.iter().map(|item| match item {
            Value::Object(map) => schema.project(map),
            _ => Row::new(),
        });
        Ok(LimitedRows::new(rows, limit).collect())
    }

    /// Writer replacing the list's content with rows shaped like `schema`
    pub fn writer(&self, schema: Schema) -> SharePointListWriter {
        SharePointListWriter::new(self.client.clone(), self.title.clone(), schema)
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Buffers rows and rebuilds the list from them on close
#[derive(Debug)]
pub struct SharePointListWriter {
    client: SharePointClient,
    title: String,
    schema: Schema,
    buffer: Vec<Vec<JsonValue>>,
}

impl SharePointListWriter {
    /// Create a writer for rows matching `schema`
    pub fn new(client: SharePointClient, title: impl Into<String>, schema: Schema) -> Self {
        Self {
            client,
            title: title.into(),
            schema,
            buffer: Vec::new(),
        }
    }

    /// Declared schema of the rows
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Rows waiting for `flush`
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Queue one row, values in schema order
    pub fn push_row(&mut self, row: Vec<JsonValue>) {
        self.buffer.push(row);
    }

    /// Request body adding `row` as a list item
    pub fn item_payload(&self, row: &[JsonValue]) -> JsonValue {
        let mut item: JsonObject = self
            .schema
            .columns()
            .iter()
            .zip(row)
            .map(|(column, value)| (internal_field_name(&column.name), value.clone()))
            .collect();
        item.insert(
            "__metadata".to_string(),
            serde_json::json!({"type": list_item_type(&self.title)}),
        );
        Value::Object(item)
    }

    /// Recreate the list and upload the buffered rows
    ///
    /// The list is deleted and created again, declared columns missing from
    /// the fresh list are added as text fields, then each row is posted.
    pub async fn flush(&mut self) -> Result<u64> {
        if !self.client.delete_list(&self.title).await? {
            debug!("List '{}' did not exist", self.title);
        }
        self.client.create_list(&self.title).await?;

        let fields = self.client.get_list_fields(&self.title).await?;
        let remote = schema_from_fields(&fields).unwrap_or_default();
        for column in self.schema.columns() {
            if !remote.contains(&column.name) {
                self.client
                    .create_text_field(&self.title, &column.name)
                    .await?;
            }
        }

        let rows = std::mem::take(&mut self.buffer);
        let mut written = 0;
        for row in &rows {
            self.client
                .add_list_item(&self.title, self.item_payload(row))
                .await?;
            written += 1;
        }

        info!("Wrote {} items to list '{}'", written, self.title);
        Ok(written)
    }
}
