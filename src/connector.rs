//! Row source and sink traits
//!
//! Defines the capability interfaces a host drives, and their OData and
//! SharePoint implementations.

use crate::config::{ODataConfig, ODataDatasetConfig, SharePointConfig};
use crate::error::Result;
use crate::limit::RecordsLimit;
use crate::odata::{EntityReader, ODataClient};
use crate::pagination::paginator_for;
use crate::schema::Schema;
use crate::sharepoint::{SharePointClient, SharePointList, SharePointListWriter};
use crate::types::{JsonValue, Row};
use async_trait::async_trait;
use futures::Stream;
use std::collections::BTreeMap;
use std::pin::Pin;
use tracing::info;

// ============================================================================
// Traits
// ============================================================================

/// Type alias for the row stream returned by `RowSource::rows`
pub type RowStream = Pin<Box<dyn Stream<Item = Result<Row>> + Send>>;

/// A dataset rows can be read from
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Schema of the rows, `None` when it is only known from the rows
    async fn read_schema(&self) -> Result<Option<Schema>>;

    /// Rows of the dataset, at most as many as `limit` allows
    async fn rows(&self, limit: RecordsLimit) -> Result<RowStream>;
}

/// A dataset rows can be written to
#[async_trait]
pub trait RowSink: Send {
    /// Write one row, values in the order of the declared schema
    async fn write_row(&mut self, row: Vec<JsonValue>) -> Result<()>;

    /// Finish writing
    async fn close(&mut self) -> Result<()>;
}

// ============================================================================
// OData
// ============================================================================

/// An OData entity set configured as a dataset
#[derive(Debug, Clone)]
pub struct ODataDataset {
    client: ODataClient,
    settings: ODataDatasetConfig,
    service_nodes: BTreeMap<String, String>,
}

impl ODataDataset {
    /// Resolve the preset and connect
    pub async fn connect(config: &ODataConfig) -> Result<Self> {
        let connection = config.resolve()?;
        let client = ODataClient::connect(&connection).await?;
        info!(
            "Connected to {} ({}), entity '{}'",
            client.instance(),
            connection.version,
            config.dataset.entity_name()
        );

        Ok(Self {
            client,
            settings: config.dataset.clone(),
            service_nodes: config.service_nodes()?.clone(),
        })
    }

    /// Connected client
    pub fn client(&self) -> &ODataClient {
        &self.client
    }

    /// Dataset settings
    pub fn settings(&self) -> &ODataDatasetConfig {
        &self.settings
    }

    /// Reader of the configured entity set
    pub fn reader(&self, limit: RecordsLimit) -> EntityReader {
        let paginator = paginator_for(self.settings.pagination_mode(), self.settings.bulk_size);
        self.client
            .reader(self.settings.entity_name())
            .with_paginator(paginator)
            .with_normalizer(self.settings.normalizer())
            .with_filter(self.settings.filter())
            .with_limit(limit)
    }

    /// Entity sets offered by the service
    pub async fn entity_sets(&self) -> Result<Vec<String>> {
        self.client.list_entity_sets().await
    }

    /// Service nodes offered by the preset, label by node
    pub fn service_nodes(&self) -> &BTreeMap<String, String> {
        &self.service_nodes
    }
}

#[async_trait]
impl RowSource for ODataDataset {
    async fn read_schema(&self) -> Result<Option<Schema>> {
        Ok(None)
    }

    async fn rows(&self, limit: RecordsLimit) -> Result<RowStream> {
        Ok(Box::pin(self.reader(limit).into_stream()))
    }
}

// ============================================================================
// SharePoint
// ============================================================================

/// A SharePoint list configured as a dataset
#[derive(Debug, Clone)]
pub struct SharePointListDataset {
    list: SharePointList,
}

impl SharePointListDataset {
    /// Build the dataset for the configured list
    pub fn new(config: &SharePointConfig) -> Result<Self> {
        let title = config.list_title()?.to_string();
        let client = SharePointClient::new(config.clone())?;
        Ok(Self {
            list: SharePointList::new(client, title),
        })
    }

    /// The list
    pub fn list(&self) -> &SharePointList {
        &self.list
    }

    /// Writer replacing the list's content with rows shaped like `schema`
    pub fn writer(&self, schema: Schema) -> SharePointListWriter {
        self.list.writer(schema)
    }
}

#[async_trait]
impl RowSource for SharePointListDataset {
    async fn read_schema(&self) -> Result<Option<Schema>> {
        self.list.read_schema().await
    }

    async fn rows(&self, limit: RecordsLimit) -> Result<RowStream> {
        let schema = self.list.read_schema().await?.unwrap_or_default();
        let rows = self.list.read_rows(&schema, limit).await?;
        Ok(Box::pin(futures::stream::iter(rows.into_iter().map(Ok))))
    }
}

#[async_trait]
impl RowSink for SharePointListWriter {
    async fn write_row(&mut self, row: Vec<JsonValue>) -> Result<()> {
        self.push_row(row);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;
    use crate::schema::Column;
    use futures::StreamExt;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn odata_config(server: &MockServer, extra: &str) -> ODataConfig {
        let yaml = format!(
            r#"
odata:
  presets:
    local:
      instance: {}/sap/opu/odata/sap
      version: v2
      service_names:
        ZSRV: Demo service
  dataset:
    preset: local
    service_node: ZSRV
    entity: Products
{extra}
"#,
            server.uri()
        );
        load_config_from_str(&yaml).unwrap().odata.unwrap()
    }

    #[tokio::test]
    async fn test_odata_dataset_cds_mode() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/sap/opu/odata/sap/ZSRV/Products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "d": {"results": [{"ID": 1}, {"ID": 2}]}
            })))
            .mount(&server)
            .await;

        let config = odata_config(&server, "    sap_mode: cds\n    bulk_size: 2");
        let dataset = ODataDataset::connect(&config).await.unwrap();

        assert_eq!(dataset.read_schema().await.unwrap(), None);
        assert_eq!(
            dataset.service_nodes().get("ZSRV").map(String::as_str),
            Some("Demo service")
        );

        let rows: Vec<_> = dataset
            .rows(RecordsLimit::new(3))
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(Result::is_ok));

        let requests = server.received_requests().await.unwrap_or_default();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].url.query_pairs().any(|(k, v)| k == "$top" && v == "1"));
    }

    #[tokio::test]
    async fn test_odata_dataset_unknown_preset() {
        let server = MockServer::start().await;
        let mut config = odata_config(&server, "");
        config.dataset.preset = "missing".to_string();

        let err = ODataDataset::connect(&config).await.unwrap_err();
        assert!(matches!(err, crate::error::Error::PresetNotFound { .. }));
    }

    #[tokio::test]
    async fn test_sharepoint_list_dataset_rows() {
        let server = MockServer::start().await;
        let list = "/sites/finance/_api/Web/lists/GetByTitle('Budget')";

        Mock::given(method("GET"))
            .and(path(format!("{list}/Fields")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"d": {"results": [
                {"Title": "Title", "TypeAsString": "Text", "Hidden": false, "ReadOnlyField": false}
            ]}})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{list}/Items")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"d": {"results": [
                {"ID": 1, "Title": "Rent"},
                {"ID": 2, "Title": "Food"}
            ]}})))
            .mount(&server)
            .await;

        let mut config = SharePointConfig::new("contoso", "finance");
        config.base_url = Some(server.uri());
        config.list_title = Some("Budget".to_string());
        let dataset = SharePointListDataset::new(&config).unwrap();

        let schema = dataset.read_schema().await.unwrap().unwrap();
        assert_eq!(schema.columns(), &[Column::string("Title")]);

        let rows: Vec<Row> = dataset
            .rows(RecordsLimit::unlimited())
            .await
            .unwrap()
            .map(|row| row.unwrap())
            .collect()
            .await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("Title"), Some(&json!("Food")));
        assert!(rows[1].get("ID").is_none());
    }

    #[test]
    fn test_sharepoint_list_dataset_requires_title() {
        let config = SharePointConfig::new("contoso", "finance");
        assert!(SharePointListDataset::new(&config).is_err());
    }
}
