//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: config file → HTTP requests → normalized rows

use futures::StreamExt;
use odata_connectors::connector::{ODataDataset, RowSink, RowSource, SharePointListDataset};
use odata_connectors::schema::{Column, Schema};
use odata_connectors::sharepoint::{SharePointClient, SharePointFs};
use odata_connectors::{load_config, load_config_from_str, Error, RecordsLimit, Row};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::io::Write;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn collect(dataset: &dyn RowSource, limit: RecordsLimit) -> Vec<Row> {
    dataset
        .rows(limit)
        .await
        .unwrap()
        .map(|row| row.unwrap())
        .collect()
        .await
}

// ============================================================================
// OData
// ============================================================================

#[tokio::test]
async fn test_sap_cds_read_from_config_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/sap/opu/odata/sap/ZCDS_SRV"))
        .and(query_param("sap-client", "200"))
        .and(header("Authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sap/opu/odata/sap/ZCDS_SRV/ZC_Orders"))
        .and(query_param("$format", "json"))
        .and(query_param("sap-client", "200"))
        .and(query_param("$top", "2"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "d": {"results": [
                {
                    "__metadata": {"type": "ZCDS_SRV.ZC_OrdersType"},
                    "OrderID": "1",
                    "CreatedAt": "/Date(1583020800000)/",
                    "Customer": {"Name": "ACME"}
                },
                {
                    "__metadata": {"type": "ZCDS_SRV.ZC_OrdersType"},
                    "OrderID": "2",
                    "CreatedAt": "/Date(-86400000)/",
                    "Customer": null
                }
            ]}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sap/opu/odata/sap/ZCDS_SRV/ZC_Orders"))
        .and(query_param("$skip", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"d": {"results": []}})))
        .mount(&mock_server)
        .await;

    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(
        file,
        r#"
odata:
  presets:
    gateway:
      instance: {}/sap/opu/odata/sap
      version: sap
      sap_client: "200"
      auth:
        type: basic
        username: user
        password: pass
  dataset:
    preset: gateway
    service_node: ZCDS_SRV
    entity: ZC_Orders
    sap_mode: cds
    bulk_size: 2
    should_convert_date: true
    retry:
      max_attempts: 3
      delay: 0.001
"#,
        mock_server.uri()
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    let dataset = ODataDataset::connect(config.odata().unwrap()).await.unwrap();
    let rows = collect(&dataset, RecordsLimit::unlimited()).await;

    let rows: Vec<Value> = rows.into_iter().map(Value::Object).collect();
    assert_eq!(
        rows,
        vec![
            json!({
                "OrderID": "1",
                "CreatedAt": "2020-03-01T00:00:00Z",
                "Customer": "{\"Name\":\"ACME\"}"
            }),
            json!({
                "OrderID": "2",
                "CreatedAt": "1969-12-31T00:00:00Z",
                "Customer": null
            }),
        ]
    );
}

#[tokio::test]
async fn test_v4_server_side_read_with_limit_and_bearer() {
    let mock_server = MockServer::start().await;
    let next = format!("{}/odata/Products?$skiptoken=2", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/odata/Products"))
        .and(query_param("$top", "3"))
        .and(query_param("$filter", "Price gt 10"))
        .and(header("Authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@odata.context": "$metadata#Products",
            "value": [{"ID": 1}, {"ID": 2}],
            "@odata.nextLink": next
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/odata/Products"))
        .and(query_param("$skiptoken", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"ID": 3}, {"ID": 4}],
            "@odata.nextLink": "Products?$skiptoken=4"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let yaml = format!(
        r#"
odata:
  presets:
    cloud:
      instance: {}/odata
      version: v4
      auth:
        type: bearer
        token: secret-token
  dataset:
    preset: cloud
    entity: Products
    show_advanced_parameters: true
    filter: Price gt 10
"#,
        mock_server.uri()
    );
    let config = load_config_from_str(&yaml).unwrap();
    let dataset = ODataDataset::connect(config.odata().unwrap()).await.unwrap();
    let rows = collect(&dataset, RecordsLimit::new(3)).await;

    let ids: Vec<i64> = rows
        .iter()
        .filter_map(|row| row.get("ID").and_then(Value::as_i64))
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_persistent_soft_error_escalates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/svc/Products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {
                "code": "/IWBEP/CM_MGW_RT/020",
                "message": {"lang": "en", "value": "Metadata cache outdated"}
            }
        })))
        .expect(3)
        .mount(&mock_server)
        .await;

    let yaml = format!(
        r#"
odata:
  presets:
    p:
      instance: {}/svc
      retry:
        delay: 0.001
  dataset:
    preset: p
    entity: Products
"#,
        mock_server.uri()
    );
    let config = load_config_from_str(&yaml).unwrap();
    let dataset = ODataDataset::connect(config.odata().unwrap()).await.unwrap();

    let mut rows = dataset.rows(RecordsLimit::unlimited()).await.unwrap();
    let err = rows.next().await.unwrap().unwrap_err();
    match err {
        Error::RemoteService { message, attempts } => {
            assert_eq!(message, "Metadata cache outdated");
            assert_eq!(attempts, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(rows.next().await.is_none());
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/svc/Products"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let yaml = format!(
        "odata:\n  presets:\n    p:\n      instance: {}/svc\n  dataset:\n    preset: p\n    entity: Products\n",
        mock_server.uri()
    );
    let config = load_config_from_str(&yaml).unwrap();
    let dataset = ODataDataset::connect(config.odata().unwrap()).await.unwrap();

    let mut rows = dataset.rows(RecordsLimit::unlimited()).await.unwrap();
    assert!(matches!(
        rows.next().await,
        Some(Err(Error::Unauthorized { .. }))
    ));
}

// ============================================================================
// SharePoint
// ============================================================================

#[tokio::test]
async fn test_sharepoint_list_write_then_read() {
    let mock_server = MockServer::start().await;
    let list = "/sites/hr/_api/Web/lists/GetByTitle('Staff')";

    Mock::given(method("POST"))
        .and(path(list))
        .and(header("X-HTTP-Method", "DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sites/hr/_api/Web/lists"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"d": {"Title": "Staff"}})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{list}/Fields")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"d": {"results": [
            {"Title": "Title", "TypeAsString": "Text", "Hidden": false, "ReadOnlyField": false},
            {"Title": "Start Date", "TypeAsString": "DateTime", "Hidden": false, "ReadOnlyField": false}
        ]}})))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{list}/Items")))
        .and(body_string_contains("\"__metadata\":{\"type\":\"SP.Data.StaffListItem\"}"))
        .and(body_string_contains("Start_x0020_Date"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{list}/Items")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"d": {"results": [
            {"ID": 1, "Title": "Ada", "Start Date": "2020-01-01T00:00:00Z", "Modified": "x"}
        ]}})))
        .mount(&mock_server)
        .await;

    let yaml = format!(
        r#"
sharepoint:
  tenant: contoso
  site: hr
  base_url: {}
  list_title: Staff
  auth:
    type: bearer
    token: t
"#,
        mock_server.uri()
    );
    let config = load_config_from_str(&yaml).unwrap();
    let dataset = SharePointListDataset::new(config.sharepoint().unwrap()).unwrap();

    let schema = Schema::new(vec![Column::string("Title"), Column::string("Start Date")]);
    let mut writer = dataset.writer(schema);
    writer
        .write_row(vec![json!("Ada"), json!("2020-01-01")])
        .await
        .unwrap();
    writer.close().await.unwrap();

    let rows = collect(&dataset, RecordsLimit::unlimited()).await;
    assert_eq!(
        Value::Object(rows[0].clone()),
        json!({"Title": "Ada", "Start Date": "2020-01-01T00:00:00Z"})
    );
}

#[tokio::test]
async fn test_sharepoint_download() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/sites/hr/_api/Web/GetFileByServerRelativePath(decodedurl='/sites/hr/Policies/2024/handbook.pdf')/$value",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7".to_vec()))
        .mount(&mock_server)
        .await;

    let yaml = format!(
        "sharepoint:\n  tenant: contoso\n  site: hr\n  base_url: {}\n  documents_library: Policies\n  root: /2024\n",
        mock_server.uri()
    );
    let config = load_config_from_str(&yaml).unwrap();
    let sharepoint = config.sharepoint().unwrap();
    let fs = SharePointFs::new(SharePointClient::new(sharepoint.clone()).unwrap(), &sharepoint.root);

    let content = fs.read("handbook.pdf").await.unwrap();
    assert_eq!(content.as_ref(), b"%PDF-1.7");
}
