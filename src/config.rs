//! Configuration types for connector definitions
//!
//! A configuration file (YAML or JSON) holds an optional `odata` section and
//! an optional `sharepoint` section. OData credentials live in named presets
//! so several datasets can share one login; a dataset selects its preset by
//! name and resolving an unknown name fails before any request is made.

use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::http::RetryPolicy;
use crate::normalize::RowNormalizer;
use crate::pagination::PaginationMode;
use crate::protocol::ODataVersion;
use crate::types::{join_url, OptionStringExt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

/// Entity selector value asking for the manually entered entity name
pub const MANUAL_SELECT: &str = "__manual__";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete connector configuration loaded from a file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// OData dataset settings
    #[serde(default)]
    pub odata: Option<ODataConfig>,

    /// SharePoint settings
    #[serde(default)]
    pub sharepoint: Option<SharePointConfig>,
}

impl ConnectorConfig {
    /// The OData section, required by OData commands
    pub fn odata(&self) -> Result<&ODataConfig> {
        self.odata.as_ref().ok_or_else(|| Error::missing_field("odata"))
    }

    /// The SharePoint section, required by SharePoint commands
    pub fn sharepoint(&self) -> Result<&SharePointConfig> {
        self.sharepoint
            .as_ref()
            .ok_or_else(|| Error::missing_field("sharepoint"))
    }
}

/// Load a configuration file, YAML or JSON depending on its extension
pub fn load_config(path: impl AsRef<Path>) -> Result<ConnectorConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        Ok(serde_json::from_str(&content)?)
    } else {
        load_config_from_str(&content)
    }
}

/// Parse a configuration from YAML (JSON documents are accepted too)
pub fn load_config_from_str(content: &str) -> Result<ConnectorConfig> {
    Ok(serde_yaml::from_str(content)?)
}

// ============================================================================
// OData
// ============================================================================

/// OData presets plus the dataset being read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ODataConfig {
    /// Stored credentials and endpoints, by name
    #[serde(default)]
    pub presets: HashMap<String, ODataPreset>,

    /// Dataset settings
    pub dataset: ODataDatasetConfig,
}

impl ODataConfig {
    /// Resolve the dataset's preset into connection settings
    pub fn resolve(&self) -> Result<ODataConnection> {
        let preset = self
            .presets
            .get(&self.dataset.preset)
            .ok_or_else(|| Error::PresetNotFound {
                name: self.dataset.preset.clone(),
            })?;

        if preset.version == ODataVersion::Sap && preset.sap_client.is_none() {
            return Err(Error::missing_field("sap_client"));
        }

        let instance = preset.instance.trim_matches('/');
        if instance.is_empty() {
            return Err(Error::missing_field("instance"));
        }

        Ok(ODataConnection {
            instance: join_url(instance, &self.dataset.service_node),
            version: preset.version,
            auth: preset.auth.clone(),
            ignore_ssl_check: preset.ignore_ssl_check,
            sap_client: preset.sap_client.clone(),
            retry: self.dataset.retry.unwrap_or(preset.retry),
            timeout: Duration::from_secs(preset.timeout_secs),
        })
    }

    /// Service nodes offered by the dataset's preset, label by node
    pub fn service_nodes(&self) -> Result<&BTreeMap<String, String>> {
        self.presets
            .get(&self.dataset.preset)
            .map(|preset| &preset.service_names)
            .ok_or_else(|| Error::PresetNotFound {
                name: self.dataset.preset.clone(),
            })
    }
}

/// Stored login for an OData service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ODataPreset {
    /// Service root, e.g. `https://host/sap/opu/odata/sap`
    pub instance: String,

    /// Protocol version spoken by the service
    #[serde(default)]
    pub version: ODataVersion,

    /// Credentials
    #[serde(default)]
    pub auth: AuthConfig,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub ignore_ssl_check: bool,

    /// SAP client number, required for the SAP dialect
    #[serde(default)]
    pub sap_client: Option<String>,

    /// Known service nodes below the instance
    #[serde(default)]
    pub service_names: BTreeMap<String, String>,

    /// Retry policy for transient remote errors
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// SAP pagination dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SapMode {
    /// Regular gateway services, server-driven paging
    #[default]
    Standard,
    /// CDS views, which need client-side `$skip` paging
    Cds,
}

/// Settings of one OData dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ODataDatasetConfig {
    /// Name of the preset to connect with
    pub preset: String,

    /// Service node appended to the instance
    #[serde(default)]
    pub service_node: String,

    /// Entity set to read, or `__manual__`
    #[serde(default)]
    pub entity: String,

    /// Entity set typed by hand when `entity` is `__manual__`
    #[serde(default)]
    pub entity_manual: Option<String>,

    /// Page size for client-side paging, 0 for the server default
    #[serde(default = "default_bulk_size")]
    pub bulk_size: u64,

    /// Pagination dialect
    #[serde(default)]
    pub sap_mode: SapMode,

    /// Whether the advanced settings below are in effect
    #[serde(default)]
    pub show_advanced_parameters: bool,

    /// `$filter` expression (advanced)
    #[serde(default)]
    pub filter: Option<String>,

    /// Convert `/Date(ms)/` strings; absent in older configurations
    #[serde(default)]
    pub should_convert_date: Option<bool>,

    /// Retry policy overriding the preset's
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
}

fn default_bulk_size() -> u64 {
    1000
}

impl ODataDatasetConfig {
    /// Entity set the dataset reads
    pub fn entity_name(&self) -> &str {
        if self.entity == MANUAL_SELECT {
            self.entity_manual.as_deref().unwrap_or_default()
        } else {
            &self.entity
        }
    }

    /// `$filter` expression, only honoured with advanced parameters shown
    pub fn filter(&self) -> Option<String> {
        if !self.show_advanced_parameters {
            return None;
        }
        self.filter.clone().none_if_empty()
    }

    /// Row normalizer matching the date settings
    pub fn normalizer(&self) -> RowNormalizer {
        RowNormalizer::from_settings(self.show_advanced_parameters, self.should_convert_date)
    }

    /// Pagination mode implied by the SAP dialect
    pub fn pagination_mode(&self) -> PaginationMode {
        match self.sap_mode {
            SapMode::Standard => PaginationMode::ServerSide,
            SapMode::Cds => PaginationMode::ClientSide,
        }
    }
}

/// Everything needed to open a client, resolved from a preset
#[derive(Debug, Clone, PartialEq)]
pub struct ODataConnection {
    /// Service root including the service node
    pub instance: String,
    /// Protocol version
    pub version: ODataVersion,
    /// Credentials
    pub auth: AuthConfig,
    /// Skip TLS certificate verification
    pub ignore_ssl_check: bool,
    /// SAP client number
    pub sap_client: Option<String>,
    /// Retry policy
    pub retry: RetryPolicy,
    /// Request timeout
    pub timeout: Duration,
}

impl ODataConnection {
    /// Connection to `instance` with defaults for everything else
    pub fn new(instance: impl Into<String>, version: ODataVersion) -> Self {
        Self {
            instance: instance.into().trim_end_matches('/').to_string(),
            version,
            auth: AuthConfig::None,
            ignore_ssl_check: false,
            sap_client: None,
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(default_timeout_secs()),
        }
    }
}

// ============================================================================
// SharePoint
// ============================================================================

/// SharePoint site settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharePointConfig {
    /// Tenant, as in `<tenant>.sharepoint.com`
    pub tenant: String,

    /// Site name, as in `/sites/<site>`
    pub site: String,

    /// Override of `https://<tenant>.sharepoint.com`
    #[serde(default)]
    pub base_url: Option<String>,

    /// Credentials
    #[serde(default)]
    pub auth: AuthConfig,

    /// List read or written by list commands
    #[serde(default)]
    pub list_title: Option<String>,

    /// Folder of the document library used as file-system root
    #[serde(default)]
    pub root: String,

    /// Document library holding the files
    #[serde(default = "default_documents_library")]
    pub documents_library: String,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub ignore_ssl_check: bool,

    /// Retry policy for transient remote errors
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_documents_library() -> String {
    "Shared Documents".to_string()
}

impl SharePointConfig {
    /// Create a config for a tenant and site
    pub fn new(tenant: impl Into<String>, site: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            site: site.into(),
            base_url: None,
            auth: AuthConfig::None,
            list_title: None,
            root: String::new(),
            documents_library: default_documents_library(),
            ignore_ssl_check: false,
            retry: RetryPolicy::default(),
        }
    }

    /// Scheme and host of the tenant
    pub fn domain_url(&self) -> String {
        match &self.base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}.sharepoint.com", self.tenant),
        }
    }

    /// Server-relative path of the site
    pub fn site_path(&self) -> String {
        format!("/sites/{}", self.site)
    }

    /// Absolute URL of the site
    pub fn site_url(&self) -> String {
        format!("{}{}", self.domain_url(), self.site_path())
    }

    /// The configured list title
    pub fn list_title(&self) -> Result<&str> {
        self.list_title
            .as_deref()
            .filter(|title| !title.is_empty())
            .ok_or_else(|| Error::missing_field("sharepoint.list_title"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const YAML: &str = r#"
odata:
  presets:
    prod:
      instance: https://gateway.example.com/sap/opu/odata/sap/
      version: sap
      sap_client: "100"
      auth:
        type: basic
        username: user
        password: secret
      service_names:
        ZPRODUCTS_SRV: Products
  dataset:
    preset: prod
    service_node: /ZPRODUCTS_SRV/
    entity: Products
    sap_mode: cds
    bulk_size: 500
    show_advanced_parameters: true
    filter: "Price gt 10"
    should_convert_date: true
sharepoint:
  tenant: contoso
  site: finance
  list_title: Budget
"#;

    #[test]
    fn test_load_yaml_and_resolve() {
        let config = load_config_from_str(YAML).unwrap();
        let odata = config.odata().unwrap();
        let connection = odata.resolve().unwrap();

        assert_eq!(
            connection.instance,
            "https://gateway.example.com/sap/opu/odata/sap/ZPRODUCTS_SRV"
        );
        assert_eq!(connection.version, ODataVersion::Sap);
        assert_eq!(connection.auth, AuthConfig::basic("user", "secret"));
        assert_eq!(connection.sap_client.as_deref(), Some("100"));
        assert_eq!(connection.retry, RetryPolicy::default());

        let dataset = &odata.dataset;
        assert_eq!(dataset.entity_name(), "Products");
        assert_eq!(dataset.filter().as_deref(), Some("Price gt 10"));
        assert_eq!(dataset.pagination_mode(), PaginationMode::ClientSide);
        assert!(dataset.normalizer().converts_dates());
        assert_eq!(
            odata.service_nodes().unwrap().get("ZPRODUCTS_SRV"),
            Some(&"Products".to_string())
        );
    }

    #[test]
    fn test_dataset_retry_overrides_preset() {
        let mut config = load_config_from_str(YAML).unwrap();
        let odata = config.odata.as_mut().unwrap();
        odata.dataset.retry = Some(RetryPolicy::new(5, Duration::from_secs(1)));

        let connection = odata.resolve().unwrap();
        assert_eq!(connection.retry.max_attempts, 5);
        assert_eq!(connection.retry.delay, Duration::from_secs(1));
    }

    #[test]
    fn test_unknown_preset_is_fatal() {
        let mut config = load_config_from_str(YAML).unwrap();
        let odata = config.odata.as_mut().unwrap();
        odata.dataset.preset = "staging".to_string();

        let err = odata.resolve().unwrap_err();
        assert!(matches!(err, Error::PresetNotFound { name } if name == "staging"));
    }

    #[test]
    fn test_sap_requires_client() {
        let mut config = load_config_from_str(YAML).unwrap();
        let odata = config.odata.as_mut().unwrap();
        odata.presets.get_mut("prod").unwrap().sap_client = None;

        assert!(matches!(
            odata.resolve().unwrap_err(),
            Error::MissingConfigField { .. }
        ));
    }

    #[test]
    fn test_dataset_defaults() {
        let dataset: ODataDatasetConfig =
            serde_json::from_str(r#"{"preset": "p", "entity": "__manual__", "entity_manual": "Orders", "filter": "x"}"#)
                .unwrap();

        assert_eq!(dataset.entity_name(), "Orders");
        assert_eq!(dataset.bulk_size, 1000);
        assert_eq!(dataset.sap_mode, SapMode::Standard);
        assert_eq!(dataset.pagination_mode(), PaginationMode::ServerSide);
        // filter is an advanced setting
        assert_eq!(dataset.filter(), None);
        // legacy configurations keep raw dates
        assert!(!dataset.normalizer().converts_dates());
    }

    #[test]
    fn test_sharepoint_urls() {
        let config = load_config_from_str(YAML).unwrap();
        let sharepoint = config.sharepoint().unwrap();

        assert_eq!(
            sharepoint.site_url(),
            "https://contoso.sharepoint.com/sites/finance"
        );
        assert_eq!(sharepoint.documents_library, "Shared Documents");
        assert_eq!(sharepoint.list_title().unwrap(), "Budget");

        let mut local = SharePointConfig::new("contoso", "finance");
        local.base_url = Some("http://127.0.0.1:8080/".to_string());
        assert_eq!(local.site_url(), "http://127.0.0.1:8080/sites/finance");
        assert!(local.list_title().is_err());
    }

    #[test]
    fn test_load_config_file_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"sharepoint": {{"tenant": "contoso", "site": "hr", "auth": {{"type": "bearer", "token": "t"}}}}}}"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert!(config.odata.is_none());
        assert_eq!(config.sharepoint().unwrap().auth, AuthConfig::bearer("t"));
        assert!(config.odata().is_err());
    }
}
