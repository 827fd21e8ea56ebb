//! Connected OData service root

use super::reader::EntityReader;
use crate::config::ODataConnection;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig};
use crate::pagination::PageRequest;
use crate::protocol::{ODataVersion, Page, ProtocolProfile};
use crate::types::join_url;
use tracing::{debug, info, warn};
use url::{form_urlencoded, Url};

/// Query parameter carrying the SAP client number
pub const SAP_CLIENT_PARAM: &str = "sap-client";

/// Client bound to one OData service root
#[derive(Debug, Clone)]
pub struct ODataClient {
    http: HttpClient,
    instance: String,
    profile: ProtocolProfile,
    sap_client: Option<String>,
}

/// Percent-encode a query value, spaces as `%20`
fn encode_query_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

impl ODataClient {
    /// Build a client for a resolved connection
    ///
    /// The SAP dialect requires a client number. It is sent with the
    /// session HEAD and with every URL built here, while continuation links
    /// are left as the server wrote them. Only auth and transport failures
    /// of the HEAD are fatal.
    pub async fn connect(connection: &ODataConnection) -> Result<Self> {
        let profile = ProtocolProfile::for_version(connection.version);

        let mut builder = HttpClientConfig::builder()
            .timeout(connection.timeout)
            .accept_invalid_certs(connection.ignore_ssl_check)
            .retry(connection.retry);
        if let Some(accept) = profile.accept_header() {
            builder = builder.header("Accept", accept);
        }

        let http = HttpClient::with_auth(builder.build(), connection.auth.clone())?;
        let client = Self {
            http,
            instance: connection.instance.trim_end_matches('/').to_string(),
            profile,
            sap_client: connection.sap_client.clone(),
        };

        if connection.version == ODataVersion::Sap {
            let Some(sap_client) = &client.sap_client else {
                return Err(Error::missing_field("sap_client"));
            };
            let url = format!(
                "{}?{SAP_CLIENT_PARAM}={}",
                client.instance,
                encode_query_value(sap_client)
            );
            info!("Opening SAP session on {}", client.instance);
            match client.http.head(&url).await {
                Ok(_) => {}
                Err(e @ (Error::Unauthorized { .. } | Error::Forbidden { .. } | Error::Http(_))) => {
                    return Err(e);
                }
                Err(e) => {
                    warn!("SAP session request on {} failed, continuing: {e}", client.instance);
                }
            }
        }

        Ok(client)
    }

    /// Service root this client reads from
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Protocol profile in use
    pub fn profile(&self) -> &ProtocolProfile {
        &self.profile
    }

    /// Underlying HTTP client
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Start a read of `entity` with default settings
    pub fn reader(&self, entity: impl Into<String>) -> EntityReader {
        EntityReader::new(self.clone(), entity)
    }

    /// Build the URL of a query against `entity`
    ///
    /// `$top` is dropped for the empty entity, which addresses the service
    /// document rather than a collection. The filter is percent-encoded.
    pub fn entity_url(
        &self,
        entity: &str,
        top: Option<u64>,
        skip: Option<u64>,
        filter: Option<&str>,
    ) -> String {
        let mut options = self.profile.base_query_options();
        if let Some(top) = top.filter(|_| !entity.is_empty()) {
            options.push(format!("$top={top}"));
        }
        if let Some(skip) = skip {
            options.push(format!("$skip={skip}"));
        }
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            options.push(format!("$filter={}", encode_query_value(filter)));
        }
        if let Some(sap_client) = &self.sap_client {
            options.push(format!("{SAP_CLIENT_PARAM}={}", encode_query_value(sap_client)));
        }

        let base = join_url(&self.instance, entity);
        if options.is_empty() {
            base
        } else {
            format!("{base}?{}", options.join("&"))
        }
    }

    /// Fetch and unwrap one page
    ///
    /// With `probe` set, a missing resource yields `Ok(None)` instead of an
    /// error. Readers probe every page after the first so a stale
    /// continuation link ends the read rather than failing it.
    pub async fn get_page(
        &self,
        request: &PageRequest,
        entity: &str,
        filter: Option<&str>,
        probe: bool,
    ) -> Result<Option<Page>> {
        let url = match request {
            PageRequest::Query { top, skip } => self.entity_url(entity, *top, *skip, filter),
            PageRequest::Url(link) => self.resolve_link(link)?,
        };
        debug!("Fetching page {url}");

        let body = if probe {
            match self.http.probe_json(&url).await? {
                Some(body) => body,
                None => return Ok(None),
            }
        } else {
            self.http.fetch_json(&url).await?
        };

        self.profile.unwrap_page(&body).map(Some)
    }

    /// Names of the entity sets the service exposes
    pub async fn list_entity_sets(&self) -> Result<Vec<String>> {
        let url = self.entity_url("", None, None, None);
        let body = self.http.fetch_json(&url).await?;
        self.profile.entity_set_names(&body)
    }

    /// Absolute form of a continuation link
    ///
    /// Absolute links are used verbatim. Relative ones are taken relative to
    /// the service root.
    fn resolve_link(&self, link: &str) -> Result<String> {
        if Url::parse(link).is_ok() {
            return Ok(link.to_string());
        }
        let root = Url::parse(&format!("{}/", self.instance))?;
        Ok(root.join(link)?.to_string())
    }
}
