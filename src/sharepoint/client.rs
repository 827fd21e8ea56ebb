//! SharePoint REST client

use crate::config::SharePointConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use crate::protocol::{ODataVersion, ProtocolProfile};
use crate::types::JsonValue;
use bytes::Bytes;
use serde_json::json;
use tracing::{debug, info};

/// Content type of the verbose JSON flavour SharePoint speaks
pub const VERBOSE_JSON: &str = "application/json;odata=verbose";

/// List template of a generic custom list
const GENERIC_LIST_TEMPLATE: u32 = 100;

/// Quote a value for use inside an OData string literal
fn literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Client for one SharePoint site
#[derive(Debug, Clone)]
pub struct SharePointClient {
    http: HttpClient,
    config: SharePointConfig,
    profile: ProtocolProfile,
}

impl SharePointClient {
    /// Create a client for the configured site
    pub fn new(config: SharePointConfig) -> Result<Self> {
        let http_config = HttpClientConfig::builder()
            .accept_invalid_certs(config.ignore_ssl_check)
            .retry(config.retry)
            .header("Accept", VERBOSE_JSON)
            .build();
        let http = HttpClient::with_auth(http_config, config.auth.clone())?;

        Ok(Self {
            http,
            config,
            profile: ProtocolProfile::for_version(ODataVersion::V2),
        })
    }

    /// Site configuration
    pub fn config(&self) -> &SharePointConfig {
        &self.config
    }

    // ========================================================================
    // URLs
    // ========================================================================

    /// Collection of the site's lists
    pub fn lists_url(&self) -> String {
        format!("{}/_api/Web/lists", self.config.site_url())
    }

    /// One list, addressed by title
    pub fn list_url(&self, title: &str) -> String {
        format!("{}/GetByTitle('{}')", self.lists_url(), literal(title))
    }

    /// Items of a list
    pub fn items_url(&self, title: &str) -> String {
        format!("{}/Items", self.list_url(title))
    }

    /// Fields of a list
    pub fn fields_url(&self, title: &str) -> String {
        format!("{}/Fields", self.list_url(title))
    }

    /// Endpoint creating a field from its XML definition
    pub fn custom_field_url(&self, title: &str) -> String {
        format!(
            "{}/_api/web/GetList(@a1)/Fields/CreateFieldAsXml?@a1='{}/Lists/{}'",
            self.config.site_url(),
            self.config.site_path(),
            literal(title)
        )
    }

    /// Server-relative path of `path` inside the document library
    ///
    /// `path` is expected in `/a/b` form, `/` being the library itself.
    pub fn library_path(&self, path: &str) -> String {
        let path = if path == "/" { "" } else { path };
        format!(
            "{}/{}{}",
            self.config.site_path(),
            self.config.documents_library,
            path
        )
    }

    /// Absolute URL of `path` inside the document library
    pub fn library_url(&self, path: &str) -> String {
        format!("{}{}", self.config.domain_url(), self.library_path(path))
    }

    fn folder_url(&self, path: &str) -> String {
        format!(
            "{}/_api/Web/GetFolderByServerRelativePath(decodedurl='{}')",
            self.config.site_url(),
            literal(&self.library_path(path))
        )
    }

    fn file_url(&self, path: &str) -> String {
        format!(
            "{}/_api/Web/GetFileByServerRelativePath(decodedurl='{}')",
            self.config.site_url(),
            literal(&self.library_path(path))
        )
    }

    // ========================================================================
    // Lists
    // ========================================================================

    /// Field definitions of a list
    pub async fn get_list_fields(&self, title: &str) -> Result<Vec<JsonValue>> {
        let body = self.http.fetch_json(&self.fields_url(title)).await?;
        Ok(self.profile.unwrap_page(&body)?.items)
    }

    /// Every item of a list, following continuation links to the end
    pub async fn get_list_items(&self, title: &str) -> Result<Vec<JsonValue>> {
        let mut items = Vec::new();
        let mut next = Some(self.items_url(title));

        while let Some(url) = next {
            let body = self.http.fetch_json(&url).await?;
            let page = self.profile.unwrap_page(&body)?;
            debug!("Fetched {} items of list '{}'", page.len(), title);
            next = page.next_link.filter(|_| !page.items.is_empty());
            items.extend(page.items);
        }

        Ok(items)
    }

    /// Create a generic list
    pub async fn create_list(&self, title: &str) -> Result<()> {
        info!("Creating list '{title}'");
        let body = json!({
            "__metadata": {"type": "SP.List"},
            "AllowContentTypes": true,
            "BaseTemplate": GENERIC_LIST_TEMPLATE,
            "ContentTypesEnabled": true,
            "Title": title
        });
        self.post_verbose(&self.lists_url(), body).await
    }

    /// Delete a list; `Ok(false)` when there was none
    pub async fn delete_list(&self, title: &str) -> Result<bool> {
        let request = RequestConfig::new()
            .header("X-HTTP-Method", "DELETE")
            .header("IF-MATCH", "*");
        match self.http.post(&self.list_url(title), request).await {
            Ok(_) => {
                info!("Deleted list '{title}'");
                Ok(true)
            }
            Err(Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Add a single-line text field to a list
    pub async fn create_text_field(&self, list_title: &str, field_title: &str) -> Result<()> {
        info!("Creating field '{field_title}' in list '{list_title}'");
        let schema_xml = format!(
            "<Field DisplayName='{0}' Format='Dropdown' MaxLength='255' Name='{0}' Title='{0}' Type='Text'></Field>",
            field_title
        );
        let body = json!({
            "parameters": {
                "__metadata": {"type": "SP.XmlSchemaFieldCreationInformation"},
                "SchemaXml": schema_xml
            }
        });
        self.post_verbose(&self.custom_field_url(list_title), body)
            .await
    }

    /// Add one item to a list
    pub async fn add_list_item(&self, title: &str, item: JsonValue) -> Result<()> {
        self.post_verbose(&self.items_url(title), item).await
    }

    // ========================================================================
    // Document library
    // ========================================================================

    /// Files directly inside a folder, empty when the folder does not exist
    pub async fn get_files(&self, path: &str) -> Result<Vec<JsonValue>> {
        self.folder_children(path, "Files").await
    }

    /// Folders directly inside a folder, empty when the folder does not exist
    pub async fn get_folders(&self, path: &str) -> Result<Vec<JsonValue>> {
        self.folder_children(path, "Folders").await
    }

    /// Raw content of a file
    pub async fn get_file_content(&self, path: &str) -> Result<Bytes> {
        self.http
            .get_bytes(&format!("{}/$value", self.file_url(path)))
            .await
    }

    /// Upload a file, replacing any existing one
    pub async fn write_file_content(&self, path: &str, data: Bytes) -> Result<()> {
        let (parent, name) = split_path(path);
        let url = format!(
            "{}/Files/add(url='{}',overwrite=true)",
            self.folder_url(parent),
            literal(name)
        );
        debug!("Uploading {} bytes to {path}", data.len());
        self.http.post(&url, RequestConfig::new().bytes(data)).await?;
        Ok(())
    }

    /// Delete a file
    pub async fn delete_file(&self, path: &str) -> Result<()> {
        let url = format!(
            "{}/_api/web/GetFileByServerRelativeUrl('{}')",
            self.config.site_url(),
            literal(&self.library_path(path))
        );
        self.delete_by_post(&url).await
    }

    /// Delete a folder and its content
    pub async fn delete_folder(&self, path: &str) -> Result<()> {
        let url = format!(
            "{}/_api/web/GetFolderByServerRelativeUrl('{}')",
            self.config.site_url(),
            literal(&self.library_path(path))
        );
        self.delete_by_post(&url).await
    }

    /// Move a file, overwriting the target; `true` when the server confirms
    pub async fn move_file(&self, from: &str, to: &str) -> Result<bool> {
        let url = format!(
            "{}/_api/SP.MoveCopyUtil.MoveFileByPath(overwrite=@a1)?@a1=true",
            self.config.site_url()
        );
        let body = json!({
            "srcPath": {
                "__metadata": {"type": "SP.ResourcePath"},
                "DecodedUrl": self.library_url(from)
            },
            "destPath": {
                "__metadata": {"type": "SP.ResourcePath"},
                "DecodedUrl": self.library_url(to)
            }
        });
        let request = RequestConfig::new()
            .header("Content-Type", VERBOSE_JSON)
            .json(body);
        let response = self.http.post(&url, request).await?;
        Ok(response.is_some_and(|body| body.get("d").is_some()))
    }

    async fn folder_children(&self, path: &str, kind: &str) -> Result<Vec<JsonValue>> {
        let url = format!("{}/{kind}", self.folder_url(path));
        match self.http.probe_json(&url).await? {
            Some(body) => Ok(self.profile.unwrap_page(&body)?.items),
            None => Ok(Vec::new()),
        }
    }

    async fn post_verbose(&self, url: &str, body: JsonValue) -> Result<()> {
        let request = RequestConfig::new()
            .header("Content-Type", VERBOSE_JSON)
            .json(body);
        self.http.post(url, request).await?;
        Ok(())
    }

    async fn delete_by_post(&self, url: &str) -> Result<()> {
        let request = RequestConfig::new()
            .header("X-HTTP-Method", "DELETE")
            .header("IF-MATCH", "*");
        self.http.post(url, request).await?;
        Ok(())
    }
}

/// Split `/a/b/c` into `/a/b` and `c`
pub(crate) fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(index) => (&path[..index], &path[index + 1..]),
        None => ("/", path),
    }
}
