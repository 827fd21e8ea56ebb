//! Document library exposed as a file system
//!
//! Paths handed in are relative to the configured root folder of the
//! library and always come back in `/a/b` form.

use super::client::{split_path, SharePointClient};
use crate::error::{Error, Result};
use crate::types::JsonValue;
use bytes::Bytes;
use chrono::NaiveDateTime;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// Timestamp format of `TimeLastModified`
pub const LAST_MODIFIED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parse a SharePoint timestamp into epoch milliseconds
pub fn parse_last_modified(value: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(value, LAST_MODIFIED_FORMAT)
        .ok()
        .map(|time| time.and_utc().timestamp() * 1000)
}

/// Bring a path to `/a/b` form, `/` for the root
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

fn join_path(parent: &str, name: &str) -> String {
    normalize_path(&format!("{parent}/{name}"))
}

/// Metadata of a file or folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStat {
    /// Path relative to the root
    pub path: String,
    /// Size in bytes, 0 for folders
    pub size: u64,
    /// Last modification, epoch milliseconds
    pub last_modified: Option<i64>,
    /// Whether this is a folder
    pub is_directory: bool,
}

/// Result of browsing a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowseEntry {
    /// Path relative to the root, `None` when nothing exists there
    pub full_path: Option<String>,
    /// Whether something exists at the path
    pub exists: bool,
    /// Whether it is a folder
    pub directory: bool,
    /// Size in bytes
    pub size: u64,
    /// Last modification, epoch milliseconds
    pub last_modified: Option<i64>,
    /// Direct children of a folder
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BrowseEntry>,
}

impl BrowseEntry {
    fn missing() -> Self {
        Self {
            full_path: None,
            exists: false,
            directory: false,
            size: 0,
            last_modified: None,
            children: Vec::new(),
        }
    }
}

/// A file found while enumerating
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumeratedFile {
    /// Path relative to the root
    pub path: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification, epoch milliseconds
    pub last_modified: Option<i64>,
}

/// Name, size and modification time of a remote file or folder
#[derive(Debug, Clone, PartialEq, Eq)]
struct RemoteItem {
    name: String,
    size: u64,
    last_modified: Option<i64>,
}

impl RemoteItem {
    fn parse(value: &JsonValue) -> Option<Self> {
        let name = value.get("Name")?.as_str()?.to_string();
        let size = match value.get("Length") {
            Some(Value::String(length)) => length.parse().unwrap_or(0),
            Some(Value::Number(length)) => length.as_u64().unwrap_or(0),
            _ => 0,
        };
        let last_modified = value
            .get("TimeLastModified")
            .and_then(Value::as_str)
            .and_then(parse_last_modified);
        Some(Self {
            name,
            size,
            last_modified,
        })
    }

    fn parse_all(values: &[JsonValue]) -> Vec<Self> {
        values.iter().filter_map(Self::parse).collect()
    }

    fn find(items: &[Self], name: &str) -> Option<Self> {
        items.iter().find(|item| item.name == name).cloned()
    }
}

/// File-system view of a document library folder
#[derive(Debug, Clone)]
pub struct SharePointFs {
    client: SharePointClient,
    root: String,
}

impl SharePointFs {
    /// Root the file system at `root` inside the library
    pub fn new(client: SharePointClient, root: &str) -> Self {
        Self {
            client,
            root: normalize_path(root),
        }
    }

    /// Root folder inside the library
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Library path of a root-relative path
    pub fn full_path(&self, path: &str) -> String {
        join_path(&self.root, path)
    }

    async fn files(&self, full_path: &str) -> Result<Vec<RemoteItem>> {
        Ok(RemoteItem::parse_all(&self.client.get_files(full_path).await?))
    }

    async fn folders(&self, full_path: &str) -> Result<Vec<RemoteItem>> {
        Ok(RemoteItem::parse_all(&self.client.get_folders(full_path).await?))
    }

    /// Metadata of the item at `path`, `None` when nothing is there
    pub async fn stat(&self, path: &str) -> Result<Option<FileStat>> {
        let full_path = self.full_path(path);
        info!("stat: path={path}, full_path={full_path}");

        let directory = |last_modified: Option<i64>| FileStat {
            path: normalize_path(path),
            size: 0,
            last_modified,
            is_directory: true,
        };

        if full_path == "/" {
            return Ok(Some(directory(None)));
        }
        if !self.files(&full_path).await?.is_empty() || !self.folders(&full_path).await?.is_empty() {
            return Ok(Some(directory(None)));
        }

        let (parent, name) = split_path(&full_path);
        if let Some(folder) = RemoteItem::find(&self.folders(parent).await?, name) {
            return Ok(Some(directory(folder.last_modified)));
        }
        if let Some(file) = RemoteItem::find(&self.files(parent).await?, name) {
            return Ok(Some(FileStat {
                path: normalize_path(path),
                size: file.size,
                last_modified: file.last_modified,
                is_directory: false,
            }));
        }
        Ok(None)
    }

    /// List a folder, or describe a file
    pub async fn browse(&self, path: &str) -> Result<BrowseEntry> {
        let path = normalize_path(path);
        let full_path = self.full_path(&path);
        info!("browse: path={path}, full_path={full_path}");

        let files = self.files(&full_path).await?;
        let folders = self.folders(&full_path).await?;

        let children: Vec<BrowseEntry> = files
            .iter()
            .map(|file| (file, false))
            .chain(folders.iter().map(|folder| (folder, true)))
            .map(|(item, directory)| BrowseEntry {
                full_path: Some(join_path(&path, &item.name)),
                exists: true,
                directory,
                size: if directory { 0 } else { item.size },
                last_modified: item.last_modified,
                children: Vec::new(),
            })
            .collect();

        if !children.is_empty() || full_path == "/" {
            return Ok(BrowseEntry {
                full_path: Some(path),
                exists: true,
                directory: true,
                size: 0,
                last_modified: None,
                children,
            });
        }

        let (parent, name) = split_path(&full_path);
        if let Some(file) = RemoteItem::find(&self.files(parent).await?, name) {
            return Ok(BrowseEntry {
                full_path: Some(path),
                exists: true,
                directory: false,
                size: file.size,
                last_modified: file.last_modified,
                children: Vec::new(),
            });
        }
        if let Some(folder) = RemoteItem::find(&self.folders(parent).await?, name) {
            return Ok(BrowseEntry {
                full_path: Some(path),
                exists: true,
                directory: true,
                size: 0,
                last_modified: folder.last_modified,
                children: Vec::new(),
            });
        }
        Ok(BrowseEntry::missing())
    }

    /// Every file below `path`, subfolders first
    ///
    /// With `first_non_empty` the walk stops at the first file found.
    pub async fn enumerate(&self, path: &str, first_non_empty: bool) -> Result<Vec<EnumeratedFile>> {
        let path = normalize_path(path);
        let full_path = self.full_path(&path);
        let mut found = Vec::new();
        self.walk(path, full_path, first_non_empty, &mut found)
            .await?;
        Ok(found)
    }

    fn walk<'a>(
        &'a self,
        path: String,
        full_path: String,
        first_non_empty: bool,
        found: &'a mut Vec<EnumeratedFile>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            for folder in self.folders(&full_path).await? {
                self.walk(
                    join_path(&path, &folder.name),
                    join_path(&full_path, &folder.name),
                    first_non_empty,
                    &mut *found,
                )
                .await?;
                if first_non_empty && !found.is_empty() {
                    return Ok(());
                }
            }

            for file in self.files(&full_path).await? {
                found.push(EnumeratedFile {
                    path: join_path(&path, &file.name),
                    size: file.size,
                    last_modified: file.last_modified,
                });
                if first_non_empty {
                    return Ok(());
                }
            }
            Ok(())
        })
    }

    /// Content of the file at `path`
    pub async fn read(&self, path: &str) -> Result<Bytes> {
        let full_path = self.full_path(path);
        info!("read: full_path={full_path}");
        self.client.get_file_content(&full_path).await
    }

    /// Store `data` at `path`, replacing any existing file
    pub async fn write(&self, path: &str, data: impl Into<Bytes>) -> Result<()> {
        let full_path = self.full_path(path);
        info!("write: path={path}, full_path={full_path}");
        self.client.write_file_content(&full_path, data.into()).await
    }

    /// Delete the file or folder at `path`; returns how many items went away
    pub async fn delete_recursive(&self, path: &str) -> Result<u32> {
        let full_path = self.full_path(path);
        info!("delete_recursive: path={path}, full_path={full_path}");
        if normalize_path(path) == "/" || full_path == "/" {
            return Err(Error::Other("Cannot delete root path".to_string()));
        }

        let (parent, name) = split_path(&full_path);
        let file = RemoteItem::find(&self.files(parent).await?, name);
        let folder = RemoteItem::find(&self.folders(parent).await?, name);

        match (file, folder) {
            (Some(_), Some(_)) => Err(Error::AmbiguousPath {
                name: name.to_string(),
            }),
            (Some(_), None) => {
                self.client.delete_file(&full_path).await?;
                Ok(1)
            }
            (None, Some(_)) => {
                self.client.delete_folder(&full_path).await?;
                Ok(1)
            }
            (None, None) => Ok(0),
        }
    }

    /// Move a file; `false` when the server did not confirm
    pub async fn move_item(&self, from: &str, to: &str) -> Result<bool> {
        let from = self.full_path(from);
        let to = self.full_path(to);
        info!("move: from={from}, to={to}");
        self.client.move_file(&from, &to).await
    }
}
