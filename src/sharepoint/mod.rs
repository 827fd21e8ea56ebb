//! SharePoint lists and document libraries
//!
//! # Overview
//!
//! - `SharePointClient` - REST endpoints of one site, verbose JSON flavour
//! - `SharePointList` - Schema and eager reads of a list
//! - `SharePointListWriter` - Replaces a list's content with buffered rows
//! - `SharePointFs` - File-system view of a document library folder

mod client;
mod fs;
mod list;

pub use client::{SharePointClient, VERBOSE_JSON};
pub use fs::{
    normalize_path, parse_last_modified, BrowseEntry, EnumeratedFile, FileStat, SharePointFs,
    LAST_MODIFIED_FORMAT,
};
pub use list::{
    column_type_for, internal_field_name, list_item_type, schema_from_fields, SharePointList,
    SharePointListWriter,
};
