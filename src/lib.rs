// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # OData Connectors
//!
//! Paginated, retrying readers for SAP OData services and SharePoint lists,
//! plus a file-system view of SharePoint document libraries.
//!
//! ## Features
//!
//! - **Protocol Profiles**: OData v2, v3, v4 and the SAP gateway dialect
//! - **Pagination**: Server continuation links or client-side `$skip` offsets
//! - **Soft-Error Retries**: Fixed-interval retries of transient remote errors
//! - **Row Normalization**: Metadata stripping, JSON flattening, `/Date(ms)/` conversion
//! - **Record Limits**: Reads stop exactly at the requested row count
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use odata_connectors::{load_config, ODataDataset, RecordsLimit, RowSource, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = load_config("connector.yaml")?;
//!     let dataset = ODataDataset::connect(config.odata()?).await?;
//!
//!     let mut rows = dataset.rows(RecordsLimit::new(100)).await?;
//!     while let Some(row) = rows.next().await {
//!         println!("{}", serde_json::to_string(&row?)?);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │              RowSource / RowSink (connector)                 │
//! │   ODataDataset   SharePointListDataset   SharePointListWriter│
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌───────────┬───────────┬─────┴───────┬────────────┬───────────┐
//! │ Protocol  │   HTTP    │  Paginate   │ Normalize  │   Limit   │
//! ├───────────┼───────────┼─────────────┼────────────┼───────────┤
//! │ v2 / SAP  │ Auth      │ Next link   │ Metadata   │ Row count │
//! │ v3 / v4   │ Retry     │ $skip/$top  │ Dates      │           │
//! └───────────┴───────────┴─────────────┴────────────┴───────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the connectors
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication schemes
pub mod auth;

/// HTTP client with soft-error retries
pub mod http;

/// OData protocol profiles
pub mod protocol;

/// Pagination strategies
pub mod pagination;

/// Row normalization
pub mod normalize;

/// Record-limit governor
pub mod limit;

/// OData client and entity reader
pub mod odata;

/// Dataset schemas
pub mod schema;

/// SharePoint lists and document libraries
pub mod sharepoint;

/// Configuration files
pub mod config;

/// Row source and sink traits
pub mod connector;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{load_config, load_config_from_str, ConnectorConfig};
pub use connector::{ODataDataset, RowSink, RowSource, RowStream, SharePointListDataset};
pub use limit::RecordsLimit;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
