//! OData reading
//!
//! Ties the protocol profile, the retrying HTTP client, pagination, row
//! normalization and the record limit together.
//!
//! # Overview
//!
//! - `ODataClient` - Connected service root, builds request URLs and pages
//! - `EntityReader` - Pull-based read of one entity set, one row at a time
//!
//! # Example
//!
//! ```ignore
//! let client = ODataClient::connect(&connection).await?;
//! let rows = client
//!     .reader("Products")
//!     .with_limit(RecordsLimit::new(100))
//!     .collect_rows()
//!     .await?;
//! ```

mod client;
mod reader;

pub use client::ODataClient;
pub use reader::{EntityReader, ReaderState};
