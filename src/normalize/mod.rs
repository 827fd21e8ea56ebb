//! Row normalization
//!
//! Turns one raw remote item into a `Row` a tabular consumer can take:
//! protocol metadata is dropped, nested JSON is flattened to text and, when
//! enabled, `/Date(ms)/` strings become ISO-8601 timestamps.

mod cleaner;
mod date;

pub use cleaner::{RowNormalizer, METADATA_KEYS};
pub use date::{convert_odata_date, DATE_FORMAT};
