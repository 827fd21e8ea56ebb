//! Metadata stripping and flattening

use super::date::convert_odata_date;
use crate::types::{JsonValue, Row};
use serde_json::Value;

/// Keys carrying protocol metadata rather than record data
pub const METADATA_KEYS: [&str; 2] = ["__metadata", "odata.type"];

/// Normalizes raw items into rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowNormalizer {
    convert_dates: bool,
}

impl RowNormalizer {
    /// Create a normalizer
    pub fn new(convert_dates: bool) -> Self {
        Self { convert_dates }
    }

    /// Resolve date conversion from dataset settings
    ///
    /// Conversion is off when the setting is absent (older configurations)
    /// or when advanced parameters are shown and it is explicitly disabled.
    pub fn from_settings(show_advanced_parameters: bool, should_convert_date: Option<bool>) -> Self {
        let convert_dates = match should_convert_date {
            None => false,
            Some(false) if show_advanced_parameters => false,
            Some(_) => true,
        };
        Self { convert_dates }
    }

    /// Whether `/Date(ms)/` strings are converted
    pub fn converts_dates(&self) -> bool {
        self.convert_dates
    }

    /// Normalize one raw item
    pub fn normalize(&self, item: JsonValue) -> Row {
        let mut row = match item {
            Value::Object(map) => map,
            other => {
                let mut row = Row::new();
                row.insert("value".to_string(), other);
                return row;
            }
        };

        for key in METADATA_KEYS {
            row.remove(key);
        }

        for value in row.values_mut() {
            match value {
                Value::Object(_) | Value::Array(_) => {
                    *value = Value::String(value.to_string());
                }
                Value::String(text) if self.convert_dates => {
                    if let Some(converted) = convert_odata_date(text) {
                        *text = converted;
                    }
                }
                _ => {}
            }
        }

        row
    }
}
