//! Profile table and page unwrapping

use crate::error::{Error, Result};
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Accept header sent when a version needs explicit JSON negotiation
pub const APPLICATION_JSON: &str = "application/json";

/// Query option asking the service for a JSON payload
pub const JSON_FORMAT: &str = "$format=json";

const RESULTS_KEY: &str = "results";
const ENTITY_SETS_KEY: &str = "EntitySets";

/// Configured OData protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ODataVersion {
    /// OData v2 (verbose JSON)
    #[default]
    V2,
    /// OData v3 (JSON light)
    V3,
    /// OData v4
    V4,
    /// SAP gateway flavour of v2
    #[serde(alias = "vsap", alias = "vSAP")]
    Sap,
}

impl std::fmt::Display for ODataVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ODataVersion::V2 => write!(f, "v2"),
            ODataVersion::V3 => write!(f, "v3"),
            ODataVersion::V4 => write!(f, "v4"),
            ODataVersion::Sap => write!(f, "sap"),
        }
    }
}

/// Version-specific request and response conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolProfile {
    /// Version this profile was built for
    pub version: ODataVersion,
    /// Send an explicit JSON `Accept` header
    pub force_json: bool,
    /// Also ask for JSON through `$format=json`
    pub json_in_query_string: bool,
    /// Top-level key holding the page payload
    pub data_container_key: &'static str,
    /// Path to the continuation link inside a page
    pub next_link_path: &'static [&'static str],
}

impl ProtocolProfile {
    /// Select the profile for a version
    pub const fn for_version(version: ODataVersion) -> Self {
        match version {
            ODataVersion::V2 => Self {
                version,
                force_json: true,
                json_in_query_string: false,
                data_container_key: "d",
                next_link_path: &["d", "__next"],
            },
            ODataVersion::Sap => Self {
                version,
                force_json: true,
                json_in_query_string: true,
                data_container_key: "d",
                next_link_path: &["d", "__next"],
            },
            ODataVersion::V3 => Self {
                version,
                force_json: true,
                json_in_query_string: true,
                data_container_key: "value",
                next_link_path: &["odata.nextLink"],
            },
            ODataVersion::V4 => Self {
                version,
                force_json: false,
                json_in_query_string: false,
                data_container_key: "value",
                next_link_path: &["@odata.nextLink"],
            },
        }
    }

    /// Value of the `Accept` header, if this version negotiates explicitly
    pub fn accept_header(&self) -> Option<&'static str> {
        self.force_json.then_some(APPLICATION_JSON)
    }

    /// Query options every request of this version starts with
    pub fn base_query_options(&self) -> Vec<String> {
        if self.force_json && self.json_in_query_string {
            vec![JSON_FORMAT.to_string()]
        } else {
            Vec::new()
        }
    }

    /// Split a decoded response into its items and continuation link
    pub fn unwrap_page(&self, body: &JsonValue) -> Result<Page> {
        let container = body.get(self.data_container_key).ok_or_else(|| {
            Error::malformed(format!(
                "response has no '{}' container",
                self.data_container_key
            ))
        })?;

        let items = match container {
            Value::Object(map) => match map.get(RESULTS_KEY) {
                Some(Value::Array(results)) => results.clone(),
                Some(other) => {
                    return Err(Error::malformed(format!(
                        "'{RESULTS_KEY}' is not an array: {other}"
                    )))
                }
                None => vec![container.clone()],
            },
            Value::Array(items) => items.clone(),
            Value::Null => Vec::new(),
            other => {
                return Err(Error::malformed(format!(
                    "unexpected payload under '{}': {other}",
                    self.data_container_key
                )))
            }
        };

        Ok(Page {
            items,
            next_link: self.next_link(body),
        })
    }

    /// Continuation link declared by the server, if any
    pub fn next_link(&self, body: &JsonValue) -> Option<String> {
        let mut current = body;
        for key in self.next_link_path {
            current = current.get(*key)?;
        }
        current
            .as_str()
            .filter(|link| !link.is_empty())
            .map(str::to_string)
    }

    /// Entity set names listed by a service document
    pub fn entity_set_names(&self, body: &JsonValue) -> Result<Vec<String>> {
        let container = body.get(self.data_container_key).ok_or_else(|| {
            Error::malformed(format!(
                "service document has no '{}' container",
                self.data_container_key
            ))
        })?;

        if let Some(sets) = container.get(ENTITY_SETS_KEY).and_then(Value::as_array) {
            return Ok(sets
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect());
        }

        match container {
            Value::Array(entries) => Ok(entries
                .iter()
                .filter(|entry| {
                    entry
                        .get("kind")
                        .and_then(Value::as_str)
                        .map_or(true, |kind| kind == "EntitySet")
                })
                .filter_map(|entry| entry.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()),
            _ => Err(Error::malformed("service document lists no entity sets")),
        }
    }
}

impl From<ODataVersion> for ProtocolProfile {
    fn from(version: ODataVersion) -> Self {
        Self::for_version(version)
    }
}

/// Raw items of one response plus the server's continuation link
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Items in server order, not yet normalized
    pub items: Vec<JsonValue>,
    /// Continuation URL, if the server declared one
    pub next_link: Option<String>,
}

impl Page {
    /// Number of items on this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the page carries no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
