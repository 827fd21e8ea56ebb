//! Error types for the connectors
//!
//! Every public API returns `Result<T, Error>` where Error is defined here.
//! Remote failures are split by how they must be treated: transient soft
//! errors are retried by the fetcher before escalating to `RemoteService`,
//! everything else is fatal on first sight.

use thiserror::Error;

/// The main error type for the connectors
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("No stored preset named '{name}'")]
    PresetNotFound { name: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("This entity does not exist: {url}")]
    NotFound { url: String },

    #[error("Unauthorized access to {url}")]
    Unauthorized { url: String },

    #[error("Forbidden access to {url}")]
    Forbidden { url: String },

    #[error("Bad request for {url}: {body}")]
    BadRequest { url: String, body: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Remote Service Errors
    // ============================================================================
    #[error("Remote service error after {attempts} attempts: {message}")]
    RemoteService { message: String, attempts: u32 },

    #[error("Remote service error: {body}")]
    RemoteFatal { body: String },

    #[error("Error when interacting with the remote service: {message}")]
    MalformedResponse { message: String },

    // ============================================================================
    // File System Errors
    // ============================================================================
    #[error("Ambiguous naming with file / folder {name}")]
    AmbiguousPath { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Check if this is a not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Check if this error is retryable
    ///
    /// Only transport-level hiccups qualify. Soft errors embedded in response
    /// bodies are classified by the fetcher itself.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Result type alias for the connectors
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
