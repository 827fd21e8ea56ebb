//! HTTP client module
//!
//! Provides the authenticated client every connector talks through.
//!
//! # Features
//!
//! - **Status Classification**: 404/401/403/400 mapped to dedicated errors
//! - **Soft-Error Retries**: `error.message.value` bodies retried on a fixed interval
//! - **Probing**: not-found answers can be turned into `None` instead of failing
//! - **Authentication**: Integration with auth module

mod client;
mod types;

pub use client::HttpClient;
pub use types::{FetchReport, HttpClientConfig, HttpClientConfigBuilder, RequestConfig, RetryPolicy};
