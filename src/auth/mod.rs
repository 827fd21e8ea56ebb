//! Authentication module
//!
//! Supports: Basic (SAP gateways, on-premise SharePoint) and Bearer
//! (OAuth access tokens handed over by the host).

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::AuthConfig;
