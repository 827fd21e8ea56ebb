//! OData protocol profiles
//!
//! Supports: v2, v3 (JSON light), v4 and the SAP gateway dialect
//!
//! # Overview
//!
//! A `ProtocolProfile` is selected once from the configured version and
//! carries every version-specific detail as data: content negotiation, the
//! key that wraps page payloads and where the server puts its continuation
//! link. Nothing downstream branches on the version again.

mod profile;

pub use profile::{ODataVersion, Page, ProtocolProfile, APPLICATION_JSON, JSON_FORMAT};

#[cfg(test)]
mod tests;
