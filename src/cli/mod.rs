//! CLI module
//!
//! Command-line interface for running the connectors.
//!
//! # Commands
//!
//! - `read` - Read rows of the configured OData entity set
//! - `entity-sets` / `services` - Browse the OData service
//! - `list-schema` / `list-read` - SharePoint lists
//! - `browse` / `stat` / `enumerate` / `download` - SharePoint document library

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
