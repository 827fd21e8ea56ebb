//! Dataset schemas
//!
//! Ordered, typed column lists declared by a source or expected by a sink.

mod types;

pub use types::{Column, ColumnType, Schema};
