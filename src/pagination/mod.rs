//! Pagination module
//!
//! Supports: server-driven continuation links and client-computed offsets
//!
//! # Overview
//!
//! A read picks exactly one `Paginator` when it starts and keeps it until the
//! end. Server-side pagination follows the continuation URL each page
//! declares. Client-side pagination tracks a `$skip` offset itself, for
//! services that do not emit continuation links reliably.

mod strategies;
mod types;

pub use strategies::{paginator_for, ClientSidePaginator, ServerSidePaginator};
pub use types::{PageRequest, PaginationCursor, PaginationMode, PaginationState, Paginator};
