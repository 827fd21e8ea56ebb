//! Pagination types and traits

use crate::limit::RecordsLimit;
use crate::protocol::Page;
use serde::{Deserialize, Serialize};

/// How a read walks through a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// Follow continuation links declared by the server
    #[default]
    ServerSide,
    /// Compute `$skip` offsets on the client
    ClientSide,
}

/// Where the next page is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationCursor {
    /// Continuation URL issued by the server
    NextLink(String),
    /// Offset of the next page in client-side mode
    Offset {
        /// Items to skip
        skip: u64,
    },
}

/// What to ask the server for next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// Build the URL from the entity and these query options
    Query {
        /// `$top` value, omitted when `None`
        top: Option<u64>,
        /// `$skip` value, omitted when `None`
        skip: Option<u64>,
    },
    /// Use this URL verbatim
    Url(String),
}

impl PageRequest {
    /// Create a query request
    pub fn query(top: Option<u64>, skip: Option<u64>) -> Self {
        Self::Query { top, skip }
    }

    /// Whether this request follows a server-supplied URL
    pub fn is_url(&self) -> bool {
        matches!(self, Self::Url(_))
    }
}

/// Tracks pagination progress during one read
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Where the next page is, `None` before the first page and after the last
    pub cursor: Option<PaginationCursor>,
    /// Pages received so far
    pub pages: u32,
    /// Items received so far
    pub total_fetched: u64,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the first page is still to be fetched
    pub fn is_first_page(&self) -> bool {
        self.pages == 0
    }

    /// Record a received page and where to go next
    pub fn record_page(&mut self, items: usize, next: Option<PaginationCursor>) {
        self.pages += 1;
        self.total_fetched += items as u64;
        self.done = next.is_none();
        self.cursor = next;
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.cursor = None;
        self.done = true;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync + std::fmt::Debug {
    /// Mode this strategy implements
    fn mode(&self) -> PaginationMode;

    /// Request for the page at `cursor`, or the first page when `None`
    ///
    /// Called right before the fetch so the page size reflects the rows the
    /// governor still allows.
    fn request(&self, cursor: Option<&PaginationCursor>, limit: &RecordsLimit) -> PageRequest;

    /// Cursor of the page after `page`, `None` when the collection is exhausted
    fn advance(&self, page: &Page, cursor: Option<&PaginationCursor>) -> Option<PaginationCursor>;
}
