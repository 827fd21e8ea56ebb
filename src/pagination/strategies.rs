//! Pagination strategy implementations

use super::types::{PageRequest, PaginationCursor, PaginationMode, Paginator};
use crate::limit::RecordsLimit;
use crate::protocol::Page;

// ============================================================================
// Server-side Pagination
// ============================================================================

/// Continuation-link pagination
///
/// The first request may carry `$top` to cap the whole read at the record
/// limit. Every later request is the server's link, untouched.
#[derive(Debug, Clone, Default)]
pub struct ServerSidePaginator;

impl Paginator for ServerSidePaginator {
    fn mode(&self) -> PaginationMode {
        PaginationMode::ServerSide
    }

    fn request(&self, cursor: Option<&PaginationCursor>, limit: &RecordsLimit) -> PageRequest {
        match cursor {
            Some(PaginationCursor::NextLink(url)) => PageRequest::Url(url.clone()),
            _ => PageRequest::query(limit.remaining(), None),
        }
    }

    fn advance(&self, page: &Page, _cursor: Option<&PaginationCursor>) -> Option<PaginationCursor> {
        if page.is_empty() {
            return None;
        }
        page.next_link.clone().map(PaginationCursor::NextLink)
    }
}

// ============================================================================
// Client-side Pagination
// ============================================================================

/// Offset pagination driven by `$skip`
///
/// The offset grows by the number of items actually returned. Only an empty
/// page ends the read, since the server may cap pages below the requested
/// size. A page size of `None` sends no `$top` at all.
#[derive(Debug, Clone, Default)]
pub struct ClientSidePaginator {
    /// Requested page size, `None` for the server default
    pub page_size: Option<u64>,
}

impl ClientSidePaginator {
    /// Create a client-side paginator; a page size of 0 means server default
    pub fn new(page_size: u64) -> Self {
        Self {
            page_size: (page_size > 0).then_some(page_size),
        }
    }
}

impl Paginator for ClientSidePaginator {
    fn mode(&self) -> PaginationMode {
        PaginationMode::ClientSide
    }

    fn request(&self, cursor: Option<&PaginationCursor>, limit: &RecordsLimit) -> PageRequest {
        let top = limit.clamp_page_size(self.page_size);
        let skip = match cursor {
            Some(PaginationCursor::Offset { skip }) => Some(*skip),
            _ => None,
        };
        PageRequest::query(top, skip)
    }

    fn advance(&self, page: &Page, cursor: Option<&PaginationCursor>) -> Option<PaginationCursor> {
        if page.is_empty() {
            return None;
        }
        let skip = match cursor {
            Some(PaginationCursor::Offset { skip }) => *skip,
            _ => 0,
        };
        Some(PaginationCursor::Offset {
            skip: skip + page.len() as u64,
        })
    }
}

/// Build the strategy for a mode
pub fn paginator_for(mode: PaginationMode, page_size: u64) -> Box<dyn Paginator> {
    match mode {
        PaginationMode::ServerSide => Box::new(ServerSidePaginator),
        PaginationMode::ClientSide => Box::new(ClientSidePaginator::new(page_size)),
    }
}
