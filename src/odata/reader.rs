//! Pull-based entity set reader

use super::client::ODataClient;
use crate::error::Result;
use crate::limit::RecordsLimit;
use crate::normalize::RowNormalizer;
use crate::pagination::{PaginationState, Paginator, ServerSidePaginator};
use crate::types::{JsonValue, Row};
use futures::Stream;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Where a read currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// No request issued yet
    Start,
    /// Buffer drained, next page pending
    Fetching,
    /// Handing out buffered rows
    Emitting,
    /// Nothing more to hand out
    Done,
}

/// Reads one entity set page by page
///
/// Pages are fetched strictly one after the other, and only once the rows of
/// the previous page have all been handed out. Reaching the record limit ends
/// the read immediately, dropping any buffered rows and never fetching
/// another page.
#[derive(Debug)]
pub struct EntityReader {
    client: ODataClient,
    entity: String,
    filter: Option<String>,
    paginator: Box<dyn Paginator>,
    normalizer: RowNormalizer,
    limit: RecordsLimit,
    pagination: PaginationState,
    buffer: VecDeque<JsonValue>,
    state: ReaderState,
}

impl EntityReader {
    /// Create a server-side, unlimited reader without date conversion
    pub fn new(client: ODataClient, entity: impl Into<String>) -> Self {
        Self {
            client,
            entity: entity.into(),
            filter: None,
            paginator: Box::new(ServerSidePaginator),
            normalizer: RowNormalizer::default(),
            limit: RecordsLimit::unlimited(),
            pagination: PaginationState::new(),
            buffer: VecDeque::new(),
            state: ReaderState::Start,
        }
    }

    /// Set the `$filter` expression
    #[must_use]
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter.filter(|f| !f.is_empty());
        self
    }

    /// Set the pagination strategy
    #[must_use]
    pub fn with_paginator(mut self, paginator: Box<dyn Paginator>) -> Self {
        self.paginator = paginator;
        self
    }

    /// Set the row normalizer
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: RowNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Set the record limit
    #[must_use]
    pub fn with_limit(mut self, limit: RecordsLimit) -> Self {
        self.limit = limit;
        self
    }

    /// Current state
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Record limit and its counter
    pub fn limit(&self) -> &RecordsLimit {
        &self.limit
    }

    /// Pagination progress
    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    /// Next normalized row, `None` once the read is over
    ///
    /// An error ends the read; later calls return `None`.
    pub async fn next_row(&mut self) -> Result<Option<Row>> {
        loop {
            match self.state {
                ReaderState::Start | ReaderState::Fetching => {
                    if let Err(e) = self.fetch_page().await {
                        self.finish();
                        return Err(e);
                    }
                }
                ReaderState::Emitting => {
                    let Some(item) = self.buffer.pop_front() else {
                        self.state = if self.pagination.done {
                            ReaderState::Done
                        } else {
                            ReaderState::Fetching
                        };
                        continue;
                    };

                    let row = self.normalizer.normalize(item);
                    if self.limit.add_record() {
                        info!("Limit is reached");
                        self.finish();
                    }
                    return Ok(Some(row));
                }
                ReaderState::Done => return Ok(None),
            }
        }
    }

    /// Turn the reader into a stream of rows
    pub fn into_stream(self) -> impl Stream<Item = Result<Row>> + Send {
        futures::stream::unfold(self, |mut reader| async move {
            match reader.next_row().await {
                Ok(Some(row)) => Some((Ok(row), reader)),
                Ok(None) => None,
                Err(e) => Some((Err(e), reader)),
            }
        })
    }

    /// Read every remaining row
    pub async fn collect_rows(mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let request = self
            .paginator
            .request(self.pagination.cursor.as_ref(), &self.limit);
        let probe = !self.pagination.is_first_page();

        let page = self
            .client
            .get_page(&request, &self.entity, self.filter.as_deref(), probe)
            .await?;
        let Some(page) = page else {
            warn!("Continuation of {} not found, ending read", self.entity);
            self.finish();
            return Ok(());
        };

        let next = self.paginator.advance(&page, self.pagination.cursor.as_ref());
        self.pagination.record_page(page.len(), next);
        debug!(
            "Page {} of {}: {} items, {} in total",
            self.pagination.pages,
            self.entity,
            page.len(),
            self.pagination.total_fetched
        );

        self.buffer.extend(page.items);
        self.state = ReaderState::Emitting;
        Ok(())
    }

    fn finish(&mut self) {
        self.buffer.clear();
        self.pagination.mark_done();
        self.state = ReaderState::Done;
    }
}
