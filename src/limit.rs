//! Record-limit governor
//!
//! Caps the number of rows a read hands out, independently of how the
//! server sizes its pages. The counter moves once per row handed out and is
//! never reset during a read.

/// Optional cap on the rows of one read, with its running counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordsLimit {
    max: Option<u64>,
    count: u64,
}

impl RecordsLimit {
    /// Create a governor from the host's raw value
    ///
    /// Zero and negative values (the host sends `-1`) mean unlimited.
    pub fn new(records_limit: i64) -> Self {
        Self {
            max: u64::try_from(records_limit).ok().filter(|max| *max > 0),
            count: 0,
        }
    }

    /// A governor that never stops a read
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Create a governor from an optional cap
    pub fn from_option(max: Option<u64>) -> Self {
        Self {
            max: max.filter(|max| *max > 0),
            count: 0,
        }
    }

    /// Configured cap, `None` when unlimited
    pub fn max(&self) -> Option<u64> {
        self.max
    }

    /// Rows counted so far
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Count one handed-out row and tell whether the cap is now reached
    pub fn add_record(&mut self) -> bool {
        match self.max {
            None => false,
            Some(max) => {
                self.count += 1;
                self.count >= max
            }
        }
    }

    /// Whether no further row may be handed out
    pub fn is_reached(&self) -> bool {
        self.max.is_some_and(|max| self.count >= max)
    }

    /// Rows still allowed, `None` when unlimited
    pub fn remaining(&self) -> Option<u64> {
        self.max.map(|max| max.saturating_sub(self.count))
    }

    /// Shrink a requested page size to the remaining budget
    ///
    /// `None` means "let the server pick" and stays untouched.
    pub fn clamp_page_size(&self, page_size: Option<u64>) -> Option<u64> {
        match (page_size, self.remaining()) {
            (Some(size), Some(remaining)) => Some(size.min(remaining)),
            (size, _) => size,
        }
    }
}

/// Iterator adapter stopping after the governor's cap
#[derive(Debug)]
pub struct LimitedRows<I> {
    inner: I,
    limit: RecordsLimit,
}

impl<I> LimitedRows<I> {
    /// Wrap a row iterator
    pub fn new(inner: I, limit: RecordsLimit) -> Self {
        Self { inner, limit }
    }

    /// Governor state
    pub fn limit(&self) -> &RecordsLimit {
        &self.limit
    }
}

impl<I: Iterator> Iterator for LimitedRows<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.limit.is_reached() {
            return None;
        }
        let item = self.inner.next()?;
        self.limit.add_record();
        Some(item)
    }
}
