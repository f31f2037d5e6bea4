//! Page-size cursor
//!
//! Every fetch asks for the `limit` most recent posts, and `limit` grows by
//! one page per call. The cursor belongs to one screen instance and starts at
//! zero for each new one.

/// Default number of rows added per fetch
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    page_size: usize,
    limit: usize,
}

impl PageCursor {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            limit: 0,
        }
    }

    /// Grow the limit by one page and return the new limit
    pub fn advance(&mut self) -> usize {
        self.limit = self.limit.saturating_add(self.page_size);
        self.limit
    }

    /// Current limit (0 before the first fetch)
    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
