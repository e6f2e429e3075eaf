//! Pagination window and paged results

use serde::Serialize;

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::error::AppError;

/// A validated `(offset, limit)` window.
///
/// `offset >= 0` and `0 < limit <= max_page_size` hold for every value of
/// this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    offset: i64,
    limit: i64,
}

impl PageRequest {
    /// Validate against the default maximum page size.
    pub fn new(offset: i64, limit: i64) -> Result<Self, AppError> {
        Self::with_max(offset, limit, MAX_PAGE_SIZE)
    }

    pub fn with_max(offset: i64, limit: i64, max_page_size: i64) -> Result<Self, AppError> {
        if offset < 0 {
            return Err(AppError::InvalidInput(format!(
                "offset must not be negative (got {})",
                offset
            )));
        }
        if limit <= 0 || limit > max_page_size {
            return Err(AppError::InvalidInput(format!(
                "limit must be between 1 and {} (got {})",
                max_page_size, limit
            )));
        }
        Ok(Self { offset, limit })
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// The window that follows this one.
    pub fn next(&self) -> Self {
        Self {
            offset: self.offset + self.limit,
            limit: self.limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of a listing together with the size of the whole filtered set.
#[derive(Debug, Clone, Serialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub offset: i64,
    pub limit: i64,
}

impl<T> Paged<T> {
    pub fn new(items: Vec<T>, total_count: i64, page: PageRequest) -> Self {
        Self {
            items,
            total_count,
            offset: page.offset(),
            limit: page.limit(),
        }
    }

    /// True iff rows exist past the end of this page.
    pub fn has_more(&self) -> bool {
        self.offset + (self.items.len() as i64) < self.total_count
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            offset: self.offset,
            limit: self.limit,
        }
    }
}
