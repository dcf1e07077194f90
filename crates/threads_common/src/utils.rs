use crate::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Direction value for a mongo sort document
    pub fn direction(&self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}

/**
 * A 1-indexed page of a listing
 * @dev page numbers below 1 are treated as the first page and a page size of 0 as the default
 */
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_number: u64,
    pub page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page_number: Option<u64>, page_size: u64) -> Self {
        Self {
            page_number: page_number.unwrap_or(1).max(1),
            page_size: if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size },
        }
    }

    /// Documents to skip, clamped so it always fits a signed `$skip`
    pub fn skip(&self) -> u64 {
        (self.page_number.max(1) - 1)
            .saturating_mul(self.page_size)
            .min(i64::MAX as u64)
    }

    pub fn limit(&self) -> i64 {
        self.page_size.min(i64::MAX as u64) as i64
    }

    /**
     * Whether another page follows this one
     *
     * @param total - number of documents matching the listing filter
     * @param fetched - number of documents returned for this page
     */
    pub fn is_next(&self, total: u64, fetched: usize) -> bool {
        total > self.skip().saturating_add(fetched as u64)
    }
}
