//! Pagination utilities for listing and search results

use serde::Serialize;

/// Default number of venues per page
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    /// Items per page
    pub page_size: usize,
    /// Total number of pages
    pub total_pages: usize,
    /// Index of the first item on the page
    pub offset: usize,
}

/// Calculate pagination metadata from total results and requested page
///
/// Ensures page is within valid bounds [1, total_pages]. A zero page size is
/// treated as one.
///
/// # Examples
/// ```
/// use pkv_common::pagination::calculate_pagination;
///
/// // 25 results at 12 per page = 3 pages (12 + 12 + 1)
/// let p = calculate_pagination(25, 2, 12);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 12);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(25, 99, 12);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 24);
/// ```
pub fn calculate_pagination(total_results: usize, requested_page: usize, page_size: usize) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = total_results.div_ceil(page_size);
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * page_size;

    Pagination {
        page,
        page_size,
        total_pages,
        offset,
    }
}

/// One page of results plus the metadata the listing UI renders
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_results: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slice `all` according to the requested page
    pub fn from_vec(all: Vec<T>, requested_page: usize, page_size: usize) -> Self {
        let total_results = all.len();
        let p = calculate_pagination(total_results, requested_page, page_size);
        let items = all.into_iter().skip(p.offset).take(p.page_size).collect();

        Page {
            items,
            total_results,
            page: p.page,
            page_size: p.page_size,
            total_pages: p.total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_results: self.total_results,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}
