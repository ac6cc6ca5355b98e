//! Page/size pagination utilities.

use serde::Serialize;

/// Default page size when the client does not send one.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A normalized zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
}

impl PageRequest {
    /// Builds a page request, clamping the page to `>= 0` and the size to
    /// `1..=MAX_PAGE_SIZE`.
    pub fn new(page: Option<i64>, size: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(0).max(0),
            size: size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Row offset of the first item of this page.
    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }

    /// Maximum number of rows on this page.
    pub fn limit(&self) -> i64 {
        self.size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + request.size - 1) / request.size
        };
        Self {
            items,
            page: request.page,
            size: request.size,
            total,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = PageRequest::new(None, None);
        assert_eq!(request.page, 0);
        assert_eq!(request.size, DEFAULT_PAGE_SIZE);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn test_clamping() {
        let request = PageRequest::new(Some(-3), Some(1000));
        assert_eq!(request.page, 0);
        assert_eq!(request.size, MAX_PAGE_SIZE);

        let request = PageRequest::new(Some(2), Some(0));
        assert_eq!(request.size, 1);
        assert_eq!(request.offset(), 2);
    }

    #[test]
    fn test_offset() {
        let request = PageRequest::new(Some(3), Some(25));
        assert_eq!(request.offset(), 75);
        assert_eq!(request.limit(), 25);
    }

    #[test]
    fn test_total_pages() {
        let request = PageRequest::new(Some(0), Some(10));
        assert_eq!(Page::<u8>::new(vec![], request, 0).total_pages, 0);
        assert_eq!(Page::<u8>::new(vec![], request, 10).total_pages, 1);
        assert_eq!(Page::<u8>::new(vec![], request, 11).total_pages, 2);
    }

    #[test]
    fn test_map_preserves_totals() {
        let request = PageRequest::new(Some(1), Some(2));
        let page = Page::new(vec![1, 2], request, 5).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.page, 1);
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_page_serialization() {
        let page = Page::new(vec!["a"], PageRequest::default(), 1);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["total_pages"], 1);
        assert_eq!(json["items"][0], "a");
    }
}
