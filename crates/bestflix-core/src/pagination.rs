//! Page slicing and page-button window selection
//!
//! Both operations are pure and shared by every paginated view.

use std::num::NonZeroUsize;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::types::PaginatedResult;

/// Number of page buttons shown at most
const WINDOW_WIDTH: u32 = 3;

/// Fixed page capacity of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct PageSize(NonZeroUsize);

impl PageSize {
    /// Page size of the public catalog views
    pub const PUBLIC: PageSize = PageSize::from_const(24);
    /// Page size of a user's private collection
    pub const PRIVATE: PageSize = PageSize::from_const(16);

    const fn from_const(size: usize) -> Self {
        match NonZeroUsize::new(size) {
            Some(size) => PageSize(size),
            None => panic!("page size must be positive"),
        }
    }

    /// Create a page size, `None` for zero
    pub fn new(size: usize) -> Option<Self> {
        NonZeroUsize::new(size).map(PageSize)
    }

    /// Page capacity
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<usize> for PageSize {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        PageSize::new(value).ok_or_else(|| "page size must be positive".to_string())
    }
}

impl From<PageSize> for usize {
    fn from(value: PageSize) -> Self {
        value.get()
    }
}

/// Number of pages needed for `count` results, never less than 1.
pub fn total_pages(count: usize, page_size: PageSize) -> u32 {
    let pages = count.div_ceil(page_size.get()).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Slice one page out of `results`.
///
/// The page index is not clamped: an index of 0 or past the last page yields
/// an empty page while `total_pages` still reflects the full result list.
///
/// # Example
/// ```
/// use bestflix_core::pagination::{paginate, PageSize};
///
/// let results: Vec<u32> = (1..=30).collect();
/// let page = paginate(&results, 2, PageSize::PUBLIC);
/// assert_eq!(page.items, vec![25, 26, 27, 28, 29, 30]);
/// assert_eq!(page.total_pages, 2);
/// ```
pub fn paginate<T: Clone>(results: &[T], page_index: u32, page_size: PageSize) -> PaginatedResult<T> {
    let total = total_pages(results.len(), page_size);
    let size = page_size.get();

    let items = match (page_index as usize).checked_sub(1) {
        Some(offset) => {
            let start = offset.saturating_mul(size);
            let end = start.saturating_add(size).min(results.len());
            results.get(start..end).map(<[T]>::to_vec).unwrap_or_default()
        }
        None => Vec::new(),
    };

    PaginatedResult::new(items, page_index, total)
}

/// Range of page-number buttons to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    /// First page button
    pub start: u32,
    /// Last page button (inclusive)
    pub end: u32,
}

impl PageWindow {
    /// Select up to three page buttons around `current_page`.
    ///
    /// The current page stays centered when possible and the window sits flush
    /// against either edge near a boundary.
    ///
    /// # Example
    /// ```
    /// use bestflix_core::pagination::PageWindow;
    ///
    /// let window = PageWindow::select(5, 5);
    /// assert_eq!((window.start, window.end), (3, 5));
    /// ```
    pub fn select(current_page: u32, total_pages: u32) -> Self {
        let total = total_pages.max(1);
        let span = WINDOW_WIDTH - 1;

        let mut start = current_page.saturating_sub(1).max(1);
        let end = total.min(start.saturating_add(span));
        if end.saturating_sub(start) < span {
            start = end.saturating_sub(span).max(1);
        }

        Self { start, end }
    }

    /// Page numbers in the window
    pub fn pages(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }

    /// Number of buttons in the window
    pub fn len(&self) -> usize {
        self.pages().count()
    }

    /// Whether the window holds no buttons
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything a view needs to draw its pagination bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageControls {
    /// Page number buttons
    pub window: PageWindow,
    /// Page rendered as active
    pub current_page: u32,
    /// Total number of pages
    pub total_pages: u32,
    /// "Previous" button enabled
    pub prev_enabled: bool,
    /// "Next" button enabled
    pub next_enabled: bool,
    /// Bar shown at all; hidden when there is nothing to page through
    pub visible: bool,
}

impl PageControls {
    /// Controls for a page of results
    pub fn for_page<T>(page: &PaginatedResult<T>, result_count: usize) -> Self {
        Self {
            window: PageWindow::select(page.current_page, page.total_pages),
            current_page: page.current_page,
            total_pages: page.total_pages,
            prev_enabled: page.has_prev_page(),
            next_enabled: page.has_next_page(),
            visible: result_count > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: usize) -> PageSize {
        PageSize::new(n).unwrap()
    }

    #[test]
    fn test_page_size_constants() {
        assert_eq!(PageSize::PUBLIC.get(), 24);
        assert_eq!(PageSize::PRIVATE.get(), 16);
        assert!(PageSize::new(0).is_none());
    }

    #[test]
    fn test_total_pages_minimum_one() {
        assert_eq!(total_pages(0, size(24)), 1);
        assert_eq!(total_pages(24, size(24)), 1);
        assert_eq!(total_pages(25, size(24)), 2);
    }

    #[test]
    fn test_paginate_thirty_items() {
        let results: Vec<usize> = (0..30).collect();

        let first = paginate(&results, 1, PageSize::PUBLIC);
        assert_eq!(first.items.len(), 24);
        assert_eq!(first.total_pages, 2);

        let second = paginate(&results, 2, PageSize::PUBLIC);
        assert_eq!(second.items.len(), 6);
        assert_eq!(second.items[0], 24);
    }

    #[test]
    fn test_paginate_out_of_range_is_empty() {
        let results: Vec<usize> = (0..10).collect();

        let page = paginate(&results, 5, size(4));
        assert!(page.items.is_empty());
        assert_eq!(page.current_page, 5);
        assert_eq!(page.total_pages, 3);

        let page = paginate(&results, 0, size(4));
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_paginate_empty_results() {
        let results: Vec<usize> = Vec::new();
        let page = paginate(&results, 1, PageSize::PRIVATE);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_window_flush_right() {
        assert_eq!(PageWindow::select(5, 5), PageWindow { start: 3, end: 5 });
    }

    #[test]
    fn test_window_flush_left() {
        assert_eq!(PageWindow::select(1, 10), PageWindow { start: 1, end: 3 });
        assert_eq!(PageWindow::select(2, 10), PageWindow { start: 1, end: 3 });
    }

    #[test]
    fn test_window_centered() {
        assert_eq!(PageWindow::select(6, 10), PageWindow { start: 5, end: 7 });
    }

    #[test]
    fn test_window_fewer_pages_than_width() {
        let window = PageWindow::select(1, 1);
        assert_eq!(window.pages().collect::<Vec<_>>(), vec![1]);

        let window = PageWindow::select(2, 2);
        assert_eq!(window.pages().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_window_with_stale_current_page() {
        // current page past the end after the result list shrank
        let window = PageWindow::select(9, 4);
        assert_eq!(window, PageWindow { start: 2, end: 4 });
        assert_eq!(PageWindow::select(99, 1), PageWindow { start: 1, end: 1 });
        assert_eq!(PageWindow::select(u32::MAX, 2), PageWindow { start: 1, end: 2 });
    }

    #[test]
    fn test_window_size_bounds() {
        for total in 1..=8u32 {
            for current in 1..=total {
                let window = PageWindow::select(current, total);
                assert!(window.len() <= 3);
                assert_eq!(window.len(), total.min(3) as usize);
                assert!(window.pages().contains(&current));
            }
        }
    }

    #[test]
    fn test_controls_at_bounds() {
        let results: Vec<usize> = (0..40).collect();

        let first = paginate(&results, 1, PageSize::PRIVATE);
        let controls = PageControls::for_page(&first, results.len());
        assert!(!controls.prev_enabled);
        assert!(controls.next_enabled);
        assert!(controls.visible);

        let last = paginate(&results, 3, PageSize::PRIVATE);
        let controls = PageControls::for_page(&last, results.len());
        assert!(controls.prev_enabled);
        assert!(!controls.next_enabled);
    }

    #[test]
    fn test_controls_hidden_without_results() {
        let page: PaginatedResult<usize> = PaginatedResult::empty();
        let controls = PageControls::for_page(&page, 0);
        assert!(!controls.visible);
        assert_eq!(controls.window.len(), 1);
    }
}
