//! Pagination of the filtered, sorted row set.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TableError};

/// Number of rows per page. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct PageSize(NonZeroUsize);

impl PageSize {
    /// Rows per page when none is configured.
    pub const DEFAULT: PageSize = PageSize(match NonZeroUsize::new(10) {
        Some(n) => n,
        None => unreachable!(),
    });

    /// Creates a page size, rejecting zero.
    pub fn new(size: usize) -> Result<Self> {
        NonZeroUsize::new(size)
            .map(PageSize)
            .ok_or(TableError::InvalidPageSize)
    }

    /// Rows per page.
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::DEFAULT
    }
}

impl TryFrom<usize> for PageSize {
    type Error = TableError;

    fn try_from(size: usize) -> Result<Self> {
        PageSize::new(size)
    }
}

impl From<PageSize> for usize {
    fn from(size: PageSize) -> usize {
        size.get()
    }
}

/// Splits items into contiguous pages of `page_size`.
///
/// The last page may be shorter. An empty input yields a single empty page,
/// so "page 1 of 1" is always renderable.
///
/// # Example
///
/// ```
/// use rowdeck::{paginate, PageSize};
///
/// let pages = paginate(&(0..25).collect::<Vec<_>>(), PageSize::DEFAULT);
/// let lens: Vec<_> = pages.iter().map(Vec::len).collect();
/// assert_eq!(lens, vec![10, 10, 5]);
/// ```
pub fn paginate<T: Clone>(items: &[T], page_size: PageSize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return vec![Vec::new()];
    }
    items
        .chunks(page_size.get())
        .map(<[T]>::to_vec)
        .collect()
}

/// Keeps a page index within `[0, page_count)`, resetting to the first page
/// when the index no longer exists.
pub fn clamp_page_index(index: usize, page_count: usize) -> usize {
    if index >= page_count {
        0
    } else {
        index
    }
}
