//! Page windows over time ranges and item lists.
//!
//! One page index maps onto either a time range of a video (description
//! pages) or an offset range of a list (collections, videos, summaries,
//! segment entities). Both use [`compute_window`].

use serde::Serialize;

/// Total extent of the thing being paged, if known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extent {
    Known(f64),
    Unknown,
}

impl From<Option<f64>> for Extent {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Extent::Known(v.max(0.0)),
            _ => Extent::Unknown,
        }
    }
}

/// The slice of a result that one page covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageWindow {
    pub page: u32,
    pub start: f64,
    pub end: f64,
    pub total_pages: u32,
    pub is_empty: bool,
    /// The page covers the whole payload, so slicing can be skipped.
    pub whole_payload: bool,
}

/// Compute the window for `page`, starting from `base_offset`.
///
/// `window_size` must be positive. With an unknown extent only page 0 at
/// offset 0 is servable (as the whole payload); everything else is empty.
pub fn compute_window(page: u32, base_offset: f64, window_size: f64, extent: Extent) -> PageWindow {
    debug_assert!(window_size > 0.0, "window_size must be positive");
    let base_offset = base_offset.max(0.0);
    let start = base_offset + page as f64 * window_size;

    let total = match extent {
        Extent::Known(total) => total,
        Extent::Unknown => {
            let whole = page == 0 && base_offset == 0.0;
            return PageWindow {
                page,
                start,
                end: if whole { f64::INFINITY } else { start },
                total_pages: 1,
                is_empty: !whole,
                whole_payload: whole,
            };
        }
    };

    let remaining = (total - base_offset).max(0.0);
    let total_pages = if remaining > 0.0 {
        (remaining / window_size).ceil() as u32
    } else {
        1
    };

    let is_empty = start >= total;
    let end = (base_offset + (page as f64 + 1.0) * window_size)
        .min(total)
        .max(start);

    PageWindow {
        page,
        start,
        end,
        total_pages: total_pages.max(1),
        is_empty,
        whole_payload: !is_empty && page == 0 && base_offset == 0.0 && total <= window_size,
    }
}

/// An offset range over a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ItemWindow {
    pub page: u32,
    pub offset: u64,
    pub limit: u32,
    pub total_pages: u32,
    pub is_empty: bool,
}

impl ItemWindow {
    /// Items to request: one past the page, so a following page shows up
    /// even when the service reports no total.
    pub fn fetch_limit(&self) -> u32 {
        self.limit.saturating_add(1)
    }

    /// Cut a list fetched with [`ItemWindow::fetch_limit`] back to the page
    /// and count pages. A reported `total` wins over the lookahead item.
    pub fn trim<T>(&self, items: &mut Vec<T>, total: Option<u64>) -> u32 {
        let seen = self.offset + items.len() as u64;
        items.truncate(self.limit as usize);
        total_pages_for(total.unwrap_or(seen), self.limit)
    }
}

/// Item-count variant of [`compute_window`]: `offset = page * page_size`.
pub fn item_window(page: u32, page_size: u32, total_count: Option<u64>) -> ItemWindow {
    let page_size = page_size.max(1);
    let window = compute_window(
        page,
        0.0,
        page_size as f64,
        total_count.map(|t| t as f64).into(),
    );

    ItemWindow {
        page,
        offset: page as u64 * page_size as u64,
        limit: page_size,
        total_pages: window.total_pages,
        // An unknown total still lets any page be requested from the server.
        is_empty: total_count.is_some() && window.is_empty,
    }
}

/// Page count for a list whose total arrives with the page.
pub fn total_pages_for(total_count: u64, page_size: u32) -> u32 {
    item_window(0, page_size, Some(total_count)).total_pages
}
