//! Paging for job and record listings

use serde::{Deserialize, Serialize};

/// Default page size of the votings listing
pub const DEFAULT_PER_PAGE: usize = 25;

/// Resolved page window over `count` items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub per_page: usize,
    /// 1-based page number, clamped into range
    pub page: usize,
    pub last_page: usize,
    pub offset: usize,
    pub count: usize,
}

impl Page {
    /// Resolve a requested page against the number of available items.
    ///
    /// A page past the end falls back to the last page; an empty listing is
    /// always page 1 at offset 0.
    #[must_use]
    pub fn resolve(per_page: usize, page: usize, count: usize) -> Self {
        let per_page = per_page.max(1);
        let page = page.max(1);
        let last_page = count.div_ceil(per_page).max(1);
        let offset = per_page * (page - 1);

        if count == 0 {
            return Self {
                per_page,
                page: 1,
                last_page,
                offset: 0,
                count,
            };
        }

        if offset >= count {
            return Self {
                per_page,
                page: last_page,
                last_page,
                offset: per_page * (last_page - 1),
                count,
            };
        }

        Self {
            per_page,
            page,
            last_page,
            offset,
            count,
        }
    }
}
