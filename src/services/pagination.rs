use serde::Serialize;
use utoipa::ToSchema;

/// Pagination metadata, derived only from `total`, `page` and `per_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Rows matching the filters across all pages
    pub total: u64,
    pub per_page: u32,
    pub current_page: u32,
    /// ceil(total / per_page); 0 when nothing matches
    pub last_page: u64,
    /// 1-based index of the first row on this page
    pub from: u64,
    /// 1-based index of the last row on this page, capped at `total`.
    /// Smaller than `from` when the page holds no rows.
    pub to: u64,
}

impl PaginationMeta {
    pub fn new(total: u64, page: u32, per_page: u32) -> Self {
        let page = page.max(1);
        let size = u64::from(per_page.max(1));
        let offset = u64::from(page - 1) * size;

        Self {
            total,
            per_page,
            current_page: page,
            last_page: total.div_ceil(size),
            from: offset + 1,
            to: (offset + size).min(total),
        }
    }

    /// Whether the page starts past the last matching row.
    pub fn is_beyond_end(&self) -> bool {
        self.from > self.total
    }
}
