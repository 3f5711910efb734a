use crate::error::{AppError, Result};

/// Offset/limit pair sent to the restaurant provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u32,
    pub limit: u32,
}

/// Upstream offset for a 1-based page: `(page - 1) * page_size + 1`.
///
/// The offset itself is 1-based as well. The restaurant provider has always
/// been queried this way, so page 2 with four results per page starts at 5.
pub fn compute_offset(page: u32, page_size: u32) -> Result<u32> {
    if page == 0 {
        return Err(AppError::InvalidQuery("page numbers start at 1".to_string()));
    }
    (page - 1)
        .checked_mul(page_size)
        .and_then(|skipped| skipped.checked_add(1))
        .ok_or_else(|| AppError::InvalidQuery(format!("page {} is out of range", page)))
}

pub fn page_window(page: u32, page_size: u32) -> Result<PageWindow> {
    Ok(PageWindow {
        offset: compute_offset(page, page_size)?,
        limit: page_size,
    })
}
