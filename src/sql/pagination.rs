/// Pagination bounds
use crate::error::{MiniDbError, Result};

/// Effective `LIMIT` / `OFFSET` of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Apply defaults and bounds
    ///
    /// `limit` defaults to `max_page_size` and may not exceed it; `offset`
    /// defaults to 0. Negative values are rejected.
    pub fn resolve(limit: Option<i64>, offset: Option<i64>, max_page_size: i64) -> Result<Self> {
        let limit = limit.unwrap_or(max_page_size);
        if limit < 0 {
            return Err(MiniDbError::InvalidQuery(format!(
                "`limit` cannot be negative, got {}",
                limit
            )));
        }
        if limit > max_page_size {
            return Err(MiniDbError::InvalidQuery(format!(
                "`limit` cannot exceed {}, got {}",
                max_page_size, limit
            )));
        }

        let offset = offset.unwrap_or(0);
        if offset < 0 {
            return Err(MiniDbError::InvalidQuery(format!(
                "`offset` cannot be negative, got {}",
                offset
            )));
        }

        Ok(Self { limit, offset })
    }
}
