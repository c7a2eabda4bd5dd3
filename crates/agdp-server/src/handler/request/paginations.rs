//! Pagination request types.

use agdp_store::types::OffsetPagination;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Offset-based pagination query parameters.
///
/// Missing values fall back to offset 0 and limit 100; limits above 1000 are
/// clamped.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct Pagination {
    /// The number of records to skip before starting to return results.
    #[serde(alias = "skip")]
    pub offset: Option<u32>,
    /// The maximum number of records to return.
    pub limit: Option<u32>,
}

impl Pagination {
    /// Returns a new [`Pagination`].
    #[inline]
    pub fn new(offset: u32, limit: u32) -> Self {
        Self {
            offset: Some(offset),
            limit: Some(limit),
        }
    }

    /// Returns the pagination offset.
    pub fn offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }

    /// Returns the pagination limit.
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(OffsetPagination::DEFAULT_LIMIT)
    }
}

impl From<Pagination> for OffsetPagination {
    fn from(pagination: Pagination) -> Self {
        OffsetPagination::new(pagination.limit(), pagination.offset())
    }
}

#[cfg(test)]
mod tests {
    use agdp_store::types::MAX_LIMIT;

    use super::*;

    #[test]
    fn defaults_match_store_defaults() {
        let pagination = OffsetPagination::from(Pagination::default());
        assert_eq!(pagination, OffsetPagination::default());
    }

    #[test]
    fn oversized_limit_is_clamped() {
        let pagination = OffsetPagination::from(Pagination::new(5, 50_000));
        assert_eq!(pagination.limit, MAX_LIMIT);
        assert_eq!(pagination.offset, 5);
    }
}
