//! Success envelope and query-parameter types.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIST_LIMIT: usize = 10;
pub const MAX_LIST_LIMIT: usize = 100;

/// Uniform success wrapper: `{"success": true, "data": …}`, with
/// `count`/`total` attached when a list was truncated.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            count: None,
            total: None,
        }
    }

    pub fn list(data: T, count: usize) -> Self {
        Self {
            success: true,
            data,
            count: Some(count),
            total: None,
        }
    }

    pub fn truncated(data: T, count: usize, total: usize) -> Self {
        Self {
            success: true,
            data,
            count: Some(count),
            total: Some(total),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ArticleListQuery {
    pub limit: Option<usize>,
    pub force: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Clamp a requested limit into the allowed window.
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}
