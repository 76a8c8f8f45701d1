use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<Meta>,
    pub errors: Option<Vec<String>>,
}

/// List metadata: totals are computed from the filtered set before
/// pagination is applied.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

impl Meta {
    pub fn paginated(total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self {
            total,
            total_pages,
            current_page: page,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_paginated_rounds_up() {
        let meta = Meta::paginated(25, 2, 10);
        assert_eq!(meta.total, 25);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.current_page, 2);
    }

    #[test]
    fn test_meta_paginated_exact_fit() {
        let meta = Meta::paginated(30, 1, 10);
        assert_eq!(meta.total_pages, 3);
    }

    #[test]
    fn test_meta_paginated_empty() {
        let meta = Meta::paginated(0, 1, 10);
        assert_eq!(meta.total_pages, 0);
        assert_eq!(meta.current_page, 1);
    }
}
