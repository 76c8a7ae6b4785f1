//! Repository error and pagination types

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl RepositoryError {
    /// Wrap a sqlx error, mapping unique-constraint violations to `Conflict`.
    ///
    /// Postgres reports unique violations as SQLSTATE 23505; duplicate
    /// registrations racing each other resolve here rather than through
    /// application-level locking.
    pub fn from_sqlx(err: sqlx::Error, conflict_message: &str) -> Self {
        if is_unique_violation(&err) {
            RepositoryError::Conflict(conflict_message.to_string())
        } else {
            RepositoryError::Database(err)
        }
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Database(err)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Pagination parameters for queries
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    /// One-based page number to limit/offset
    pub fn page(page: i64, per_page: i64) -> Self {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);
        Self {
            limit: per_page,
            offset: (page - 1) * per_page,
        }
    }
}

/// Query result with pagination metadata
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            limit: pagination.limit,
            offset: pagination.offset,
        }
    }

    pub fn page(&self) -> i64 {
        if self.limit == 0 {
            1
        } else {
            (self.offset / self.limit) + 1
        }
    }

    pub fn total_pages(&self) -> i64 {
        if self.limit == 0 {
            1
        } else {
            (self.total + self.limit - 1) / self.limit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_page() {
        let p = Pagination::page(3, 10);
        assert_eq!(p.limit, 10);
        assert_eq!(p.offset, 20);
    }

    #[test]
    fn test_pagination_clamps_bad_input() {
        let p = Pagination::page(0, 0);
        assert_eq!(p.limit, 1);
        assert_eq!(p.offset, 0);

        let p = Pagination::page(1, 10_000);
        assert_eq!(p.limit, 100);
    }

    #[test]
    fn test_paginated_result() {
        let result = PaginatedResult::new(vec![1, 2, 3, 4, 5], 42, Pagination::page(2, 5));
        assert_eq!(result.page(), 2);
        assert_eq!(result.total_pages(), 9);
    }
}
