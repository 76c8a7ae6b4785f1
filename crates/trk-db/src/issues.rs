//! Issue repository
//!
//! Listing supports status filtering plus sorting restricted to an explicit
//! allow-list of columns; caller-supplied sort strings never reach SQL
//! directly.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use trk_core::Id;
use trk_models::{Issue, IssueStatus};

use crate::repository::{Pagination, PaginatedResult, RepositoryResult};

/// Accepted sort fields for issue listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSort {
    CreatedAt,
    Title,
    Status,
}

impl IssueSort {
    /// Map a caller-supplied field name; unknown names fall back to
    /// `created_at` rather than erroring, matching the listing contract.
    pub fn parse(value: &str) -> Self {
        match value {
            "title" => IssueSort::Title,
            "status" => IssueSort::Status,
            _ => IssueSort::CreatedAt,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            IssueSort::CreatedAt => "created_at",
            IssueSort::Title => "title",
            IssueSort::Status => "status",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Self {
        match value {
            "asc" => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filter/sort parameters for issue listings
#[derive(Debug, Clone, Copy)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub sort: IssueSort,
    pub order: SortOrder,
}

impl Default for IssueFilter {
    fn default() -> Self {
        Self {
            status: None,
            sort: IssueSort::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

/// Issue joined with its author's username
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct IssueWithAuthor {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub status: String,
    pub user_id: Id,
    pub team_id: Id,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// DTO for creating an issue
#[derive(Debug, Clone)]
pub struct CreateIssueDto {
    pub title: String,
    pub description: String,
    pub user_id: Id,
    pub team_id: Id,
}

pub struct IssueRepository {
    pool: PgPool,
}

impl IssueRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<Issue>> {
        let row = sqlx::query_as::<_, Issue>(
            r#"
            SELECT id, title, description, status, user_id, team_id, created_at
            FROM issues
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn find_with_author(&self, id: Id) -> RepositoryResult<Option<IssueWithAuthor>> {
        let row = sqlx::query_as::<_, IssueWithAuthor>(
            r#"
            SELECT i.id, i.title, i.description, i.status, i.user_id, i.team_id,
                   u.username, i.created_at
            FROM issues i
            LEFT JOIN users u ON u.id = i.user_id
            WHERE i.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Paginated listing of a team's issues
    pub async fn list_by_team(
        &self,
        team_id: Id,
        filter: IssueFilter,
        pagination: Pagination,
    ) -> RepositoryResult<PaginatedResult<IssueWithAuthor>> {
        // sort column/direction come from the allow-list enums, never from
        // the raw query string
        let sql = format!(
            r#"
            SELECT i.id, i.title, i.description, i.status, i.user_id, i.team_id,
                   u.username, i.created_at
            FROM issues i
            LEFT JOIN users u ON u.id = i.user_id
            WHERE i.team_id = $1 AND ($2::text IS NULL OR i.status = $2)
            ORDER BY i.{} {}
            LIMIT $3 OFFSET $4
            "#,
            filter.sort.column(),
            filter.order.keyword(),
        );

        let status = filter.status.map(|s| s.as_str());

        let items = sqlx::query_as::<_, IssueWithAuthor>(&sql)
            .bind(team_id)
            .bind(status)
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.pool)
            .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM issues WHERE team_id = $1 AND ($2::text IS NULL OR status = $2)",
        )
        .bind(team_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(PaginatedResult::new(items, total, pagination))
    }

    /// All issues for a team, newest first (web dashboard)
    pub async fn all_for_team(&self, team_id: Id) -> RepositoryResult<Vec<IssueWithAuthor>> {
        let rows = sqlx::query_as::<_, IssueWithAuthor>(
            r#"
            SELECT i.id, i.title, i.description, i.status, i.user_id, i.team_id,
                   u.username, i.created_at
            FROM issues i
            LEFT JOIN users u ON u.id = i.user_id
            WHERE i.team_id = $1
            ORDER BY i.created_at DESC
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn create(&self, dto: CreateIssueDto) -> RepositoryResult<Issue> {
        let row = sqlx::query_as::<_, Issue>(
            r#"
            INSERT INTO issues (title, description, user_id, team_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, status, user_id, team_id, created_at
            "#,
        )
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(dto.user_id)
        .bind(dto.team_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_status(&self, id: Id, status: IssueStatus) -> RepositoryResult<Issue> {
        let row = sqlx::query_as::<_, Issue>(
            r#"
            UPDATE issues SET status = $1
            WHERE id = $2
            RETURNING id, title, description, status, user_id, team_id, created_at
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            crate::repository::RepositoryError::NotFound(format!("Issue with id {} not found", id))
        })?;

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_allow_list() {
        assert_eq!(IssueSort::parse("title"), IssueSort::Title);
        assert_eq!(IssueSort::parse("status"), IssueSort::Status);
        assert_eq!(IssueSort::parse("created_at"), IssueSort::CreatedAt);
        // arbitrary field names never resolve to columns
        assert_eq!(IssueSort::parse("password_hash"), IssueSort::CreatedAt);
        assert_eq!(IssueSort::parse("id; DROP TABLE issues"), IssueSort::CreatedAt);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::parse("sideways"), SortOrder::Desc);
    }
}
