//! Comment repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use trk_core::Id;
use trk_models::Comment;

use crate::repository::RepositoryResult;

/// Comment joined with its author's username
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: Id,
    pub content: String,
    pub user_id: Id,
    pub issue_id: Id,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// DTO for creating a comment
#[derive(Debug, Clone)]
pub struct CreateCommentDto {
    pub content: String,
    pub user_id: Id,
    pub issue_id: Id,
}

pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, dto: CreateCommentDto) -> RepositoryResult<Comment> {
        let row = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (content, user_id, issue_id)
            VALUES ($1, $2, $3)
            RETURNING id, content, user_id, issue_id, created_at
            "#,
        )
        .bind(&dto.content)
        .bind(dto.user_id)
        .bind(dto.issue_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_for_issue(&self, issue_id: Id) -> RepositoryResult<Vec<CommentWithAuthor>> {
        let rows = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT c.id, c.content, c.user_id, c.issue_id, u.username, c.created_at
            FROM comments c
            LEFT JOIN users u ON u.id = c.user_id
            WHERE c.issue_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(issue_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
