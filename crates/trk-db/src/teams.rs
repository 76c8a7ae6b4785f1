//! Team and membership repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use trk_core::Id;
use trk_models::{Team, TeamMember, TeamRole};

use crate::repository::{RepositoryError, RepositoryResult};

/// A team joined with the caller's membership row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TeamMembership {
    pub team_id: Id,
    pub name: String,
    pub invite_code: String,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<Team>> {
        let row = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, invite_code, created_at
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Team>> {
        let row = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, invite_code, created_at
            FROM teams
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn find_by_invite_code(&self, invite_code: &str) -> RepositoryResult<Option<Team>> {
        let row = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, invite_code, created_at
            FROM teams
            WHERE invite_code = $1
            "#,
        )
        .bind(invite_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn create(&self, name: &str, invite_code: &str) -> RepositoryResult<Team> {
        let row = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (name, invite_code)
            VALUES ($1, $2)
            RETURNING id, name, invite_code, created_at
            "#,
        )
        .bind(name)
        .bind(invite_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "Team name already exists"))?;

        Ok(row)
    }

    /// Add a user to a team; duplicate membership surfaces as `Conflict`
    pub async fn add_member(
        &self,
        user_id: Id,
        team_id: Id,
        role: TeamRole,
    ) -> RepositoryResult<TeamMember> {
        let row = sqlx::query_as::<_, TeamMember>(
            r#"
            INSERT INTO team_members (user_id, team_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, team_id, role, joined_at
            "#,
        )
        .bind(user_id)
        .bind(team_id)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "Already a member of this team"))?;

        Ok(row)
    }

    pub async fn is_member(&self, user_id: Id, team_id: Id) -> RepositoryResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM team_members WHERE user_id = $1 AND team_id = $2)",
        )
        .bind(user_id)
        .bind(team_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// All teams the user belongs to, with their membership role
    pub async fn teams_for_user(&self, user_id: Id) -> RepositoryResult<Vec<TeamMembership>> {
        let rows = sqlx::query_as::<_, TeamMembership>(
            r#"
            SELECT t.id AS team_id, t.name, t.invite_code, m.role, m.joined_at
            FROM team_members m
            JOIN teams t ON t.id = m.team_id
            WHERE m.user_id = $1
            ORDER BY m.joined_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
