//! Revocation ledger storage
//!
//! Append-only blocklist of token ids. Absence of a row means "still valid";
//! no pruning policy exists, so the table grows with every logout.

use sqlx::PgPool;
use trk_core::Id;
use trk_models::TokenKind;

use crate::repository::RepositoryResult;

pub struct RevokedTokenRepository {
    pool: PgPool,
}

impl RevokedTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a jti as revoked. Idempotent: revoking the same jti twice is a
    /// no-op rather than an error.
    pub async fn revoke(
        &self,
        jti: &str,
        kind: TokenKind,
        user_id: Option<Id>,
    ) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, kind, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(kind.as_str())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn is_revoked(&self, jti: &str) -> RepositoryResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE jti = $1)",
        )
        .bind(jti)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
