//! Revocation ledger
//!
//! Blocklist of explicitly invalidated jti's, consulted on every
//! authenticated request. Postgres-backed in production, in-memory for
//! tests.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::RwLock;
use thiserror::Error;
use trk_core::Id;
use trk_db::RevokedTokenRepository;
use trk_models::TokenKind;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Revocation storage error: {0}")]
    Storage(String),
}

/// Append-only record of invalidated token ids
#[async_trait]
pub trait RevocationLedger: Send + Sync {
    /// Record a jti as revoked; must be idempotent
    async fn revoke(
        &self,
        jti: &str,
        kind: TokenKind,
        user_id: Option<Id>,
    ) -> Result<(), LedgerError>;

    /// Whether the jti has been revoked
    async fn is_revoked(&self, jti: &str) -> Result<bool, LedgerError>;
}

/// Postgres-backed ledger
pub struct PgRevocationLedger {
    repo: RevokedTokenRepository,
}

impl PgRevocationLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: RevokedTokenRepository::new(pool),
        }
    }
}

#[async_trait]
impl RevocationLedger for PgRevocationLedger {
    async fn revoke(
        &self,
        jti: &str,
        kind: TokenKind,
        user_id: Option<Id>,
    ) -> Result<(), LedgerError> {
        self.repo
            .revoke(jti, kind, user_id)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, LedgerError> {
        self.repo
            .is_revoked(jti)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }
}

/// In-memory ledger (tests and development)
#[derive(Default)]
pub struct MemoryRevocationLedger {
    entries: RwLock<HashSet<String>>,
}

impl MemoryRevocationLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationLedger for MemoryRevocationLedger {
    async fn revoke(
        &self,
        jti: &str,
        _kind: TokenKind,
        _user_id: Option<Id>,
    ) -> Result<(), LedgerError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| LedgerError::Storage("ledger lock poisoned".into()))?;
        entries.insert(jti.to_string());
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, LedgerError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| LedgerError::Storage("ledger lock poisoned".into()))?;
        Ok(entries.contains(jti))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_ledger_roundtrip() {
        let ledger = MemoryRevocationLedger::new();
        assert!(!ledger.is_revoked("jti-1").await.unwrap());

        ledger.revoke("jti-1", TokenKind::Access, Some(1)).await.unwrap();
        assert!(ledger.is_revoked("jti-1").await.unwrap());
        assert!(!ledger.is_revoked("jti-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let ledger = MemoryRevocationLedger::new();
        ledger.revoke("jti-1", TokenKind::Refresh, None).await.unwrap();
        ledger.revoke("jti-1", TokenKind::Refresh, None).await.unwrap();
        assert!(ledger.is_revoked("jti-1").await.unwrap());
    }
}
