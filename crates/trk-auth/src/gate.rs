//! Authorization gate
//!
//! An explicit function invoked at the start of each protected handler: it
//! resolves the bearer token, validates the claims, and consults the
//! revocation ledger. Every failure collapses to a single 401 for callers;
//! the precise kind is logged here and nowhere else.

use std::sync::Arc;
use thiserror::Error;
use trk_core::Id;
use trk_models::TokenKind;

use crate::revocation::RevocationLedger;
use crate::token::{extract_bearer_token, TokenError, TokenService};

/// The caller's resolved identity for one request
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    pub user_id: Id,
    pub jti: String,
    pub kind: TokenKind,
}

/// Authentication failures; all map to 401 at the HTTP boundary
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    Missing,
    #[error("Invalid token")]
    Invalid,
    #[error("Token expired")]
    Expired,
    #[error("Token revoked")]
    Revoked,
    #[error("Wrong token kind")]
    WrongKind,
    #[error("Internal auth error: {0}")]
    Internal(String),
}

/// Gate resolving the caller's identity from an Authorization header
pub struct AuthGate {
    tokens: Arc<TokenService>,
    ledger: Arc<dyn RevocationLedger>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>, ledger: Arc<dyn RevocationLedger>) -> Self {
        Self { tokens, ledger }
    }

    /// Require a valid, unrevoked access token
    pub async fn require_access(
        &self,
        authorization: Option<&str>,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        self.require(authorization, TokenKind::Access).await
    }

    /// Require a valid, unrevoked refresh token
    pub async fn require_refresh(
        &self,
        authorization: Option<&str>,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        self.require(authorization, TokenKind::Refresh).await
    }

    async fn require(
        &self,
        authorization: Option<&str>,
        kind: TokenKind,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let token = authorization
            .and_then(extract_bearer_token)
            .ok_or(AuthError::Missing)?;

        let claims = self.tokens.decode_expecting(token, kind).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            match e {
                TokenError::Expired => AuthError::Expired,
                TokenError::WrongKind { .. } => AuthError::WrongKind,
                _ => AuthError::Invalid,
            }
        })?;

        if self
            .ledger
            .is_revoked(&claims.jti)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
        {
            tracing::debug!(jti = %claims.jti, "revoked token presented");
            return Err(AuthError::Revoked);
        }

        let user_id = claims.user_id().map_err(|_| AuthError::Invalid)?;

        Ok(AuthenticatedIdentity {
            user_id,
            jti: claims.jti,
            kind: claims.kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revocation::MemoryRevocationLedger;

    fn gate() -> (AuthGate, Arc<TokenService>) {
        let tokens = Arc::new(TokenService::new(
            b"test-secret-key-at-least-32-bytes",
            3600,
            604_800,
        ));
        let ledger = Arc::new(MemoryRevocationLedger::new());
        (AuthGate::new(tokens.clone(), ledger), tokens)
    }

    #[tokio::test]
    async fn test_valid_access_token_passes() {
        let (gate, tokens) = gate();
        let issued = tokens.issue_access(42).unwrap();
        let header = format!("Bearer {}", issued.token);

        let identity = gate.require_access(Some(&header)).await.unwrap();
        assert_eq!(identity.user_id, 42);
        assert_eq!(identity.jti, issued.jti);
        assert_eq!(identity.kind, TokenKind::Access);
    }

    #[tokio::test]
    async fn test_missing_header_fails() {
        let (gate, _) = gate();
        assert!(matches!(
            gate.require_access(None).await,
            Err(AuthError::Missing)
        ));
        assert!(matches!(
            gate.require_access(Some("Basic abc")).await,
            Err(AuthError::Missing)
        ));
    }

    #[tokio::test]
    async fn test_garbage_token_fails() {
        let (gate, _) = gate();
        assert!(matches!(
            gate.require_access(Some("Bearer not-a-jwt")).await,
            Err(AuthError::Invalid)
        ));
    }

    #[tokio::test]
    async fn test_refresh_token_rejected_as_access() {
        let (gate, tokens) = gate();
        let refresh = tokens.issue_refresh(1).unwrap();
        let header = format!("Bearer {}", refresh.token);

        assert!(matches!(
            gate.require_access(Some(&header)).await,
            Err(AuthError::WrongKind)
        ));
        assert!(gate.require_refresh(Some(&header)).await.is_ok());
    }

    #[tokio::test]
    async fn test_revoked_token_fails_before_expiry() {
        let tokens = Arc::new(TokenService::new(
            b"test-secret-key-at-least-32-bytes",
            3600,
            604_800,
        ));
        let ledger = Arc::new(MemoryRevocationLedger::new());
        let gate = AuthGate::new(tokens.clone(), ledger.clone());

        let issued = tokens.issue_access(5).unwrap();
        let header = format!("Bearer {}", issued.token);

        assert!(gate.require_access(Some(&header)).await.is_ok());

        ledger
            .revoke(&issued.jti, TokenKind::Access, Some(5))
            .await
            .unwrap();

        assert!(matches!(
            gate.require_access(Some(&header)).await,
            Err(AuthError::Revoked)
        ));
    }
}
