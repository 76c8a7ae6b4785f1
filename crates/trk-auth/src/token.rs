//! JWT issuance and verification
//!
//! Access and refresh tokens share the signing secret but carry independent
//! lifetimes and a `kind` claim; every token gets a fresh v4 jti, which is
//! the revocation key.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trk_core::Id;
use trk_models::TokenKind;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Unique token id, the revocation key
    pub jti: String,
    /// Token kind (access or refresh)
    pub kind: TokenKind,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
}

impl Claims {
    /// Parse the subject back into a user id
    pub fn user_id(&self) -> Result<Id, TokenError> {
        self.sub.parse().map_err(|_| TokenError::MalformedSubject)
    }
}

/// Token errors, kept distinct so the gate can log the precise kind
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token is expired")]
    Expired,
    #[error("Invalid token: {0}")]
    InvalidSignature(String),
    #[error("Wrong token kind: expected {expected}, got {actual}")]
    WrongKind {
        expected: TokenKind,
        actual: TokenKind,
    },
    #[error("Token subject is not a user id")]
    MalformedSubject,
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),
}

/// A freshly minted token together with its revocation key and expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

/// Service for creating and validating access/refresh tokens
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl TokenService {
    /// Create a new token service with the given secret and lifetimes
    pub fn new(secret: &[u8], access_ttl_seconds: i64, refresh_ttl_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl_seconds,
            refresh_ttl_seconds,
        }
    }

    /// Mint a short-lived access token
    pub fn issue_access(&self, user_id: Id) -> Result<IssuedToken, TokenError> {
        self.issue(user_id, TokenKind::Access, self.access_ttl_seconds)
    }

    /// Mint a long-lived refresh token
    pub fn issue_refresh(&self, user_id: Id) -> Result<IssuedToken, TokenError> {
        self.issue(user_id, TokenKind::Refresh, self.refresh_ttl_seconds)
    }

    fn issue(&self, user_id: Id, kind: TokenKind, ttl_seconds: i64) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(ttl_seconds);
        let jti = uuid::Uuid::new_v4().to_string();

        let claims = Claims {
            sub: user_id.to_string(),
            jti: jti.clone(),
            kind,
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))?;

        Ok(IssuedToken {
            token,
            jti,
            expires_at,
        })
    }

    /// Validate signature and expiry, returning the claims
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidSignature(e.to_string()),
            })?;

        Ok(token_data.claims)
    }

    /// Validate and additionally require a specific token kind
    pub fn decode_expecting(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let claims = self.decode(token)?;
        if claims.kind != kind {
            return Err(TokenError::WrongKind {
                expected: kind,
                actual: claims.kind,
            });
        }
        Ok(claims)
    }
}

/// Extract bearer token from an Authorization header value
pub fn extract_bearer_token(authorization: &str) -> Option<&str> {
    if authorization.len() >= 7 && authorization[..7].eq_ignore_ascii_case("bearer ") {
        Some(authorization[7..].trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(b"test-secret-key-at-least-32-bytes", 3600, 604_800)
    }

    #[test]
    fn test_issue_and_decode_access_token() {
        let service = service();
        let issued = service.issue_access(1).unwrap();

        let claims = service.decode(&issued.token).unwrap();
        assert_eq!(claims.sub, "1");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.jti, issued.jti);
        assert_eq!(claims.user_id().unwrap(), 1);
    }

    #[test]
    fn test_jti_is_fresh_per_token() {
        let service = service();
        let a = service.issue_access(1).unwrap();
        let b = service.issue_access(1).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_expired_token() {
        let service = TokenService::new(b"test-secret-key-at-least-32-bytes", -10, -10);
        let issued = service.issue_access(1).unwrap();

        match service.decode(&issued.token) {
            Err(TokenError::Expired) => {}
            other => panic!("expected Expired, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let issued = service().issue_access(1).unwrap();
        let other = TokenService::new(b"a-completely-different-secret-key", 3600, 604_800);

        match other.decode(&issued.token) {
            Err(TokenError::InvalidSignature(_)) => {}
            other => panic!("expected InvalidSignature, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn test_kind_enforcement() {
        let service = service();
        let access = service.issue_access(7).unwrap();

        match service.decode_expecting(&access.token, TokenKind::Refresh) {
            Err(TokenError::WrongKind { expected, actual }) => {
                assert_eq!(expected, TokenKind::Refresh);
                assert_eq!(actual, TokenKind::Access);
            }
            other => panic!("expected WrongKind, got {:?}", other.map(|c| c.sub)),
        }

        let refresh = service.issue_refresh(7).unwrap();
        let claims = service.decode_expecting(&refresh.token, TokenKind::Refresh).unwrap();
        assert_eq!(claims.user_id().unwrap(), 7);
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token(""), None);
    }
}
