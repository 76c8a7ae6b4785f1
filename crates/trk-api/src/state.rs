//! Shared application state
//!
//! Every collaborator a handler needs is carried here explicitly; handlers
//! receive the state through the router rather than reaching for globals.

use sqlx::PgPool;
use std::sync::Arc;
use trk_auth::{
    AuthGate, CookieConfig, GoogleFederation, MemoryRevocationLedger, MemorySessionStore,
    RevocationLedger, SessionStore, TokenService,
};
use trk_core::AppConfig;

use crate::error::{ApiError, ApiResult};

/// Application state shared by the API and web routers
#[derive(Clone)]
pub struct AppState {
    /// Absent when the server runs without a reachable database
    pub db: Option<PgPool>,
    pub tokens: Arc<TokenService>,
    pub gate: Arc<AuthGate>,
    pub ledger: Arc<dyn RevocationLedger>,
    pub sessions: Arc<dyn SessionStore>,
    pub cookies: CookieConfig,
    /// Absent when Google federation is not configured
    pub federation: Option<Arc<GoogleFederation>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Pool handle, or 500 when the database is unavailable
    pub fn pool(&self) -> ApiResult<&PgPool> {
        self.db
            .as_ref()
            .ok_or_else(|| ApiError::internal("Database not available"))
    }

    /// State with in-memory stores and no database, for router tests
    pub fn without_database(config: AppConfig) -> Self {
        let tokens = Arc::new(TokenService::new(
            config.auth.jwt_secret.as_bytes(),
            config.auth.access_token_expires_seconds,
            config.auth.refresh_token_expires_seconds,
        ));
        let ledger: Arc<dyn RevocationLedger> = Arc::new(MemoryRevocationLedger::new());
        let gate = Arc::new(AuthGate::new(tokens.clone(), ledger.clone()));

        Self {
            db: None,
            tokens,
            gate,
            ledger,
            sessions: Arc::new(MemorySessionStore::new()),
            cookies: CookieConfig::development(),
            federation: None,
            config: Arc::new(config),
        }
    }
}
