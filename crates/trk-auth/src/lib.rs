//! # trk-auth
//!
//! Authentication and token lifecycle for Tracker RS.
//!
//! ## Features
//!
//! - Password hashing and verification (argon2)
//! - JWT access/refresh token issuance and verification
//! - Revocation ledger consulted on every authenticated request
//! - Explicit authorization gate invoked at the start of each handler
//! - Server-side sessions for the web flow
//! - Google OAuth2 federation bridge

pub mod federation;
pub mod gate;
pub mod password;
pub mod revocation;
pub mod session;
pub mod token;

pub use federation::{derive_username, FederationError, GoogleFederation, GoogleProfile};
pub use gate::{AuthError, AuthGate, AuthenticatedIdentity};
pub use password::{hash_password, verify_password, PasswordError, VerifyOutcome};
pub use revocation::{LedgerError, MemoryRevocationLedger, PgRevocationLedger, RevocationLedger};
pub use session::{
    extract_session_id, CookieConfig, MemorySessionStore, Session, SessionError, SessionStore,
    StashedTokens,
};
pub use token::{extract_bearer_token, Claims, IssuedToken, TokenError, TokenService};
