//! # trk-api
//!
//! JSON API surface for Tracker RS: token-authenticated routes under
//! `/api/auth` and `/api/issues`, backed by the shared [`state::AppState`].

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use state::AppState;
