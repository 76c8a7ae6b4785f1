//! # trk-web
//!
//! Server-rendered web surface for Tracker RS: form login and registration,
//! the Google sign-in pages, team and issue screens. Authentication is
//! cookie-based against the server-side session store, independent of the
//! bearer-token API.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod views;

pub use error::{WebError, WebResult};
pub use routes::router;
