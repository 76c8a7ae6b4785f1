//! Web handlers
//!
//! Session resolution helpers shared by all pages live here; pages that
//! require a signed-in user redirect to the login page when the cookie is
//! missing or stale.

pub mod auth;
pub mod issues;
pub mod teams;

use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use trk_api::AppState;
use trk_auth::{extract_session_id, Session};

use crate::error::{WebError, WebResult};

/// Resolve the session referenced by the request cookie, if any
pub(crate) fn current_session(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    let session_id = extract_session_id(cookie_header, &state.cookies.name)?;
    state.sessions.get(&session_id)
}

/// Session or a redirect to the login page
pub(crate) fn require_session(state: &AppState, headers: &HeaderMap) -> WebResult<Session> {
    current_session(state, headers).ok_or_else(|| WebError::redirect("/"))
}

/// Redirect that also sets the session cookie
pub(crate) fn redirect_with_cookie(cookie: String, to: &str) -> Response {
    ([(header::SET_COOKIE, cookie)], Redirect::to(to)).into_response()
}
