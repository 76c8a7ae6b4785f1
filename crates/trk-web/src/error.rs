//! Web error handling
//!
//! User-recoverable failures redirect back to a page carrying a message in
//! the query string; everything else renders a plain error page.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use trk_api::ApiError;
use trk_db::RepositoryError;

use crate::views;

#[derive(Debug)]
pub enum WebError {
    /// Send the browser somewhere else, usually with a message query param
    Redirect(String),
    NotFound(String),
    Internal(String),
}

impl WebError {
    pub fn redirect(to: impl Into<String>) -> Self {
        WebError::Redirect(to.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        WebError::Internal(msg.into())
    }
}

impl From<RepositoryError> for WebError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => WebError::NotFound(msg),
            RepositoryError::Conflict(msg) => WebError::Internal(msg),
            RepositoryError::Database(e) => WebError::Internal(e.to_string()),
        }
    }
}

impl From<ApiError> for WebError {
    fn from(err: ApiError) -> Self {
        WebError::Internal(format!("{:?}", err))
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::Redirect(to) => Redirect::to(&to).into_response(),
            WebError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                Html(views::error_page(404, &msg)),
            )
                .into_response(),
            WebError::Internal(msg) => {
                tracing::error!(error = %msg, "web handler error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(views::error_page(500, "Something went wrong")),
                )
                    .into_response()
            }
        }
    }
}

pub type WebResult<T> = Result<T, WebError>;
