//! API routes

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers::{auth, issues};
use crate::state::AppState;

/// Create the complete API router
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_router())
        .nest("/api/issues", issues_router())
}

fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout_access", delete(auth::logout_access))
        .route("/logout_refresh", delete(auth::logout_refresh))
        .route("/me", get(auth::me))
}

fn issues_router() -> Router<AppState> {
    Router::new()
        .route("/teams", get(issues::list_teams))
        .route("/teams/:team_id", get(issues::list_team_issues))
        .route("/teams/issue_detail/:issue_id", get(issues::issue_detail))
        .route("/teams/create", post(issues::create_issue))
        .route(
            "/issue_detail/:issue_id/comment",
            post(issues::create_comment),
        )
        .route("/:issue_id/toggle", post(issues::toggle_issue))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use trk_core::AppConfig;

    fn app() -> Router {
        router().with_state(AppState::without_database(AppConfig::default()))
    }

    fn test_state() -> AppState {
        AppState::without_database(AppConfig::default())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_register_missing_fields_is_400() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/auth/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username": "alice"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_me_without_token_is_401() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_bearer_is_401() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/issues/teams")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_refresh_accepts_only_refresh_tokens() {
        let state = test_state();
        let app = router().with_state(state.clone());

        let access = state.tokens.issue_access(1).unwrap();
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/auth/refresh")
                    .header(header::AUTHORIZATION, format!("Bearer {}", access.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_returns_new_access_token() {
        let state = test_state();
        let app = router().with_state(state.clone());

        let refresh = state.tokens.issue_refresh(7).unwrap();
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/auth/refresh")
                    .header(header::AUTHORIZATION, format!("Bearer {}", refresh.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let access = body["access_token"].as_str().unwrap();
        assert_eq!(state.tokens.decode(access).unwrap().user_id().unwrap(), 7);
    }

    #[tokio::test]
    async fn test_revoked_refresh_token_is_rejected() {
        let state = test_state();
        let refresh = state.tokens.issue_refresh(7).unwrap();
        let auth_header = format!("Bearer {}", refresh.token);

        let request = |uri: &str, method: Method| {
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, &auth_header)
                .body(Body::empty())
                .unwrap()
        };

        let response = router()
            .with_state(state.clone())
            .oneshot(request("/api/auth/logout_refresh", Method::DELETE))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // the same token no longer refreshes
        let response = router()
            .with_state(state)
            .oneshot(request("/api/auth/refresh", Method::POST))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
