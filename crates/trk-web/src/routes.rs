//! Web routes

use axum::{
    routing::{get, post},
    Router,
};
use trk_api::AppState;

use crate::handlers::{auth, issues, teams};

/// Create the complete web router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login/google", get(auth::google_login))
        .route("/google-callback", get(auth::google_callback))
        .route("/logout", get(auth::logout))
        .route("/teams", get(teams::teams_page))
        .route(
            "/team/create",
            get(teams::create_team_page).post(teams::create_team),
        )
        .route(
            "/team/join",
            get(teams::join_team_page).post(teams::join_team),
        )
        .route("/teams/:team_id/dashboard", get(teams::dashboard))
        .route(
            "/issue/create",
            get(issues::create_issue_page).post(issues::create_issue),
        )
        .route("/issue/:id", get(issues::issue_detail))
        .route("/issue/:id/comment", post(issues::create_comment))
        .route("/issue/:id/toggle", post(issues::toggle_issue))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use trk_auth::{Session, SessionStore};
    use trk_core::AppConfig;

    fn test_state() -> AppState {
        AppState::without_database(AppConfig::default())
    }

    #[tokio::test]
    async fn test_login_page_renders() {
        let response = router()
            .with_state(test_state())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Sign in"));
        assert!(html.contains("/login/google"));
    }

    #[tokio::test]
    async fn test_protected_page_redirects_anonymous_to_login() {
        let response = router()
            .with_state(test_state())
            .oneshot(
                Request::builder()
                    .uri("/teams")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn test_stale_session_cookie_redirects_to_login() {
        let state = test_state();
        let session = Session::new(1, -10);
        let cookie = format!("{}={}", state.cookies.name, session.id);
        state.sessions.set(session).unwrap();

        let response = router()
            .with_state(state)
            .oneshot(
                Request::builder()
                    .uri("/teams")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn test_google_login_without_federation_redirects_with_message() {
        let response = router()
            .with_state(test_state())
            .oneshot(
                Request::builder()
                    .uri("/login/google")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("/?message="));
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let state = test_state();
        let session = Session::new(1, 3600);
        let cookie = format!("{}={}", state.cookies.name, session.id);
        let session_id = session.id.clone();
        state.sessions.set(session).unwrap();

        let response = router()
            .with_state(state.clone())
            .oneshot(
                Request::builder()
                    .uri("/logout")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.contains("Max-Age=0"));
        assert!(state.sessions.get(&session_id).is_none());
    }
}
