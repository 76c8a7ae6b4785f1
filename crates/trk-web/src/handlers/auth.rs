//! Web authentication handlers
//!
//! Form login/registration plus the Google federation pages. Successful
//! sign-in creates a server-side session and sets the cookie; the OAuth
//! callback additionally stashes a freshly minted API token pair in the
//! session for the frontend to display.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use rand::Rng;
use serde::Deserialize;
use trk_api::AppState;
use trk_auth::{
    derive_username, hash_password, verify_password, Session, StashedTokens, VerifyOutcome,
};
use trk_db::{CreateUserDto, RepositoryError, UserRepository};

use crate::error::{WebError, WebResult};
use crate::handlers::{current_session, redirect_with_cookie};
use crate::views;

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// GET /
pub async fn login_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MessageQuery>,
) -> Response {
    if current_session(&state, &headers).is_some() {
        return Redirect::to("/teams").into_response();
    }
    Html(views::login_page(query.message.as_deref())).into_response()
}

/// POST /
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> WebResult<Response> {
    let (Some(email), Some(password)) = (form.email, form.password) else {
        return Err(WebError::redirect("/?message=Email+and+password+required"));
    };

    let pool = state.pool()?;
    let repo = UserRepository::new(pool.clone());

    let Some(user) = repo.find_by_email(&email).await? else {
        return Err(WebError::redirect("/?message=Invalid+email+or+password"));
    };

    match verify_password(user.password_hash.as_deref(), &password) {
        VerifyOutcome::Verified => {}
        VerifyOutcome::Mismatch => {
            return Err(WebError::redirect("/?message=Invalid+email+or+password"));
        }
        VerifyOutcome::OAuthOnly => {
            return Err(WebError::redirect(
                "/?message=This+account+signs+in+with+Google",
            ));
        }
    }

    let session = Session::new(user.id, state.config.auth.session_lifetime_seconds);
    let cookie = state.cookies.build_cookie(&session.id);
    state
        .sessions
        .set(session)
        .map_err(|e| WebError::internal(e.to_string()))?;

    tracing::info!(user_id = user.id, "web login");

    Ok(redirect_with_cookie(cookie, "/teams"))
}

/// GET /register
pub async fn register_page(Query(query): Query<MessageQuery>) -> Html<String> {
    Html(views::register_page(query.message.as_deref()))
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> WebResult<Response> {
    let (Some(username), Some(email), Some(password)) =
        (form.username, form.email, form.password)
    else {
        return Err(WebError::redirect("/register?message=All+fields+required"));
    };
    if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(WebError::redirect("/register?message=All+fields+required"));
    }

    let pool = state.pool()?;
    let repo = UserRepository::new(pool.clone());

    let password_hash = hash_password(&password).map_err(|e| WebError::internal(e.to_string()))?;

    match repo
        .create(CreateUserDto {
            username,
            email,
            password_hash: Some(password_hash),
        })
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = user.id, "web registration");
            Ok(Redirect::to("/?message=Account+created,+sign+in").into_response())
        }
        Err(RepositoryError::Conflict(_)) => Err(WebError::redirect(
            "/register?message=Username+or+email+already+taken",
        )),
        Err(e) => Err(e.into()),
    }
}

/// GET /login/google
pub async fn google_login(State(state): State<AppState>) -> WebResult<Redirect> {
    let Some(federation) = state.federation.as_ref() else {
        return Err(WebError::redirect(
            "/?message=Google+sign-in+is+not+configured",
        ));
    };
    Ok(Redirect::to(&federation.begin_authorization()))
}

/// GET /google-callback
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> WebResult<Response> {
    let Some(federation) = state.federation.as_ref() else {
        return Err(WebError::redirect(
            "/?message=Google+sign-in+is+not+configured",
        ));
    };
    let (Some(code), Some(oauth_state)) = (query.code, query.state) else {
        return Err(WebError::redirect("/?message=Google+sign-in+failed"));
    };

    let profile = match federation.complete_authorization(&code, &oauth_state).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(error = %e, "federation callback failed");
            return Err(WebError::redirect("/?message=Google+sign-in+failed"));
        }
    };

    let pool = state.pool()?;
    let repo = UserRepository::new(pool.clone());

    let user = match repo.find_by_email(&profile.email).await? {
        Some(user) => user,
        None => create_federated_user(&repo, &profile.email, &profile.name).await?,
    };

    let mut session = Session::new(user.id, state.config.auth.session_lifetime_seconds);

    // token pair for the frontend to hand to API clients
    let access = state
        .tokens
        .issue_access(user.id)
        .map_err(|e| WebError::internal(e.to_string()))?;
    let refresh = state
        .tokens
        .issue_refresh(user.id)
        .map_err(|e| WebError::internal(e.to_string()))?;
    session.api_tokens = Some(StashedTokens {
        access_token: access.token,
        refresh_token: refresh.token,
    });

    let cookie = state.cookies.build_cookie(&session.id);
    state
        .sessions
        .set(session)
        .map_err(|e| WebError::internal(e.to_string()))?;

    tracing::info!(user_id = user.id, "federated login");

    Ok(redirect_with_cookie(cookie, "/teams"))
}

/// GET /logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(session) = current_session(&state, &headers) {
        let _ = state.sessions.delete(&session.id);
    }
    redirect_with_cookie(state.cookies.build_clear_cookie(), "/")
}

/// Create an account for a first-time federated sign-in.
///
/// The derived username can collide with an existing account; one retry with
/// a random suffix resolves it, after that the conflict surfaces.
async fn create_federated_user(
    repo: &UserRepository,
    email: &str,
    display_name: &str,
) -> WebResult<trk_models::User> {
    let username = derive_username(display_name);

    match repo
        .create(CreateUserDto {
            username: username.clone(),
            email: email.to_string(),
            password_hash: None,
        })
        .await
    {
        Ok(user) => Ok(user),
        Err(RepositoryError::Conflict(_)) => {
            let suffix: u32 = rand::rng().random_range(1000..10_000);
            let user = repo
                .create(CreateUserDto {
                    username: format!("{}{}", username, suffix),
                    email: email.to_string(),
                    password_hash: None,
                })
                .await?;
            Ok(user)
        }
        Err(e) => Err(e.into()),
    }
}
