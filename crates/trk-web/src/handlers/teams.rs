//! Web team handlers
//!
//! Team creation mints an invite code; joining goes through that code. The
//! dashboard records the selected team in the session so issue creation
//! knows which team it targets.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use rand::Rng;
use serde::Deserialize;
use trk_api::AppState;
use trk_core::Id;
use trk_db::{IssueRepository, RepositoryError, TeamRepository};
use trk_models::TeamRole;

use crate::error::{WebError, WebResult};
use crate::handlers::auth::MessageQuery;
use crate::handlers::require_session;
use crate::views;

const INVITE_CODE_LENGTH: usize = 8;

/// Generate a team invite code
fn generate_invite_code() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut rng = rand::rng();
    (0..INVITE_CODE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct CreateTeamForm {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JoinTeamForm {
    pub invite_code: Option<String>,
}

/// GET /teams
pub async fn teams_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MessageQuery>,
) -> WebResult<Html<String>> {
    let session = require_session(&state, &headers)?;

    let pool = state.pool()?;
    let teams = TeamRepository::new(pool.clone())
        .teams_for_user(session.user_id)
        .await?;

    Ok(Html(views::teams_page(
        &teams,
        session.api_tokens.as_ref(),
        query.message.as_deref(),
    )))
}

/// GET /team/create
pub async fn create_team_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MessageQuery>,
) -> WebResult<Html<String>> {
    require_session(&state, &headers)?;
    Ok(Html(views::team_create_page(query.message.as_deref())))
}

/// POST /team/create
pub async fn create_team(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<CreateTeamForm>,
) -> WebResult<Response> {
    let session = require_session(&state, &headers)?;

    let Some(name) = form.name.filter(|n| !n.trim().is_empty()) else {
        return Err(WebError::redirect("/team/create?message=Name+required"));
    };

    let pool = state.pool()?;
    let repo = TeamRepository::new(pool.clone());

    let team = match repo.create(name.trim(), &generate_invite_code()).await {
        Ok(team) => team,
        Err(RepositoryError::Conflict(_)) => {
            return Err(WebError::redirect(
                "/team/create?message=Team+name+already+exists",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    repo.add_member(session.user_id, team.id, TeamRole::Manager)
        .await?;

    tracing::info!(team_id = team.id, user_id = session.user_id, "team created");

    Ok(Redirect::to("/teams").into_response())
}

/// GET /team/join
pub async fn join_team_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MessageQuery>,
) -> WebResult<Html<String>> {
    require_session(&state, &headers)?;
    Ok(Html(views::team_join_page(query.message.as_deref())))
}

/// POST /team/join
pub async fn join_team(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<JoinTeamForm>,
) -> WebResult<Response> {
    let session = require_session(&state, &headers)?;

    let Some(invite_code) = form.invite_code.filter(|c| !c.trim().is_empty()) else {
        return Err(WebError::redirect("/team/join?message=Invite+code+required"));
    };

    let pool = state.pool()?;
    let repo = TeamRepository::new(pool.clone());

    let Some(team) = repo.find_by_invite_code(invite_code.trim()).await? else {
        return Err(WebError::redirect("/team/join?message=Unknown+invite+code"));
    };

    match repo
        .add_member(session.user_id, team.id, TeamRole::Member)
        .await
    {
        Ok(_) => Ok(Redirect::to("/teams").into_response()),
        Err(RepositoryError::Conflict(_)) => Err(WebError::redirect(
            "/teams?message=Already+a+member+of+that+team",
        )),
        Err(e) => Err(e.into()),
    }
}

/// GET /teams/:team_id/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(team_id): Path<Id>,
) -> WebResult<Html<String>> {
    let mut session = require_session(&state, &headers)?;

    let pool = state.pool()?;
    let team_repo = TeamRepository::new(pool.clone());

    if !team_repo.is_member(session.user_id, team_id).await? {
        return Err(WebError::redirect("/teams?message=Not+a+member+of+that+team"));
    }

    let team = team_repo
        .find_by_id(team_id)
        .await?
        .ok_or_else(|| WebError::NotFound(format!("Team with id {} not found", team_id)))?;

    // remember the team so /issue/create knows where to file
    session.current_team_id = Some(team_id);
    state
        .sessions
        .set(session)
        .map_err(|e| WebError::internal(e.to_string()))?;

    let issues = IssueRepository::new(pool.clone())
        .all_for_team(team_id)
        .await?;

    Ok(Html(views::dashboard_page(&team.name, &issues)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_code_shape() {
        let code = generate_invite_code();
        assert_eq!(code.len(), INVITE_CODE_LENGTH);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_invite_codes_are_random() {
        assert_ne!(generate_invite_code(), generate_invite_code());
    }
}
