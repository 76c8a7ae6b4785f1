//! Web issue handlers

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use trk_api::AppState;
use trk_core::Id;
use trk_db::{
    CommentRepository, CreateCommentDto, CreateIssueDto, IssueRepository, TeamRepository,
};
use trk_models::Issue;

use crate::error::{WebError, WebResult};
use crate::handlers::auth::MessageQuery;
use crate::handlers::require_session;
use crate::views;

#[derive(Debug, Deserialize)]
pub struct CreateIssueForm {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub content: Option<String>,
}

/// Load an issue the signed-in user may see
async fn issue_for_member(state: &AppState, user_id: Id, issue_id: Id) -> WebResult<Issue> {
    let pool = state.pool()?;

    let issue = IssueRepository::new(pool.clone())
        .find_by_id(issue_id)
        .await?
        .ok_or_else(|| WebError::NotFound(format!("Issue with id {} not found", issue_id)))?;

    if !TeamRepository::new(pool.clone())
        .is_member(user_id, issue.team_id)
        .await?
    {
        return Err(WebError::redirect("/teams?message=Not+a+member+of+that+team"));
    }

    Ok(issue)
}

/// GET /issue/:id
pub async fn issue_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(issue_id): Path<Id>,
) -> WebResult<Html<String>> {
    let session = require_session(&state, &headers)?;
    issue_for_member(&state, session.user_id, issue_id).await?;

    let pool = state.pool()?;
    let issue = IssueRepository::new(pool.clone())
        .find_with_author(issue_id)
        .await?
        .ok_or_else(|| WebError::NotFound(format!("Issue with id {} not found", issue_id)))?;

    let comments = CommentRepository::new(pool.clone())
        .list_for_issue(issue_id)
        .await?;

    Ok(Html(views::issue_detail_page(&issue, &comments)))
}

/// GET /issue/create
pub async fn create_issue_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MessageQuery>,
) -> WebResult<Response> {
    let session = require_session(&state, &headers)?;

    if session.current_team_id.is_none() {
        return Ok(Redirect::to("/teams?message=Select+a+team+first").into_response());
    }

    Ok(Html(views::issue_create_page(query.message.as_deref())).into_response())
}

/// POST /issue/create
pub async fn create_issue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<CreateIssueForm>,
) -> WebResult<Response> {
    let session = require_session(&state, &headers)?;

    let Some(team_id) = session.current_team_id else {
        return Err(WebError::redirect("/teams?message=Select+a+team+first"));
    };
    let Some(title) = form.title.filter(|t| !t.trim().is_empty()) else {
        return Err(WebError::redirect("/issue/create?message=Title+required"));
    };

    let pool = state.pool()?;

    if !TeamRepository::new(pool.clone())
        .is_member(session.user_id, team_id)
        .await?
    {
        return Err(WebError::redirect("/teams?message=Not+a+member+of+that+team"));
    }

    let issue = IssueRepository::new(pool.clone())
        .create(CreateIssueDto {
            title,
            description: form.description.unwrap_or_default(),
            user_id: session.user_id,
            team_id,
        })
        .await?;

    tracing::info!(issue_id = issue.id, team_id, "issue created via web");

    Ok(Redirect::to(&format!("/issue/{}", issue.id)).into_response())
}

/// POST /issue/:id/comment
pub async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(issue_id): Path<Id>,
    Form(form): Form<CommentForm>,
) -> WebResult<Response> {
    let session = require_session(&state, &headers)?;
    issue_for_member(&state, session.user_id, issue_id).await?;

    let Some(content) = form.content.filter(|c| !c.trim().is_empty()) else {
        return Err(WebError::redirect(&format!("/issue/{}", issue_id)));
    };

    let pool = state.pool()?;
    CommentRepository::new(pool.clone())
        .create(CreateCommentDto {
            content,
            user_id: session.user_id,
            issue_id,
        })
        .await?;

    Ok(Redirect::to(&format!("/issue/{}", issue_id)).into_response())
}

/// POST /issue/:id/toggle
pub async fn toggle_issue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(issue_id): Path<Id>,
) -> WebResult<Response> {
    let session = require_session(&state, &headers)?;
    let issue = issue_for_member(&state, session.user_id, issue_id).await?;

    let pool = state.pool()?;
    IssueRepository::new(pool.clone())
        .update_status(issue_id, issue.status().next())
        .await?;

    Ok(Redirect::to(&format!("/issue/{}", issue_id)).into_response())
}
