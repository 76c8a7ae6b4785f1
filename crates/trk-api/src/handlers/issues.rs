//! Team and issue API handlers
//!
//! Every operation here is scoped by team membership: the caller must belong
//! to the team owning the data, checked after the gate resolves the caller.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use trk_core::Id;
use trk_db::{
    CommentRepository, CommentWithAuthor, CreateCommentDto, CreateIssueDto, IssueFilter,
    IssueRepository, IssueSort, IssueWithAuthor, Pagination, SortOrder, TeamMembership,
    TeamRepository,
};
use trk_models::IssueStatus;

use crate::error::{ApiError, ApiResult};
use crate::handlers::auth::authorization;
use crate::state::AppState;

async fn require_membership(state: &AppState, user_id: Id, team_id: Id) -> ApiResult<()> {
    let pool = state.pool()?;
    let repo = TeamRepository::new(pool.clone());

    if !repo.is_member(user_id, team_id).await? {
        return Err(ApiError::forbidden("Not a member of this team"));
    }
    Ok(())
}

/// GET /api/issues/teams
pub async fn list_teams(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let identity = state.gate.require_access(authorization(&headers)).await?;

    let pool = state.pool()?;
    let repo = TeamRepository::new(pool.clone());
    let teams = repo.teams_for_user(identity.user_id).await?;

    Ok(Json(TeamListResponse { teams }))
}

/// GET /api/issues/teams/:team_id
pub async fn list_team_issues(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(team_id): Path<Id>,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let identity = state.gate.require_access(authorization(&headers)).await?;
    require_membership(&state, identity.user_id, team_id).await?;

    let filter = IssueFilter {
        status: query.status.as_deref().and_then(parse_status_filter),
        sort: IssueSort::parse(query.sort.as_deref().unwrap_or("created_at")),
        order: SortOrder::parse(query.order.as_deref().unwrap_or("desc")),
    };
    let pagination = Pagination::page(query.page, query.per_page);

    let pool = state.pool()?;
    let repo = IssueRepository::new(pool.clone());
    let result = repo.list_by_team(team_id, filter, pagination).await?;

    Ok(Json(IssueListResponse {
        page: result.page(),
        total_pages: result.total_pages(),
        total: result.total,
        issues: result.items,
    }))
}

/// GET /api/issues/teams/issue_detail/:issue_id
pub async fn issue_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(issue_id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let identity = state.gate.require_access(authorization(&headers)).await?;

    let pool = state.pool()?;
    let issue = IssueRepository::new(pool.clone())
        .find_with_author(issue_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Issue", issue_id))?;

    require_membership(&state, identity.user_id, issue.team_id).await?;

    let comments = CommentRepository::new(pool.clone())
        .list_for_issue(issue_id)
        .await?;

    Ok(Json(IssueDetailResponse { issue, comments }))
}

/// POST /api/issues/teams/create
pub async fn create_issue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(dto): Json<CreateIssueBody>,
) -> ApiResult<impl IntoResponse> {
    let identity = state.gate.require_access(authorization(&headers)).await?;

    let title = dto
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing field: title"))?;
    let team_id = dto
        .team_id
        .ok_or_else(|| ApiError::bad_request("Missing field: team_id"))?;
    let description = dto.description.unwrap_or_default();

    require_membership(&state, identity.user_id, team_id).await?;

    let pool = state.pool()?;
    let issue = IssueRepository::new(pool.clone())
        .create(CreateIssueDto {
            title,
            description,
            user_id: identity.user_id,
            team_id,
        })
        .await?;

    tracing::info!(issue_id = issue.id, team_id, "issue created");

    Ok((StatusCode::CREATED, Json(issue)))
}

/// POST /api/issues/issue_detail/:issue_id/comment
pub async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(issue_id): Path<Id>,
    Json(dto): Json<CreateCommentBody>,
) -> ApiResult<impl IntoResponse> {
    let identity = state.gate.require_access(authorization(&headers)).await?;

    let content = dto
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing field: content"))?;

    let pool = state.pool()?;
    let issue = IssueRepository::new(pool.clone())
        .find_by_id(issue_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Issue", issue_id))?;

    require_membership(&state, identity.user_id, issue.team_id).await?;

    let comment = CommentRepository::new(pool.clone())
        .create(CreateCommentDto {
            content,
            user_id: identity.user_id,
            issue_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// POST /api/issues/:issue_id/toggle
pub async fn toggle_issue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(issue_id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let identity = state.gate.require_access(authorization(&headers)).await?;

    let pool = state.pool()?;
    let repo = IssueRepository::new(pool.clone());

    let issue = repo
        .find_by_id(issue_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Issue", issue_id))?;

    require_membership(&state, identity.user_id, issue.team_id).await?;

    let updated = repo.update_status(issue_id, issue.status().next()).await?;

    Ok(Json(updated))
}

/// Only the three known statuses filter; anything else means no filter
fn parse_status_filter(value: &str) -> Option<IssueStatus> {
    match value {
        "open" => Some(IssueStatus::Open),
        "working" => Some(IssueStatus::Working),
        "resolved" => Some(IssueStatus::Resolved),
        _ => None,
    }
}

// DTOs

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct CreateIssueBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub team_id: Option<Id>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentBody {
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TeamListResponse {
    pub teams: Vec<TeamMembership>,
}

#[derive(Debug, Serialize)]
pub struct IssueListResponse {
    pub page: i64,
    pub total_pages: i64,
    pub total: i64,
    pub issues: Vec<IssueWithAuthor>,
}

#[derive(Debug, Serialize)]
pub struct IssueDetailResponse {
    pub issue: IssueWithAuthor,
    pub comments: Vec<CommentWithAuthor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_allow_list() {
        assert_eq!(parse_status_filter("open"), Some(IssueStatus::Open));
        assert_eq!(parse_status_filter("working"), Some(IssueStatus::Working));
        assert_eq!(parse_status_filter("resolved"), Some(IssueStatus::Resolved));
        assert_eq!(parse_status_filter("archived"), None);
        assert_eq!(parse_status_filter(""), None);
    }
}
