use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use domain::issues::{EscalationRequest, IssueDetail, IssueDraft, IssueView, ResponseDraft};
use domain::Issue;
use serde::Deserialize;

use crate::extract::{ApiJson, AuthUser};
use crate::{ApiError, AppState};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/issues", post(submit))
        .route("/api/issues/mine/active", get(my_active))
        .route("/api/issues/mine/resolved", get(my_resolved))
        .route("/api/issues/{id}", get(show))
        .route("/api/issues/{id}/escalate", post(escalate))
        .route("/api/faculty/issues", get(staff_list))
        .route("/api/faculty/issues/overdue", get(overdue))
        .route("/api/faculty/issues/{id}/respond", post(respond))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatusFilter {
    status: Option<String>,
}

async fn submit(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(draft): ApiJson<IssueDraft>,
) -> Result<(StatusCode, Json<Issue>), ApiError> {
    let issue = state.services.issues.submit(&caller, draft).await?;
    Ok((StatusCode::CREATED, Json(issue)))
}

async fn my_active(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<Issue>>, ApiError> {
    Ok(Json(state.services.issues.my_active(&caller).await?))
}

async fn my_resolved(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<Issue>>, ApiError> {
    Ok(Json(state.services.issues.my_resolved(&caller).await?))
}

async fn show(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<IssueDetail>, ApiError> {
    Ok(Json(state.services.issues.get(&caller, &id).await?))
}

async fn escalate(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<EscalationRequest>,
) -> Result<Json<IssueDetail>, ApiError> {
    Ok(Json(state.services.issues.escalate(&caller, &id, request).await?))
}

async fn staff_list(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<IssueView>>, ApiError> {
    let issues = state
        .services
        .issues
        .staff_list(&caller, filter.status.as_deref())
        .await?;
    Ok(Json(issues))
}

async fn overdue(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<IssueView>>, ApiError> {
    Ok(Json(state.services.issues.overdue(&caller).await?))
}

async fn respond(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    ApiJson(draft): ApiJson<ResponseDraft>,
) -> Result<Json<IssueDetail>, ApiError> {
    Ok(Json(state.services.issues.respond(&caller, &id, draft).await?))
}
