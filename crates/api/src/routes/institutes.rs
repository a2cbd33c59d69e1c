use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use domain::Institute;
use serde_json::{json, Value};

use crate::extract::{AdminUser, ApiJson};
use crate::{ApiError, AppState};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/institutes", get(list))
        .route("/api/institutes/{code}", get(show))
        .route("/api/admin/institutes", get(admin_list).post(save))
        .route("/api/admin/institutes/{code}", get(admin_show).delete(remove))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Institute>>, ApiError> {
    Ok(Json(state.services.institutes.list().await?))
}

async fn show(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Institute>, ApiError> {
    Ok(Json(state.services.institutes.get(&code).await?))
}

async fn admin_list(
    state: State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<Institute>>, ApiError> {
    list(state).await
}

async fn admin_show(
    state: State<AppState>,
    _admin: AdminUser,
    code: Path<String>,
) -> Result<Json<Institute>, ApiError> {
    show(state, code).await
}

async fn save(
    State(state): State<AppState>,
    AdminUser(caller): AdminUser,
    ApiJson(body): ApiJson<Value>,
) -> Result<(StatusCode, Json<Institute>), ApiError> {
    let institute = state.services.institutes.save(&caller, body).await?;
    Ok((StatusCode::CREATED, Json(institute)))
}

async fn remove(
    State(state): State<AppState>,
    AdminUser(caller): AdminUser,
    Path(code): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.services.institutes.delete(&caller, &code).await?;
    Ok(Json(json!({ "success": true })))
}
