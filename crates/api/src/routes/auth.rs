use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use domain::users::{
    AdminLogEntry, Credentials, LoginLogEntry, PublicUser, Registration, SignUp,
};
use domain::{FeedxError, Principal, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::extract::{AdminUser, ApiJson, AuthUser, Client};
use crate::{ApiError, AppState};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/signup", post(sign_up))
        .route("/api/auth/verify", get(verify))
        .route("/api/auth/me", get(me))
        .route("/api/auth/users", get(list_users))
        .route("/api/auth/users/{id}", delete(delete_user))
        .route("/api/auth/login-logs", get(login_logs))
        .route("/api/auth/admin-logs", get(admin_logs))
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    message: &'static str,
    token: String,
    user: PublicUser,
}

#[derive(Debug, Serialize)]
struct VerifyResponse {
    valid: bool,
    user: Principal,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LogFilter {
    username: Option<String>,
}

async fn login(
    State(state): State<AppState>,
    Client(client): Client,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<LoginResponse>, ApiError> {
    let session = state.services.auth.login(credentials, client).await?;
    Ok(Json(LoginResponse {
        message: "Login successful",
        token: session.token,
        user: session.user,
    }))
}

async fn register(
    State(state): State<AppState>,
    AdminUser(caller): AdminUser,
    ApiJson(registration): ApiJson<Registration>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user = state.services.users.register(&caller, registration).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully", "user": user })),
    ))
}

async fn sign_up(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<SignUp>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user = state.services.users.sign_up(form).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Account created successfully", "user": user })),
    ))
}

async fn verify(AuthUser(caller): AuthUser) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        valid: true,
        user: caller,
    })
}

async fn me(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let user = state.services.users.me(&caller).await?;
    Ok(Json(json!({ "user": user })))
}

async fn list_users(
    State(state): State<AppState>,
    AdminUser(caller): AdminUser,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    Ok(Json(state.services.users.list(&caller).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    AdminUser(caller): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = id
        .parse::<i64>()
        .map(UserId::new)
        .map_err(|_| FeedxError::NotFound { entity: "User" })?;
    state.services.users.delete(&caller, id).await?;
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

async fn login_logs(
    State(state): State<AppState>,
    AdminUser(caller): AdminUser,
    Query(filter): Query<LogFilter>,
) -> Result<Json<Vec<LoginLogEntry>>, ApiError> {
    let logs = state
        .services
        .users
        .login_logs(&caller, filter.username.as_deref())
        .await?;
    Ok(Json(logs))
}

async fn admin_logs(
    State(state): State<AppState>,
    AdminUser(caller): AdminUser,
) -> Result<Json<Vec<AdminLogEntry>>, ApiError> {
    Ok(Json(state.services.users.admin_logs(&caller).await?))
}
