//! Routes for the six content kinds.
//!
//! Each kind gets the same four paths; the handlers are generic over the
//! record type and instantiated once per kind in [`routes`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use domain::content::{ContentItem, Event, Notification, Resource, Spotlight, Testimonial, Update};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::extract::{AdminUser, ApiJson};
use crate::{ApiError, AppState};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .merge(kind::<Notification>())
        .merge(kind::<Update>())
        .merge(kind::<Resource>())
        .merge(kind::<Event>())
        .merge(kind::<Spotlight>())
        .merge(kind::<Testimonial>())
}

fn kind<T: ContentItem>() -> Router<AppState> {
    let name = T::KIND.as_str();
    Router::new()
        .route(&format!("/api/{name}"), get(list::<T>))
        .route(&format!("/api/{name}/{{id}}"), get(show::<T>))
        .route(
            &format!("/api/admin/{name}"),
            get(admin_list::<T>).post(create::<T>),
        )
        .route(
            &format!("/api/admin/{name}/{{id}}"),
            get(admin_show::<T>).put(update::<T>).delete(remove::<T>),
        )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListParams {
    limit: Option<String>,
}

impl ListParams {
    /// A positive `limit`; anything else defers to the kind's default.
    fn limit(&self) -> Option<usize> {
        self.limit
            .as_deref()
            .and_then(|l| l.trim().parse::<usize>().ok())
            .filter(|l| *l > 0)
    }
}

async fn list<T: ContentItem>(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<T>>, ApiError> {
    Ok(Json(state.services.content.list::<T>(params.limit()).await?))
}

async fn show<T: ContentItem>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<T>, ApiError> {
    Ok(Json(state.services.content.get::<T>(&id).await?))
}

async fn admin_list<T: ContentItem>(
    state: State<AppState>,
    _admin: AdminUser,
    params: Query<ListParams>,
) -> Result<Json<Vec<T>>, ApiError> {
    list::<T>(state, params).await
}

async fn admin_show<T: ContentItem>(
    state: State<AppState>,
    _admin: AdminUser,
    id: Path<String>,
) -> Result<Json<T>, ApiError> {
    show::<T>(state, id).await
}

async fn create<T: ContentItem>(
    State(state): State<AppState>,
    AdminUser(caller): AdminUser,
    ApiJson(body): ApiJson<Value>,
) -> Result<(StatusCode, Json<T>), ApiError> {
    let item = state.services.content.create::<T>(&caller, body).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update<T: ContentItem>(
    State(state): State<AppState>,
    AdminUser(caller): AdminUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<Value>,
) -> Result<Json<T>, ApiError> {
    Ok(Json(state.services.content.update::<T>(&caller, &id, patch).await?))
}

async fn remove<T: ContentItem>(
    State(state): State<AppState>,
    AdminUser(caller): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.services.content.delete::<T>(&caller, &id).await?;
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_must_be_a_positive_number() {
        let params = |l: &str| ListParams {
            limit: Some(l.to_string()),
        };
        assert_eq!(params("10").limit(), Some(10));
        assert_eq!(params("0").limit(), None);
        assert_eq!(params("ten").limit(), None);
        assert_eq!(params("-3").limit(), None);
        assert_eq!(ListParams::default().limit(), None);
    }
}
