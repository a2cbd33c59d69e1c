//! Health, uploads, and the read-only reference datasets.

use axum::extract::{Multipart, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use domain::uploads::{StoredFile, UploadRequest};
use domain::{EcetDataset, FeedxError, Timestamp};
use serde_json::{json, Value};

use crate::extract::AuthUser;
use crate::{ApiError, AppState};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/ecet/{dataset}", get(ecet))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": Timestamp::now() }))
}

/// Multipart fields: `file` (required), `resourceName`, `fileCounter`.
async fn upload(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<StoredFile>, ApiError> {
    let mut file = None;
    let mut resource_name = None;
    let mut file_counter = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let original_name = field.file_name().unwrap_or("file").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                file = Some((original_name, mime_type, bytes.to_vec()));
            }
            Some("resourceName") => resource_name = Some(field.text().await?),
            Some("fileCounter") => file_counter = Some(field.text().await?),
            _ => {}
        }
    }

    let Some((original_name, mime_type, bytes)) = file else {
        return Err(ApiError::BadRequest("No file uploaded".into()));
    };
    let stored = state
        .services
        .uploads
        .store(
            &caller,
            UploadRequest {
                original_name,
                mime_type,
                bytes,
                resource_name,
                file_counter,
            },
        )
        .await?;
    Ok(Json(stored))
}

async fn ecet(
    State(state): State<AppState>,
    Path(dataset): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let dataset = EcetDataset::parse(&dataset).ok_or(FeedxError::NotFound { entity: "Dataset" })?;
    Ok(Json(state.services.reference.ecet(dataset).await?))
}
