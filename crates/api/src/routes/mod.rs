use axum::Router;

use crate::AppState;

mod auth;
mod content;
mod files;
mod institutes;
mod issues;

/// Every `/api` route.
pub(crate) fn api() -> Router<AppState> {
    Router::new()
        .merge(files::routes())
        .merge(auth::routes())
        .merge(content::routes())
        .merge(institutes::routes())
        .merge(issues::routes())
}
