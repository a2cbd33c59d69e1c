//! Router assembly and the serve loop.

use std::net::SocketAddr;

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use domain::uploads::{FILE_TOO_LARGE, MAX_UPLOAD_BYTES};
use domain::FeedxError;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::{routes, ApiError, AppState, HttpConfig};

/// Largest accepted request body: one maximum-size upload plus multipart
/// framing.
pub const BODY_LIMIT_BYTES: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

/// Builds the full application router.
pub fn router(state: AppState, config: &HttpConfig) -> Router {
    let app = routes::api()
        .nest_service("/uploads", ServeDir::new(&config.uploads_dir))
        .with_state(state);

    let app = match &config.static_dir {
        Some(dir) => {
            let index = dir.join("index.html");
            app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)))
        }
        None => app.fallback(not_found),
    };

    app.layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(middleware::from_fn(reject_oversized))
        .layer(cors(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// Serves `app` until Ctrl+C or SIGTERM.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    let address = listener.local_addr()?;
    info!("Server running on {address}");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

/// Rejects bodies whose declared length exceeds [`BODY_LIMIT_BYTES`].
async fn reject_oversized(request: Request, next: Next) -> Response {
    if declared_length(request.headers()).is_some_and(|len| len > BODY_LIMIT_BYTES) {
        return ApiError::from(FeedxError::validation(FILE_TOO_LARGE)).into_response();
    }
    next.run(request).await
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers.get(CONTENT_LENGTH)?.to_str().ok()?.trim().parse().ok()
}

async fn not_found() -> ApiError {
    FeedxError::NotFound { entity: "Route" }.into()
}

fn cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(_) if origin.trim() == "*" => {
                warn!("ignoring wildcard CORS origin; credentials need explicit origins");
                None
            }
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_and_malformed_origins_are_skipped() {
        let origins = vec![
            "*".to_string(),
            "bad\norigin".to_string(),
            "http://localhost:8080".to_string(),
        ];
        let _layer = cors(&origins);
    }

    #[test]
    fn declared_length_reads_content_length() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_length(&headers), None);
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("209715200"));
        assert_eq!(declared_length(&headers), Some(209_715_200));
    }
}
