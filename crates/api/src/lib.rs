//! FeedX HTTP surface.
//!
//! Translates HTTP requests into calls on [`services::Services`] and their
//! results back into JSON. Nothing here makes a domain decision: role checks,
//! validation, and workflow rules all live in the services.
//!
//! ## Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`error`] | `ApiError` and the `{ "error": ... }` response body |
//! | [`extract`] | Bearer-token and client-address extractors, JSON bodies |
//! | `routes` | One module per resource family |
//! | [`server`] | Router assembly, middleware, and graceful shutdown |
//!
//! ## Middleware
//!
//! Every route shares the same stack: request tracing, CORS for the
//! configured origins, and a body limit sized for the largest upload.

pub mod error;
pub mod extract;
mod routes;
pub mod server;

use std::path::PathBuf;
use std::sync::Arc;

use services::Services;

pub use error::ApiError;
pub use server::{router, serve};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
}

impl AppState {
    pub fn new(services: Services) -> Self {
        Self {
            services: Arc::new(services),
        }
    }
}

/// HTTP-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Origins allowed to make credentialed cross-origin requests.
    pub cors_origins: Vec<String>,
    /// Directory served under `/uploads`.
    pub uploads_dir: PathBuf,
    /// Built front-end to serve for every unmatched path, if any.
    pub static_dir: Option<PathBuf>,
}
