use domain::FeedxError;
use thiserror::Error;

/// Failures inside the credential adapter.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// The token decoded but its claims do not describe a valid principal.
    #[error("malformed token claims: {0}")]
    Claims(&'static str),
}

impl From<AuthError> for FeedxError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Hash(e) => FeedxError::Configuration(format!("password hashing failed: {e}")),
            AuthError::Token(_) | AuthError::Claims(_) => {
                FeedxError::Unauthenticated("Invalid token".to_string())
            }
        }
    }
}
