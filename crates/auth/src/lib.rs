//! FeedX credential adapter.
//!
//! Implements the [`domain::PasswordHasher`] port with bcrypt and the
//! [`domain::TokenIssuer`] port with HS256 JSON Web Tokens.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Hash formats, token claims, and signing keys live here.
//! The services see only the domain ports and [`domain::Principal`].

mod errors;
mod password;
mod token;

pub use errors::AuthError;
pub use password::BcryptHasher;
pub use token::{Claims, JwtIssuer};
