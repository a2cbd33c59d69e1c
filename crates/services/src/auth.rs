use std::sync::Arc;

use domain::users::{ClientInfo, Credentials, LoginAttempt, NewUser, Session};
use domain::{
    AuditLog, FeedxError, PasswordHasher, Principal, Role, Timestamp, TokenIssuer, UserStore,
    Username,
};
use tracing::{info, instrument, warn};

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@feedxnexus.com";

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Login, token verification, and password maintenance.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    audit: Arc<dyn AuditLog>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        audit: Arc<dyn AuditLog>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            users,
            audit,
            hasher,
            tokens,
        }
    }

    /// Logs in by username or email. Every attempt is recorded.
    #[instrument(skip(self, credentials, client), fields(login = %credentials.username))]
    pub async fn login(
        &self,
        credentials: Credentials,
        client: ClientInfo,
    ) -> Result<Session, FeedxError> {
        credentials.validate()?;
        let login = credentials.username.trim().to_string();

        let user = self.users.find_by_login(&login).await?;
        let verified = match &user {
            Some(user) => {
                verify_password(&self.hasher, credentials.password, user.password_hash.clone())
                    .await?
            }
            None => false,
        };

        let attempt = LoginAttempt {
            username: login.clone(),
            client,
            success: verified,
            at: Timestamp::now(),
        };
        if let Err(e) = self.audit.record_login(attempt).await {
            warn!(error = %e, "login attempt not recorded");
        }

        let user = match user {
            Some(user) if verified => user,
            _ => {
                info!("login rejected");
                return Err(FeedxError::Unauthenticated(INVALID_CREDENTIALS.into()));
            }
        };

        let token = self.tokens.issue(&user.principal(), Timestamp::now())?;
        info!(user_id = %user.id, role = %user.role, "login succeeded");
        Ok(Session {
            token,
            user: user.public(),
        })
    }

    /// Recovers the caller from a bearer token.
    pub fn authenticate(&self, token: &str) -> Result<Principal, FeedxError> {
        self.tokens.verify(token)
    }

    /// Creates the `admin` account when no account exists yet.
    ///
    /// Returns `true` when the account was created.
    #[instrument(skip_all)]
    pub async fn ensure_default_admin(&self, password: &str) -> Result<bool, FeedxError> {
        if self.users.count().await? > 0 {
            return Ok(false);
        }
        let username = Username::new(DEFAULT_ADMIN_USERNAME)
            .ok_or_else(|| FeedxError::Configuration("default admin username is blank".into()))?;
        let password_hash = hash_password(&self.hasher, password.to_string()).await?;
        self.users
            .insert(NewUser {
                username,
                password_hash,
                name: "Administrator".into(),
                email: DEFAULT_ADMIN_EMAIL.into(),
                phone: "0000000000".into(),
                pin: "0000".into(),
                role: Role::Admin,
                department: None,
                created_at: Timestamp::now(),
            })
            .await?;
        info!(username = DEFAULT_ADMIN_USERNAME, "default admin account created");
        Ok(true)
    }

    /// Sets a new password for `username`.
    #[instrument(skip(self, password))]
    pub async fn reset_password(&self, username: &str, password: &str) -> Result<(), FeedxError> {
        if password.is_empty() {
            return Err(FeedxError::validation("Password is required"));
        }
        let username =
            Username::new(username.trim()).ok_or(FeedxError::NotFound { entity: "User" })?;
        let password_hash = hash_password(&self.hasher, password.to_string()).await?;
        if !self
            .users
            .set_password(&username, &password_hash, Timestamp::now())
            .await?
        {
            return Err(FeedxError::NotFound { entity: "User" });
        }
        info!(username = %username, "password reset");
        Ok(())
    }
}

/// Hashes on the blocking pool; bcrypt is deliberately slow.
pub(crate) async fn hash_password(
    hasher: &Arc<dyn PasswordHasher>,
    password: String,
) -> Result<String, FeedxError> {
    let hasher = Arc::clone(hasher);
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| FeedxError::Storage(format!("password task failed: {e}")))?
}

async fn verify_password(
    hasher: &Arc<dyn PasswordHasher>,
    password: String,
    password_hash: String,
) -> Result<bool, FeedxError> {
    let hasher = Arc::clone(hasher);
    tokio::task::spawn_blocking(move || hasher.verify(&password, &password_hash))
        .await
        .map_err(|e| FeedxError::Storage(format!("password task failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    fn client() -> ClientInfo {
        ClientInfo {
            ip_address: Some("192.168.1.20".into()),
            device_info: Some("Mozilla/5.0".into()),
        }
    }

    #[tokio::test]
    async fn default_admin_is_created_once_and_can_log_in() {
        let h = Harness::new();
        let auth = &h.services.auth;
        assert!(auth.ensure_default_admin("admin123").await.unwrap());
        assert!(!auth.ensure_default_admin("other").await.unwrap());

        let session = auth.login(credentials("admin", "admin123"), client()).await.unwrap();
        assert_eq!(session.user.username.as_str(), "admin");
        assert_eq!(session.user.role, Role::Admin);

        let principal = auth.authenticate(&session.token).unwrap();
        assert_eq!(principal.id, session.user.id);
    }

    #[tokio::test]
    async fn login_accepts_email() {
        let h = Harness::new();
        h.services.auth.ensure_default_admin("admin123").await.unwrap();
        let session = h
            .services
            .auth
            .login(credentials(DEFAULT_ADMIN_EMAIL, "admin123"), client())
            .await
            .unwrap();
        assert_eq!(session.user.email, DEFAULT_ADMIN_EMAIL);
    }

    #[tokio::test]
    async fn failures_do_not_reveal_which_part_was_wrong() {
        let h = Harness::new();
        h.services.auth.ensure_default_admin("admin123").await.unwrap();

        let wrong_password = h
            .services
            .auth
            .login(credentials("admin", "nope"), client())
            .await
            .unwrap_err();
        let unknown_user = h
            .services
            .auth
            .login(credentials("ghost", "admin123"), client())
            .await
            .unwrap_err();
        assert_eq!(wrong_password, unknown_user);
        assert_eq!(wrong_password, FeedxError::Unauthenticated("Invalid credentials".into()));
    }

    #[tokio::test]
    async fn every_attempt_is_logged() {
        let h = Harness::new();
        h.services.auth.ensure_default_admin("admin123").await.unwrap();
        let _ = h.services.auth.login(credentials("admin", "bad"), client()).await;
        let _ = h.services.auth.login(credentials("admin", "admin123"), client()).await;

        let logs = h.store.login_logs(None, 10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs[0].success);
        assert!(!logs[1].success);
        assert_eq!(logs[0].ip_address.as_deref(), Some("192.168.1.20"));
    }

    #[tokio::test]
    async fn blank_credentials_are_a_validation_error() {
        let h = Harness::new();
        let err = h.services.auth.login(credentials(" ", ""), client()).await.unwrap_err();
        assert!(matches!(err, FeedxError::Validation(_)));
    }

    #[tokio::test]
    async fn reset_password_replaces_the_hash() {
        let h = Harness::new();
        h.services.auth.ensure_default_admin("admin123").await.unwrap();
        h.services.auth.reset_password("admin", "n3w-pass").await.unwrap();

        assert!(h.services.auth.login(credentials("admin", "admin123"), client()).await.is_err());
        assert!(h.services.auth.login(credentials("admin", "n3w-pass"), client()).await.is_ok());
        assert_eq!(
            h.services.auth.reset_password("ghost", "x").await,
            Err(FeedxError::NotFound { entity: "User" })
        );
    }

    #[tokio::test]
    async fn foreign_tokens_are_rejected() {
        let h = Harness::new();
        assert!(matches!(
            h.services.auth.authenticate("eyJhbGciOiJIUzI1NiJ9.e30.sig"),
            Err(FeedxError::Unauthenticated(_))
        ));
    }
}
