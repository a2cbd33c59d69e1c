use std::sync::Arc;

use domain::users::{
    AdminLogEntry, LoginLogEntry, NewUser, PublicUser, Registration, SignUp, LOG_PAGE_LIMIT,
};
use domain::{
    AuditLog, FeedxError, PasswordHasher, Principal, Role, StoreError, Timestamp, UserId,
    UserStore,
};
use tracing::{info, instrument};

use crate::access::require_admin;
use crate::audit::Auditor;
use crate::auth::hash_password;

/// Account administration.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    audit: Arc<dyn AuditLog>,
    hasher: Arc<dyn PasswordHasher>,
    auditor: Auditor,
}

impl UserService {
    pub(crate) fn new(
        users: Arc<dyn UserStore>,
        audit: Arc<dyn AuditLog>,
        hasher: Arc<dyn PasswordHasher>,
        auditor: Auditor,
    ) -> Self {
        Self {
            users,
            audit,
            hasher,
            auditor,
        }
    }

    /// Creates an account. The role defaults to admin.
    #[instrument(skip(self, caller, registration), fields(actor = %caller.username))]
    pub async fn register(
        &self,
        caller: &Principal,
        registration: Registration,
    ) -> Result<PublicUser, FeedxError> {
        require_admin(caller)?;
        let username = registration.validate()?;
        let password_hash = hash_password(&self.hasher, registration.password).await?;

        let user = self
            .users
            .insert(NewUser {
                username,
                password_hash,
                name: registration.name.trim().to_string(),
                email: registration.email.trim().to_string(),
                phone: registration.phone.trim().to_string(),
                pin: registration.pin.trim().to_string(),
                role: registration.role.unwrap_or(Role::Admin),
                department: registration
                    .department
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty()),
                created_at: Timestamp::now(),
            })
            .await
            .map_err(duplicate_account)?;

        self.auditor
            .record(caller, "CREATE", "USER", Some(user.id.to_string()))
            .await;
        info!(user_id = %user.id, username = %user.username, role = %user.role, "account created");
        Ok(user.public())
    }

    /// Self-service account creation for students and faculty.
    #[instrument(skip(self, form), fields(role = ?form.role))]
    pub async fn sign_up(&self, form: SignUp) -> Result<PublicUser, FeedxError> {
        let (role, username) = form.validate()?;
        let password_hash = hash_password(&self.hasher, form.password).await?;

        let user = self
            .users
            .insert(NewUser {
                username,
                password_hash,
                name: form.name.trim().to_uppercase(),
                email: form.email.trim().to_string(),
                phone: form.phone.trim().to_string(),
                pin: form.pin.trim().to_string(),
                role,
                department: Some(form.department.trim().to_string()),
                created_at: Timestamp::now(),
            })
            .await
            .map_err(duplicate_account)?;

        info!(user_id = %user.id, username = %user.username, role = %user.role, "account signed up");
        Ok(user.public())
    }

    pub async fn list(&self, caller: &Principal) -> Result<Vec<PublicUser>, FeedxError> {
        require_admin(caller)?;
        let users = self.users.list().await?;
        Ok(users.iter().map(|u| u.public()).collect())
    }

    /// Deletes an account other than the caller's own.
    #[instrument(skip(self, caller), fields(actor = %caller.username))]
    pub async fn delete(&self, caller: &Principal, id: UserId) -> Result<(), FeedxError> {
        require_admin(caller)?;
        if caller.id == id {
            return Err(FeedxError::validation("You cannot delete your own account"));
        }
        if !self.users.delete(id).await? {
            return Err(FeedxError::NotFound { entity: "User" });
        }
        self.auditor
            .record(caller, "DELETE", "USER", Some(id.to_string()))
            .await;
        info!(user_id = %id, "account deleted");
        Ok(())
    }

    /// The caller's own account.
    pub async fn me(&self, caller: &Principal) -> Result<PublicUser, FeedxError> {
        self.users
            .find_by_id(caller.id)
            .await?
            .map(|u| u.public())
            .ok_or(FeedxError::NotFound { entity: "User" })
    }

    pub async fn login_logs(
        &self,
        caller: &Principal,
        username: Option<&str>,
    ) -> Result<Vec<LoginLogEntry>, FeedxError> {
        require_admin(caller)?;
        let username = username.map(str::trim).filter(|u| !u.is_empty());
        Ok(self.audit.login_logs(username, LOG_PAGE_LIMIT).await?)
    }

    pub async fn admin_logs(&self, caller: &Principal) -> Result<Vec<AdminLogEntry>, FeedxError> {
        require_admin(caller)?;
        Ok(self.audit.admin_logs(LOG_PAGE_LIMIT).await?)
    }
}

fn duplicate_account(err: StoreError) -> FeedxError {
    match err {
        StoreError::Conflict(_) => FeedxError::Conflict("Username or email already exists".into()),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use domain::users::{ClientInfo, Credentials, LoginAttempt};

    fn registration(username: &str, email: &str) -> Registration {
        Registration {
            username: username.into(),
            password: "faculty-pass".into(),
            name: "Dr. Rao".into(),
            email: email.into(),
            phone: "9876543210".into(),
            pin: "F-102".into(),
            role: Some(Role::Faculty),
            department: Some("  ".into()),
        }
    }

    #[tokio::test]
    async fn admins_register_accounts_that_can_log_in() {
        let h = Harness::new();
        let admin = h.account("root", Role::Admin).await;

        let user = h
            .services
            .users
            .register(&admin, registration("rao", "rao@college.edu"))
            .await
            .unwrap();
        assert_eq!(user.role, Role::Faculty);
        assert_eq!(user.department, None);

        let session = h
            .services
            .auth
            .login(
                Credentials {
                    username: "rao".into(),
                    password: "faculty-pass".into(),
                },
                ClientInfo::default(),
            )
            .await
            .unwrap();
        assert_eq!(session.user.id, user.id);

        let log = h.services.users.admin_logs(&admin).await.unwrap();
        assert_eq!(log[0].action, "CREATE_USER");
        assert_eq!(log[0].resource_id.as_deref(), Some(user.id.to_string().as_str()));
    }

    #[tokio::test]
    async fn students_sign_up_with_their_pin() {
        let h = Harness::new();
        let user = h
            .services
            .users
            .sign_up(SignUp {
                password: "student-pass".into(),
                name: "ravi kumar".into(),
                email: "ravi@college.edu".into(),
                pin: "23054-CPS-005".into(),
                role: Some(Role::Student),
                department: "CME".into(),
                ..SignUp::default()
            })
            .await
            .unwrap();
        assert_eq!(user.role, Role::Student);
        assert_eq!(user.username.as_str(), "23054-CPS-005");
        assert_eq!(user.name, "RAVI KUMAR");
        assert_eq!(user.department.as_deref(), Some("CME"));

        let again = h
            .services
            .users
            .sign_up(SignUp {
                username: "23054-CPS-005".into(),
                password: "x".into(),
                name: "Other".into(),
                email: "other@college.edu".into(),
                role: Some(Role::Faculty),
                department: "EEE".into(),
                ..SignUp::default()
            })
            .await;
        assert_eq!(
            again,
            Err(FeedxError::Conflict("Username or email already exists".into()))
        );
    }

    #[tokio::test]
    async fn sign_up_cannot_create_admins() {
        let h = Harness::new();
        let result = h
            .services
            .users
            .sign_up(SignUp {
                username: "boss".into(),
                password: "x".into(),
                name: "Boss".into(),
                email: "boss@college.edu".into(),
                role: Some(Role::Admin),
                department: "CME".into(),
                ..SignUp::default()
            })
            .await;
        assert!(matches!(result, Err(FeedxError::Validation(_))));
    }

    #[tokio::test]
    async fn role_defaults_to_admin() {
        let h = Harness::new();
        let admin = h.account("root", Role::Admin).await;
        let mut reg = registration("second", "second@college.edu");
        reg.role = None;
        let user = h.services.users.register(&admin, reg).await.unwrap();
        assert_eq!(user.role, Role::Admin);
    }

    #[tokio::test]
    async fn duplicates_are_reported_as_one_conflict() {
        let h = Harness::new();
        let admin = h.account("root", Role::Admin).await;
        h.services
            .users
            .register(&admin, registration("rao", "rao@college.edu"))
            .await
            .unwrap();

        for reg in [
            registration("rao", "other@college.edu"),
            registration("other", "rao@college.edu"),
        ] {
            assert_eq!(
                h.services.users.register(&admin, reg).await,
                Err(FeedxError::Conflict("Username or email already exists".into()))
            );
        }
    }

    #[tokio::test]
    async fn non_admins_cannot_manage_accounts() {
        let h = Harness::new();
        let faculty = h.account("rao", Role::Faculty).await;
        assert!(matches!(
            h.services.users.register(&faculty, registration("x", "x@y.z")).await,
            Err(FeedxError::Forbidden(_))
        ));
        assert!(matches!(
            h.services.users.list(&faculty).await,
            Err(FeedxError::Forbidden(_))
        ));
        assert!(matches!(
            h.services.users.login_logs(&faculty, None).await,
            Err(FeedxError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn delete_refuses_self_and_missing_accounts() {
        let h = Harness::new();
        let admin = h.account("root", Role::Admin).await;
        let student = h.account("22001-CM-001", Role::Student).await;

        assert!(matches!(
            h.services.users.delete(&admin, admin.id).await,
            Err(FeedxError::Validation(_))
        ));
        h.services.users.delete(&admin, student.id).await.unwrap();
        assert_eq!(
            h.services.users.delete(&admin, student.id).await,
            Err(FeedxError::NotFound { entity: "User" })
        );
        let names: Vec<_> = h
            .services
            .users
            .list(&admin)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec![admin.username.clone()]);
    }

    #[tokio::test]
    async fn me_returns_the_callers_profile() {
        let h = Harness::new();
        let student = h.account("22001-CM-001", Role::Student).await;
        let me = h.services.users.me(&student).await.unwrap();
        assert_eq!(me.email, "22001-CM-001@college.edu");
    }

    #[tokio::test]
    async fn login_logs_filter_by_username() {
        let h = Harness::new();
        let admin = h.account("root", Role::Admin).await;
        for name in ["alice", "bob", "alice"] {
            h.store
                .record_login(LoginAttempt {
                    username: name.into(),
                    client: ClientInfo::default(),
                    success: false,
                    at: Timestamp::now(),
                })
                .await
                .unwrap();
        }
        assert_eq!(h.services.users.login_logs(&admin, Some("alice")).await.unwrap().len(), 2);
        assert_eq!(h.services.users.login_logs(&admin, Some(" ")).await.unwrap().len(), 3);
    }
}
