//! Accounts, sessions, and the audit trail.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{FeedxError, Principal, Role, Timestamp, UserId, Username};

/// Maximum rows returned by the login and admin log listings.
pub const LOG_PAGE_LIMIT: usize = 100;

/// Lifetime of an issued session token, in hours.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// A stored account, including its password hash.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub pin: String,
    pub role: Role,
    pub department: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// The identity carried inside a session token.
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            username: self.username.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }

    /// The account as shown to clients (no password hash).
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            role: self.role,
            department: self.department.clone(),
            created_at: self.created_at,
        }
    }
}

/// Account fields safe to return to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: UserId,
    pub username: Username,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub department: Option<String>,
    pub created_at: Timestamp,
}

/// Request body for creating an account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub pin: String,
    /// Defaults to [`Role::Admin`].
    pub role: Option<Role>,
    pub department: Option<String>,
}

impl Registration {
    pub fn validate(&self) -> Result<Username, FeedxError> {
        let required = [
            &self.username,
            &self.password,
            &self.name,
            &self.email,
            &self.phone,
            &self.pin,
        ];
        if required.iter().any(|f| f.trim().is_empty()) {
            return Err(FeedxError::validation("All fields are required"));
        }
        Username::new(self.username.trim())
            .ok_or_else(|| FeedxError::validation("All fields are required"))
    }
}

/// Student PIN: admission number, branch code, roll, e.g. `23054-CPS-005`.
pub const STUDENT_PIN_PATTERN: &str = r"^\d{5}-[A-Z]{1,3}-\d{3}$";

/// Whether `pin` has the student PIN shape.
pub fn is_student_pin(pin: &str) -> bool {
    Regex::new(STUDENT_PIN_PATTERN).is_ok_and(|re| re.is_match(pin))
}

/// Request body for self-service sign-up by students and faculty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignUp {
    /// Students may leave this blank; their PIN becomes the username.
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Required for students.
    pub pin: String,
    pub role: Option<Role>,
    pub department: String,
}

impl SignUp {
    /// Checks the form and returns the account's role and username.
    pub fn validate(&self) -> Result<(Role, Username), FeedxError> {
        let role = match self.role {
            Some(role @ (Role::Student | Role::Faculty)) => role,
            _ => return Err(FeedxError::validation("Role must be student or faculty")),
        };
        let required = [&self.password, &self.name, &self.email, &self.department];
        if required.iter().any(|f| f.trim().is_empty()) {
            return Err(FeedxError::validation("Please fill in all required fields"));
        }

        let pin = self.pin.trim();
        if role == Role::Student {
            if pin.is_empty() {
                return Err(FeedxError::validation("PIN number is required for students"));
            }
            if !is_student_pin(pin) {
                return Err(FeedxError::validation(
                    "PIN must match format: 12345-ABC-123 (5 digits - Branch - 3 digits)",
                ));
            }
        }

        let username = match self.username.trim() {
            "" if role == Role::Student => pin,
            other => other,
        };
        let username = Username::new(username)
            .ok_or_else(|| FeedxError::validation("Please fill in all required fields"))?;
        Ok((role, username))
    }
}

/// An account ready to insert (password already hashed).
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: Username,
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub pin: String,
    pub role: Role,
    pub department: Option<String>,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Request body for `login`. `username` may also be an email address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn validate(&self) -> Result<(), FeedxError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            Err(FeedxError::validation("Username and password are required"))
        } else {
            Ok(())
        }
    }
}

/// A successful login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: PublicUser,
}

// ---------------------------------------------------------------------------
// Audit trail
// ---------------------------------------------------------------------------

/// Where a login attempt came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub device_info: Option<String>,
}

/// One login attempt to record.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginAttempt {
    /// The login name as typed (may be an email, may not exist).
    pub username: String,
    pub client: ClientInfo,
    pub success: bool,
    pub at: Timestamp,
}

/// A recorded login attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginLogEntry {
    pub id: i64,
    pub username: String,
    pub login_time: Timestamp,
    pub ip_address: Option<String>,
    pub success: bool,
    pub device_info: Option<String>,
}

/// One administrative mutation to record.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminAction {
    pub username: Username,
    /// Verb and resource, e.g. `"CREATE_USER"`, `"DELETE_EVENT"`.
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub at: Timestamp,
}

impl AdminAction {
    pub fn new(
        actor: &Principal,
        verb: &str,
        resource_type: &str,
        resource_id: Option<String>,
        at: Timestamp,
    ) -> Self {
        Self {
            username: actor.username.clone(),
            action: format!("{verb}_{}", resource_type.to_uppercase()),
            resource_type: resource_type.to_lowercase(),
            resource_id,
            at,
        }
    }
}

/// A recorded administrative mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminLogEntry {
    pub id: i64,
    pub username: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub created_at: Timestamp,
}
