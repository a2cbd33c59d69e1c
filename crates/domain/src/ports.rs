//! Port traits implemented by the infrastructure crates.
//!
//! Persistence ports report [`StoreError`]; credential ports report
//! [`FeedxError`] directly because their failures are client-facing
//! (bad token, bad password policy).
//!
//! All traits are object safe and used as `Arc<dyn Trait>` by the services.

use async_trait::async_trait;
use serde_json::Value;

use crate::content::ContentKind;
use crate::institutes::Institute;
use crate::issues::{Issue, IssueQuery, IssueResponse, IssueView};
use crate::reference::EcetDataset;
use crate::users::{AdminAction, AdminLogEntry, LoginAttempt, LoginLogEntry, NewUser, User};
use crate::{
    ContentId, FeedxError, InstituteCode, IssueId, IssueStatus, Principal, StoreError, Timestamp,
    UserId, Username,
};

// ---------------------------------------------------------------------------
// Accounts and audit
// ---------------------------------------------------------------------------

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn count(&self) -> Result<u64, StoreError>;

    /// Inserts a new account. A taken username or email is a
    /// [`StoreError::Conflict`].
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Looks an account up by username or email.
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, StoreError>;

    /// All accounts, newest first.
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    /// Returns `false` when no such account exists.
    async fn delete(&self, id: UserId) -> Result<bool, StoreError>;

    /// Returns `false` when no such account exists.
    async fn set_password(
        &self,
        username: &Username,
        password_hash: &str,
        at: Timestamp,
    ) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record_login(&self, attempt: LoginAttempt) -> Result<(), StoreError>;

    async fn record_admin_action(&self, action: AdminAction) -> Result<(), StoreError>;

    /// Newest first, optionally restricted to one login name.
    async fn login_logs(
        &self,
        username: Option<&str>,
        limit: usize,
    ) -> Result<Vec<LoginLogEntry>, StoreError>;

    /// Newest first.
    async fn admin_logs(&self, limit: usize) -> Result<Vec<AdminLogEntry>, StoreError>;
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Document storage for [`ContentKind`] collections.
///
/// Documents are opaque JSON here; typing happens in
/// [`crate::content`]. `created` orders listings, newest first.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn list(&self, kind: ContentKind, limit: Option<usize>) -> Result<Vec<Value>, StoreError>;

    async fn get(&self, kind: ContentKind, id: &ContentId) -> Result<Option<Value>, StoreError>;

    /// A duplicate id is a [`StoreError::Conflict`].
    async fn insert(
        &self,
        kind: ContentKind,
        id: &ContentId,
        created: Timestamp,
        document: Value,
    ) -> Result<(), StoreError>;

    /// Returns `false` when the id already exists (nothing is written).
    async fn insert_or_ignore(
        &self,
        kind: ContentKind,
        id: &ContentId,
        created: Timestamp,
        document: Value,
    ) -> Result<bool, StoreError>;

    /// Returns `false` when the id does not exist.
    async fn replace(
        &self,
        kind: ContentKind,
        id: &ContentId,
        document: Value,
    ) -> Result<bool, StoreError>;

    /// Returns `false` when the id does not exist.
    async fn delete(&self, kind: ContentKind, id: &ContentId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait InstituteStore: Send + Sync {
    /// In insertion order.
    async fn list(&self) -> Result<Vec<Institute>, StoreError>;

    async fn get(&self, code: &InstituteCode) -> Result<Option<Institute>, StoreError>;

    async fn upsert(&self, institute: &Institute) -> Result<(), StoreError>;

    /// Returns `false` when the code already exists (nothing is written).
    async fn insert_or_ignore(&self, institute: &Institute) -> Result<bool, StoreError>;

    /// Returns `false` when the code does not exist.
    async fn delete(&self, code: &InstituteCode) -> Result<bool, StoreError>;
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

#[async_trait]
pub trait IssueStore: Send + Sync {
    async fn insert(&self, issue: &Issue) -> Result<(), StoreError>;

    async fn get(&self, id: IssueId) -> Result<Option<Issue>, StoreError>;

    /// Newest first.
    async fn list(&self, query: &IssueQuery) -> Result<Vec<Issue>, StoreError>;

    /// Newest first, joined with the submitter profile for non-anonymous
    /// issues.
    async fn list_with_profiles(&self, query: &IssueQuery) -> Result<Vec<IssueView>, StoreError>;

    /// Oldest first.
    async fn responses(&self, id: IssueId) -> Result<Vec<IssueResponse>, StoreError>;

    /// Stores `response` and the issue state `updated` in one transaction.
    ///
    /// The write only happens while the stored status still equals
    /// `expected`; returns `false` (and writes nothing) otherwise.
    async fn apply_response(
        &self,
        response: &IssueResponse,
        updated: &Issue,
        expected: IssueStatus,
    ) -> Result<bool, StoreError>;

    /// Stores the escalation recorded on `updated`.
    ///
    /// The write only happens while the stored issue is active and not yet
    /// escalated; returns `false` otherwise.
    async fn escalate(&self, updated: &Issue) -> Result<bool, StoreError>;
}

// ---------------------------------------------------------------------------
// Files and reference data
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ReferenceData: Send + Sync {
    /// The dataset's JSON document; `[]` when it is not published.
    async fn ecet(&self, dataset: EcetDataset) -> Result<Value, StoreError>;
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Writes `bytes` at `relative_path` (slash-separated) under the uploads
    /// root, creating directories as needed.
    async fn save(&self, relative_path: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, FeedxError>;

    /// `false` for a wrong password or an unreadable hash.
    fn verify(&self, password: &str, password_hash: &str) -> bool;
}

pub trait TokenIssuer: Send + Sync {
    fn issue(&self, principal: &Principal, now: Timestamp) -> Result<String, FeedxError>;

    /// Fails with [`FeedxError::Unauthenticated`] for bad or expired tokens.
    fn verify(&self, token: &str) -> Result<Principal, FeedxError>;
}
