//! Core domain for FeedX.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, workflow rule, and error type used by the FeedX service.
//! Infrastructure crates implement the port traits defined here; they never
//! add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`UserId`, `IssueId`, `ContentId`, ...) |
//! | [`types`] | Shared value types (`Timestamp`, `Role`, `Principal`, `Priority`) |
//! | [`errors`] | `FeedxError` and the port-level `StoreError` |
//! | [`issues`] | Submissions, the status workflow, escalation |
//! | [`content`] | The six admin-managed content kinds |
//! | [`institutes`] | Institute directory entries |
//! | [`users`] | Accounts, sessions, audit records |
//! | [`uploads`] | Upload acceptance and placement policy |
//! | [`reference`] | ECET reference datasets |
//! | [`ports`] | Traits implemented by infrastructure crates |

pub mod content;
pub mod errors;
pub mod identifiers;
pub mod institutes;
pub mod issues;
pub mod ports;
pub mod reference;
pub mod types;
pub mod uploads;
pub mod users;

// Re-export the shared vocabulary at the crate root for downstream crates.
pub use content::{ContentItem, ContentKind};
pub use errors::{FeedxError, StoreError};
pub use identifiers::{ContentId, InstituteCode, IssueId, ResponseId, UserId, Username};
pub use institutes::Institute;
pub use issues::{Issue, IssueStatus, SubmissionType};
pub use ports::{
    AuditLog, ContentStore, FileStore, InstituteStore, IssueStore, PasswordHasher, ReferenceData,
    TokenIssuer, UserStore,
};
pub use reference::EcetDataset;
pub use types::{Principal, Priority, Role, Timestamp};
