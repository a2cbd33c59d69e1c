//! FeedX application services.
//!
//! Each service sequences calls between the business rules in [`domain`] and
//! the persistence and credential ports. Authorization (role and ownership
//! checks) and audit logging happen here so every caller, HTTP or CLI, gets
//! the same behaviour.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Services contain no storage details and no wire
//! formats; they take and return domain types.
//!
//! | Service | Operations |
//! |---------|------------|
//! | [`AuthService`] | login, token verification, default admin, password reset |
//! | [`UserService`] | register, sign-up, list, delete, profile, login and admin logs |
//! | [`ContentService`] | list, get, create, update, delete for every content kind |
//! | [`InstituteService`] | list, get, save, delete |
//! | [`IssueService`] | submit, read, respond, escalate, overdue |
//! | [`UploadService`] | store an uploaded file |
//! | [`ReferenceService`] | ECET datasets |

mod access;
mod audit;
mod auth;
mod content;
mod institutes;
mod issues;
mod reference;
mod uploads;
mod users;

use std::sync::Arc;

use domain::{
    AuditLog, ContentStore, FileStore, InstituteStore, IssueStore, PasswordHasher, ReferenceData,
    TokenIssuer, UserStore,
};

pub use access::{require_admin, require_staff};
pub use auth::{AuthService, DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_USERNAME};
pub use content::ContentService;
pub use institutes::InstituteService;
pub use issues::IssueService;
pub use reference::ReferenceService;
pub use uploads::UploadService;
pub use users::UserService;

/// The ports the services are built from.
#[derive(Clone)]
pub struct Ports {
    pub users: Arc<dyn UserStore>,
    pub audit: Arc<dyn AuditLog>,
    pub content: Arc<dyn ContentStore>,
    pub institutes: Arc<dyn InstituteStore>,
    pub issues: Arc<dyn IssueStore>,
    pub reference: Arc<dyn ReferenceData>,
    pub files: Arc<dyn FileStore>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn TokenIssuer>,
}

/// Every service, wired to one set of ports.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub users: UserService,
    pub content: ContentService,
    pub institutes: InstituteService,
    pub issues: IssueService,
    pub uploads: UploadService,
    pub reference: ReferenceService,
}

impl Services {
    pub fn new(ports: Ports) -> Self {
        let auditor = audit::Auditor::new(Arc::clone(&ports.audit));
        Self {
            auth: AuthService::new(
                Arc::clone(&ports.users),
                Arc::clone(&ports.audit),
                Arc::clone(&ports.hasher),
                Arc::clone(&ports.tokens),
            ),
            users: UserService::new(
                Arc::clone(&ports.users),
                Arc::clone(&ports.audit),
                Arc::clone(&ports.hasher),
                auditor.clone(),
            ),
            content: ContentService::new(Arc::clone(&ports.content), auditor.clone()),
            institutes: InstituteService::new(Arc::clone(&ports.institutes), auditor),
            issues: IssueService::new(Arc::clone(&ports.issues)),
            uploads: UploadService::new(Arc::clone(&ports.files)),
            reference: ReferenceService::new(Arc::clone(&ports.reference)),
        }
    }
}
