use std::sync::Arc;

use domain::users::AdminAction;
use domain::{AuditLog, Principal, Timestamp};
use tracing::warn;

/// Records administrative mutations. A failed audit write is logged and does
/// not undo the mutation it describes.
#[derive(Clone)]
pub(crate) struct Auditor {
    log: Arc<dyn AuditLog>,
}

impl Auditor {
    pub(crate) fn new(log: Arc<dyn AuditLog>) -> Self {
        Self { log }
    }

    pub(crate) async fn record(
        &self,
        actor: &Principal,
        verb: &str,
        resource_type: &str,
        resource_id: Option<String>,
    ) {
        let action = AdminAction::new(actor, verb, resource_type, resource_id, Timestamp::now());
        let name = action.action.clone();
        if let Err(e) = self.log.record_admin_action(action).await {
            warn!(action = %name, actor = %actor.username, error = %e, "audit entry not recorded");
        }
    }
}
