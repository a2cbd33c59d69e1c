use std::sync::Arc;

use domain::{FeedxError, Institute, InstituteCode, InstituteStore, Principal, Timestamp};
use serde_json::Value;
use tracing::{info, instrument};

use crate::access::require_admin;
use crate::audit::Auditor;

/// The institute directory.
#[derive(Clone)]
pub struct InstituteService {
    store: Arc<dyn InstituteStore>,
    auditor: Auditor,
}

impl InstituteService {
    pub(crate) fn new(store: Arc<dyn InstituteStore>, auditor: Auditor) -> Self {
        Self { store, auditor }
    }

    pub async fn list(&self) -> Result<Vec<Institute>, FeedxError> {
        Ok(self.store.list().await?)
    }

    /// Case-insensitive lookup.
    pub async fn get(&self, code: &str) -> Result<Institute, FeedxError> {
        let Some(code) = InstituteCode::new(code) else {
            return Err(FeedxError::NotFound { entity: "Institute" });
        };
        self.store
            .get(&code)
            .await?
            .ok_or(FeedxError::NotFound { entity: "Institute" })
    }

    /// Creates or replaces the entry keyed by the body's `code`.
    #[instrument(skip(self, caller, body), fields(actor = %caller.username))]
    pub async fn save(&self, caller: &Principal, body: Value) -> Result<Institute, FeedxError> {
        require_admin(caller)?;
        let existing = match Institute::code_of(&body) {
            Some(code) => self.store.get(&code).await?,
            None => None,
        };
        let institute = Institute::from_submission(body, existing.as_ref(), Timestamp::now())?;
        self.store.upsert(&institute).await?;

        let verb = if existing.is_some() { "UPDATE" } else { "CREATE" };
        self.auditor
            .record(caller, verb, "INSTITUTE", Some(institute.code.to_string()))
            .await;
        info!(code = %institute.code, verb, "institute saved");
        Ok(institute)
    }

    /// Removing an unknown code succeeds without effect.
    #[instrument(skip(self, caller), fields(actor = %caller.username))]
    pub async fn delete(&self, caller: &Principal, code: &str) -> Result<(), FeedxError> {
        require_admin(caller)?;
        let Some(code) = InstituteCode::new(code) else {
            return Ok(());
        };
        let removed = self.store.delete(&code).await?;
        self.auditor
            .record(caller, "DELETE", "INSTITUTE", Some(code.to_string()))
            .await;
        info!(code = %code, removed, "institute deleted");
        Ok(())
    }
}
