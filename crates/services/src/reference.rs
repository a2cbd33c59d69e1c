use std::sync::Arc;

use domain::{EcetDataset, FeedxError, ReferenceData};
use serde_json::Value;

/// Read-only ECET datasets.
#[derive(Clone)]
pub struct ReferenceService {
    data: Arc<dyn ReferenceData>,
}

impl ReferenceService {
    pub fn new(data: Arc<dyn ReferenceData>) -> Self {
        Self { data }
    }

    pub async fn ecet(&self, dataset: EcetDataset) -> Result<Value, FeedxError> {
        Ok(self.data.ecet(dataset).await?)
    }
}
