use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use domain::{EcetDataset, ReferenceData, StoreError};
use serde_json::Value;
use tracing::debug;

/// Reads ECET datasets from `<dir>/ecet-*.json`.
#[derive(Debug, Clone)]
pub struct JsonReferenceData {
    dir: PathBuf,
}

impl JsonReferenceData {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ReferenceData for JsonReferenceData {
    async fn ecet(&self, dataset: EcetDataset) -> Result<Value, StoreError> {
        let path = self.dir.join(dataset.file_name());
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "reference dataset not published");
                return Ok(Value::Array(Vec::new()));
            }
            Err(e) => {
                return Err(StoreError::Backend(format!(
                    "cannot read {}: {e}",
                    path.display()
                )))
            }
        };
        serde_json::from_str(&text)
            .map_err(|e| StoreError::Backend(format!("{} is not valid JSON: {e}", path.display())))
    }
}
