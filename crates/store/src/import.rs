//! One-shot import of JSON exports from earlier deployments.
//!
//! Reads `<kind>.json` for every content kind and `institutes.json` from a
//! directory. Existing ids are left untouched (insert-or-ignore), so the
//! import can be re-run safely.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use domain::content::check_document;
use domain::{ContentKind, ContentStore, Institute, InstituteStore, StoreError, Timestamp};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} does not contain a JSON array: {reason}")]
    Format { path: PathBuf, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What happened to one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCount {
    /// Collection name (`"events"`, `"institutes"`, ...).
    pub source: String,
    /// Records found in the file.
    pub read: usize,
    /// Records written.
    pub imported: usize,
    /// Records already present.
    pub existing: usize,
    /// Records that failed validation.
    pub invalid: usize,
}

impl ImportCount {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            read: 0,
            imported: 0,
            existing: 0,
            invalid: 0,
        }
    }
}

/// Imports every export file found in `dir`. Missing files are skipped.
pub async fn import_legacy(
    dir: &Path,
    content: &dyn ContentStore,
    institutes: &dyn InstituteStore,
) -> Result<Vec<ImportCount>, ImportError> {
    let mut report = Vec::new();

    for kind in ContentKind::ALL {
        let path = dir.join(format!("{}.json", kind.as_str()));
        let Some(records) = read_array(&path).await? else {
            continue;
        };
        let mut count = ImportCount::new(kind.as_str());
        for record in records {
            count.read += 1;
            let checked = match check_document(kind, with_string_id(record)) {
                Ok(checked) => checked,
                Err(e) => {
                    warn!(kind = %kind, error = %e, "skipping invalid record");
                    count.invalid += 1;
                    continue;
                }
            };
            if content
                .insert_or_ignore(kind, &checked.id, checked.created, checked.document)
                .await?
            {
                count.imported += 1;
            } else {
                count.existing += 1;
            }
        }
        info!(kind = %kind, read = count.read, imported = count.imported, "content imported");
        report.push(count);
    }

    let path = dir.join("institutes.json");
    if let Some(records) = read_array(&path).await? {
        let mut count = ImportCount::new("institutes");
        let now = Timestamp::now();
        for record in records {
            count.read += 1;
            let created = record
                .get("createdAt")
                .and_then(Value::as_str)
                .and_then(Timestamp::parse_rfc3339)
                .unwrap_or(now);
            let institute = match Institute::from_submission(record, None, created) {
                Ok(institute) => institute,
                Err(e) => {
                    warn!(error = %e, "skipping invalid institute");
                    count.invalid += 1;
                    continue;
                }
            };
            if institutes.insert_or_ignore(&institute).await? {
                count.imported += 1;
            } else {
                count.existing += 1;
            }
        }
        info!(read = count.read, imported = count.imported, "institutes imported");
        report.push(count);
    }

    Ok(report)
}

async fn read_array(path: &Path) -> Result<Option<Vec<Value>>, ImportError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ImportError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Array(records)) => Ok(Some(records)),
        Ok(_) => Err(ImportError::Format {
            path: path.to_path_buf(),
            reason: "top-level value is not an array".into(),
        }),
        Err(e) => Err(ImportError::Format {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

/// Hand-edited exports sometimes carry numeric ids.
fn with_string_id(mut record: Value) -> Value {
    if let Some(Value::Number(n)) = record.get("id") {
        let id = n.to_string();
        record["id"] = Value::String(id);
    }
    record
}
