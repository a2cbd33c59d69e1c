//! Institute directory entries.
//!
//! An entry has a code and a name; every other field the admin form sends is
//! kept as-is in [`Institute::details`] and echoed back to readers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{FeedxError, InstituteCode, Timestamp};

/// One directory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Institute {
    pub code: InstituteCode,
    pub name: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Institute {
    /// Builds the entry to store for an upsert request.
    ///
    /// `existing` is the entry currently stored under the same code, if any;
    /// its `createdAt` survives the update.
    pub fn from_submission(
        body: Value,
        existing: Option<&Institute>,
        now: Timestamp,
    ) -> Result<Self, FeedxError> {
        let Value::Object(mut object) = body else {
            return Err(FeedxError::validation("Request body must be a JSON object"));
        };

        let code = object
            .remove("code")
            .and_then(|v| v.as_str().and_then(InstituteCode::new));
        let name = object
            .remove("name")
            .and_then(|v| v.as_str().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty());
        let (Some(code), Some(name)) = (code, name) else {
            return Err(FeedxError::validation("Code and name are required"));
        };

        object.remove("createdAt");
        object.remove("updatedAt");

        Ok(Self {
            code,
            name,
            details: object,
            created_at: existing.map_or(now, |e| e.created_at),
            updated_at: now,
        })
    }

    /// Parses the code from a request body without consuming it.
    pub fn code_of(body: &Value) -> Option<InstituteCode> {
        body.get("code")
            .and_then(Value::as_str)
            .and_then(InstituteCode::new)
    }
}
