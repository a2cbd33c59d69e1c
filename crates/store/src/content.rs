use async_trait::async_trait;
use domain::{ContentId, ContentKind, ContentStore, StoreError, Timestamp};
use rusqlite::{params, OptionalExtension};
use serde_json::Value;

use crate::sql::{json_col, limit_param, to_json, SqlResultExt};
use crate::SqliteStore;

#[async_trait]
impl ContentStore for SqliteStore {
    async fn list(&self, kind: ContentKind, limit: Option<usize>) -> Result<Vec<Value>, StoreError> {
        self.call(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT document FROM content
                     WHERE kind = ?1
                     ORDER BY created_at DESC, rowid DESC
                     LIMIT ?2",
                )
                .store_err()?;
            let rows = stmt
                .query_map(params![kind.as_str(), limit_param(limit)], |row| json_col(row, 0))
                .store_err()?;
            rows.collect::<rusqlite::Result<Vec<Value>>>().store_err()
        })
        .await
    }

    async fn get(&self, kind: ContentKind, id: &ContentId) -> Result<Option<Value>, StoreError> {
        let id = id.clone();
        self.call(move |conn| {
            conn.query_row(
                "SELECT document FROM content WHERE kind = ?1 AND id = ?2",
                params![kind.as_str(), id.as_str()],
                |row| json_col(row, 0),
            )
            .optional()
            .store_err()
        })
        .await
    }

    async fn insert(
        &self,
        kind: ContentKind,
        id: &ContentId,
        created: Timestamp,
        document: Value,
    ) -> Result<(), StoreError> {
        let id = id.clone();
        let document = to_json(&document)?;
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO content (kind, id, created_at, document) VALUES (?1, ?2, ?3, ?4)",
                params![kind.as_str(), id.as_str(), created.to_sortable_string(), document],
            )
            .store_err()?;
            Ok(())
        })
        .await
    }

    async fn insert_or_ignore(
        &self,
        kind: ContentKind,
        id: &ContentId,
        created: Timestamp,
        document: Value,
    ) -> Result<bool, StoreError> {
        let id = id.clone();
        let document = to_json(&document)?;
        self.call(move |conn| {
            let n = conn
                .execute(
                    "INSERT OR IGNORE INTO content (kind, id, created_at, document) VALUES (?1, ?2, ?3, ?4)",
                    params![kind.as_str(), id.as_str(), created.to_sortable_string(), document],
                )
                .store_err()?;
            Ok(n > 0)
        })
        .await
    }

    async fn replace(
        &self,
        kind: ContentKind,
        id: &ContentId,
        document: Value,
    ) -> Result<bool, StoreError> {
        let id = id.clone();
        let document = to_json(&document)?;
        self.call(move |conn| {
            let n = conn
                .execute(
                    "UPDATE content SET document = ?3 WHERE kind = ?1 AND id = ?2",
                    params![kind.as_str(), id.as_str(), document],
                )
                .store_err()?;
            Ok(n > 0)
        })
        .await
    }

    async fn delete(&self, kind: ContentKind, id: &ContentId) -> Result<bool, StoreError> {
        let id = id.clone();
        self.call(move |conn| {
            let n = conn
                .execute(
                    "DELETE FROM content WHERE kind = ?1 AND id = ?2",
                    params![kind.as_str(), id.as_str()],
                )
                .store_err()?;
            Ok(n > 0)
        })
        .await
    }
}
