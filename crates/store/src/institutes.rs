use async_trait::async_trait;
use domain::{Institute, InstituteCode, InstituteStore, StoreError};
use rusqlite::{params, OptionalExtension};

use crate::sql::{json_col, to_json, SqlResultExt};
use crate::SqliteStore;

#[async_trait]
impl InstituteStore for SqliteStore {
    async fn list(&self) -> Result<Vec<Institute>, StoreError> {
        self.call(|conn| {
            let mut stmt = conn
                .prepare("SELECT document FROM institutes ORDER BY rowid")
                .store_err()?;
            let rows = stmt.query_map([], |row| json_col(row, 0)).store_err()?;
            rows.collect::<rusqlite::Result<Vec<Institute>>>().store_err()
        })
        .await
    }

    async fn get(&self, code: &InstituteCode) -> Result<Option<Institute>, StoreError> {
        let code = code.clone();
        self.call(move |conn| {
            conn.query_row(
                "SELECT document FROM institutes WHERE code = ?1",
                params![code.as_str()],
                |row| json_col(row, 0),
            )
            .optional()
            .store_err()
        })
        .await
    }

    async fn upsert(&self, institute: &Institute) -> Result<(), StoreError> {
        let code = institute.code.clone();
        let document = to_json(institute)?;
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO institutes (code, document) VALUES (?1, ?2)
                 ON CONFLICT (code) DO UPDATE SET document = excluded.document",
                params![code.as_str(), document],
            )
            .store_err()?;
            Ok(())
        })
        .await
    }

    async fn insert_or_ignore(&self, institute: &Institute) -> Result<bool, StoreError> {
        let code = institute.code.clone();
        let document = to_json(institute)?;
        self.call(move |conn| {
            let n = conn
                .execute(
                    "INSERT OR IGNORE INTO institutes (code, document) VALUES (?1, ?2)",
                    params![code.as_str(), document],
                )
                .store_err()?;
            Ok(n > 0)
        })
        .await
    }

    async fn delete(&self, code: &InstituteCode) -> Result<bool, StoreError> {
        let code = code.clone();
        self.call(move |conn| {
            let n = conn
                .execute("DELETE FROM institutes WHERE code = ?1", params![code.as_str()])
                .store_err()?;
            Ok(n > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Timestamp;
    use serde_json::json;

    fn institute(code: &str, name: &str) -> Institute {
        Institute::from_submission(json!({ "code": code, "name": name, "district": "Warangal" }), None, Timestamp::now())
            .unwrap()
    }

    #[tokio::test]
    async fn upsert_replaces_in_place() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert(&institute("a1", "Alpha")).await.unwrap();
        store.upsert(&institute("b2", "Beta")).await.unwrap();
        store.upsert(&institute("A1", "Alpha Renamed")).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Alpha Renamed");
        assert_eq!(all[0].details["district"], "Warangal");
    }

    #[tokio::test]
    async fn lookups_use_the_normalised_code() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert(&institute("gptk", "GPT Karimnagar")).await.unwrap();

        let code = InstituteCode::new("Gptk").unwrap();
        assert_eq!(store.get(&code).await.unwrap().map(|i| i.name), Some("GPT Karimnagar".into()));
        assert!(!store.insert_or_ignore(&institute("GPTK", "Other")).await.unwrap());
        assert!(store.delete(&code).await.unwrap());
        assert!(!store.delete(&code).await.unwrap());
    }
}
