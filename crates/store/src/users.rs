use async_trait::async_trait;
use domain::users::{AdminAction, AdminLogEntry, LoginAttempt, LoginLogEntry, NewUser, User};
use domain::{AuditLog, Role, StoreError, Timestamp, UserId, UserStore, Username};
use rusqlite::{params, OptionalExtension, Row};

use crate::sql::{limit_param, parse_col, timestamp_col, SqlResultExt};
use crate::SqliteStore;

const USER_COLUMNS: &str =
    "id, username, password, name, email, phone, pin, role, department, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId::new(row.get(0)?),
        username: parse_col(row, 1, |s| Username::new(s))?,
        password_hash: row.get(2)?,
        name: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        pin: row.get(6)?,
        role: parse_col(row, 7, Role::parse)?,
        department: row.get(8)?,
        created_at: timestamp_col(row, 9)?,
        updated_at: timestamp_col(row, 10)?,
    })
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn count(&self) -> Result<u64, StoreError> {
        self.call(|conn| {
            let n: i64 = conn
                .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
                .store_err()?;
            Ok(u64::try_from(n).unwrap_or(0))
        })
        .await
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        self.call(move |conn| {
            let created = user.created_at.to_sortable_string();
            conn.execute(
                "INSERT INTO users (username, password, name, email, phone, pin, role, department, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    user.username.as_str(),
                    user.password_hash,
                    user.name,
                    user.email,
                    user.phone,
                    user.pin,
                    user.role.as_str(),
                    user.department,
                    created,
                ],
            )
            .store_err()?;
            Ok(User {
                id: UserId::new(conn.last_insert_rowid()),
                username: user.username,
                password_hash: user.password_hash,
                name: user.name,
                email: user.email,
                phone: user.phone,
                pin: user.pin,
                role: user.role,
                department: user.department,
                created_at: user.created_at,
                updated_at: user.created_at,
            })
        })
        .await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.call(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.as_i64()],
                user_from_row,
            )
            .optional()
            .store_err()
        })
        .await
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, StoreError> {
        let login = login.to_string();
        self.call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE username = ?1 OR email = ?1
                     ORDER BY username = ?1 DESC LIMIT 1"
                ),
                params![login],
                user_from_row,
            )
            .optional()
            .store_err()
        })
        .await
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        self.call(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
                ))
                .store_err()?;
            let rows = stmt.query_map([], user_from_row).store_err()?;
            rows.collect::<rusqlite::Result<Vec<_>>>().store_err()
        })
        .await
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        self.call(move |conn| {
            let n = conn
                .execute("DELETE FROM users WHERE id = ?1", params![id.as_i64()])
                .store_err()?;
            Ok(n > 0)
        })
        .await
    }

    async fn set_password(
        &self,
        username: &Username,
        password_hash: &str,
        at: Timestamp,
    ) -> Result<bool, StoreError> {
        let username = username.as_str().to_string();
        let password_hash = password_hash.to_string();
        self.call(move |conn| {
            let n = conn
                .execute(
                    "UPDATE users SET password = ?2, updated_at = ?3 WHERE username = ?1",
                    params![username, password_hash, at.to_sortable_string()],
                )
                .store_err()?;
            Ok(n > 0)
        })
        .await
    }
}

#[async_trait]
impl AuditLog for SqliteStore {
    async fn record_login(&self, attempt: LoginAttempt) -> Result<(), StoreError> {
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO login_logs (username, login_time, ip_address, success, device_info)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    attempt.username,
                    attempt.at.to_sortable_string(),
                    attempt.client.ip_address,
                    attempt.success,
                    attempt.client.device_info,
                ],
            )
            .store_err()?;
            Ok(())
        })
        .await
    }

    async fn record_admin_action(&self, action: AdminAction) -> Result<(), StoreError> {
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO admin_logs (username, action, resource_type, resource_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    action.username.as_str(),
                    action.action,
                    action.resource_type,
                    action.resource_id,
                    action.at.to_sortable_string(),
                ],
            )
            .store_err()?;
            Ok(())
        })
        .await
    }

    async fn login_logs(
        &self,
        username: Option<&str>,
        limit: usize,
    ) -> Result<Vec<LoginLogEntry>, StoreError> {
        let username = username.map(str::to_string);
        self.call(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, username, login_time, ip_address, success, device_info
                     FROM login_logs
                     WHERE ?1 IS NULL OR username = ?1
                     ORDER BY login_time DESC, id DESC
                     LIMIT ?2",
                )
                .store_err()?;
            let rows = stmt
                .query_map(params![username, limit_param(Some(limit))], |row| {
                    Ok(LoginLogEntry {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        login_time: timestamp_col(row, 2)?,
                        ip_address: row.get(3)?,
                        success: row.get(4)?,
                        device_info: row.get(5)?,
                    })
                })
                .store_err()?;
            rows.collect::<rusqlite::Result<Vec<_>>>().store_err()
        })
        .await
    }

    async fn admin_logs(&self, limit: usize) -> Result<Vec<AdminLogEntry>, StoreError> {
        self.call(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, username, action, resource_type, resource_id, created_at
                     FROM admin_logs
                     ORDER BY created_at DESC, id DESC
                     LIMIT ?1",
                )
                .store_err()?;
            let rows = stmt
                .query_map(params![limit_param(Some(limit))], |row| {
                    Ok(AdminLogEntry {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        action: row.get(2)?,
                        resource_type: row.get(3)?,
                        resource_id: row.get(4)?,
                        created_at: timestamp_col(row, 5)?,
                    })
                })
                .store_err()?;
            rows.collect::<rusqlite::Result<Vec<_>>>().store_err()
        })
        .await
    }
}
