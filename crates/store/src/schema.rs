use domain::StoreError;
use rusqlite::Connection;

use crate::sql::SqlResultExt;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE,
    password    TEXT NOT NULL,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE,
    phone       TEXT NOT NULL,
    pin         TEXT NOT NULL,
    role        TEXT NOT NULL DEFAULT 'admin',
    department  TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS login_logs (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL,
    login_time  TEXT NOT NULL,
    ip_address  TEXT,
    success     INTEGER NOT NULL,
    device_info TEXT
);
CREATE INDEX IF NOT EXISTS login_logs_by_time ON login_logs (login_time DESC);

CREATE TABLE IF NOT EXISTS admin_logs (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL,
    action        TEXT NOT NULL,
    resource_type TEXT NOT NULL,
    resource_id   TEXT,
    created_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS admin_logs_by_time ON admin_logs (created_at DESC);

CREATE TABLE IF NOT EXISTS content (
    kind        TEXT NOT NULL,
    id          TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    document    TEXT NOT NULL,
    PRIMARY KEY (kind, id)
);
CREATE INDEX IF NOT EXISTS content_by_time ON content (kind, created_at DESC);

CREATE TABLE IF NOT EXISTS institutes (
    code        TEXT PRIMARY KEY,
    document    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS issues (
    id                 TEXT PRIMARY KEY,
    user_id            INTEGER NOT NULL,
    type               TEXT NOT NULL,
    category           TEXT NOT NULL,
    specify_category   TEXT,
    description        TEXT NOT NULL,
    sent_to            TEXT,
    faculty_name       TEXT,
    anonymous          INTEGER NOT NULL DEFAULT 0,
    proof_files        TEXT NOT NULL DEFAULT '[]',
    status             TEXT NOT NULL,
    escalated          INTEGER NOT NULL DEFAULT 0,
    escalation_reason  TEXT,
    escalated_to       TEXT,
    escalated_at       TEXT,
    resolution_message TEXT,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS issues_by_user ON issues (user_id, created_at DESC);
CREATE INDEX IF NOT EXISTS issues_by_status ON issues (status, created_at DESC);

CREATE TABLE IF NOT EXISTS issue_responses (
    id             TEXT PRIMARY KEY,
    issue_id       TEXT NOT NULL REFERENCES issues (id) ON DELETE CASCADE,
    responder_id   INTEGER NOT NULL,
    responder_name TEXT NOT NULL,
    message        TEXT NOT NULL,
    status         TEXT NOT NULL,
    created_at     TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS responses_by_issue ON issue_responses (issue_id, created_at);
"#;

/// Creates any missing tables and indexes.
pub(crate) fn apply(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA).store_err()
}
