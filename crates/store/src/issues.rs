use async_trait::async_trait;
use domain::issues::{
    Escalation, Issue, IssueQuery, IssueResponse, IssueView, SubmissionType, SubmitterProfile,
};
use domain::{IssueId, IssueStatus, IssueStore, ResponseId, StoreError, UserId};
use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use crate::sql::{json_col, parse_col, timestamp_col, to_json, SqlResultExt};
use crate::SqliteStore;

/// Issue columns, always selected from the `issues` table aliased as `i`.
const ISSUE_COLUMNS: &str = "i.id, i.user_id, i.type, i.category, i.specify_category, \
    i.description, i.sent_to, i.faculty_name, i.anonymous, i.proof_files, i.status, \
    i.escalated, i.escalation_reason, i.escalated_to, i.escalated_at, i.resolution_message, \
    i.created_at, i.updated_at";

const ISSUE_COLUMN_COUNT: usize = 18;

const ACTIVE_STATUSES_SQL: &str = "('open', 'submitted', 'in_progress')";

fn issue_from_row(row: &Row<'_>) -> rusqlite::Result<Issue> {
    let escalation = match row.get::<_, Option<String>>(12)? {
        Some(reason) => Some(Escalation {
            reason,
            escalated_to: row.get(13)?,
            escalated_at: timestamp_col(row, 14)?,
        }),
        None => None,
    };
    Ok(Issue {
        id: parse_col(row, 0, IssueId::parse)?,
        user_id: UserId::new(row.get(1)?),
        submission_type: parse_col(row, 2, SubmissionType::parse)?,
        category: row.get(3)?,
        specify_category: row.get(4)?,
        description: row.get(5)?,
        sent_to: row.get(6)?,
        faculty_name: row.get(7)?,
        anonymous: row.get(8)?,
        proof_files: json_col(row, 9)?,
        status: parse_col(row, 10, IssueStatus::parse)?,
        escalated: row.get(11)?,
        escalation,
        resolution_message: row.get(15)?,
        created_at: timestamp_col(row, 16)?,
        updated_at: timestamp_col(row, 17)?,
    })
}

fn view_from_row(row: &Row<'_>) -> rusqlite::Result<IssueView> {
    let issue = issue_from_row(row)?;
    let base = ISSUE_COLUMN_COUNT;
    let profiles = match row.get::<_, Option<String>>(base)? {
        Some(name) if !issue.anonymous => Some(SubmitterProfile {
            name,
            pin: row.get::<_, Option<String>>(base + 1)?.unwrap_or_default(),
            department: row.get(base + 2)?,
        }),
        _ => None,
    };
    Ok(IssueView { issue, profiles })
}

fn response_from_row(row: &Row<'_>) -> rusqlite::Result<IssueResponse> {
    Ok(IssueResponse {
        id: parse_col(row, 0, ResponseId::parse)?,
        issue_id: parse_col(row, 1, IssueId::parse)?,
        responder_id: UserId::new(row.get(2)?),
        responder_name: row.get(3)?,
        message: row.get(4)?,
        status: parse_col(row, 5, IssueStatus::parse)?,
        created_at: timestamp_col(row, 6)?,
    })
}

/// Builds the `WHERE` clause and its parameters for `query`.
fn filter(query: &IssueQuery) -> (String, Vec<Box<dyn ToSql + Send>>) {
    let mut clauses = Vec::new();
    let mut args: Vec<Box<dyn ToSql + Send>> = Vec::new();

    if let Some(user_id) = query.user_id {
        args.push(Box::new(user_id.as_i64()));
        clauses.push(format!("i.user_id = ?{}", args.len()));
    }
    if !query.statuses.is_empty() {
        let mut slots = Vec::with_capacity(query.statuses.len());
        for status in &query.statuses {
            args.push(Box::new(status.as_str()));
            slots.push(format!("?{}", args.len()));
        }
        clauses.push(format!("i.status IN ({})", slots.join(", ")));
    }
    if let Some(escalated) = query.escalated {
        args.push(Box::new(escalated));
        clauses.push(format!("i.escalated = ?{}", args.len()));
    }
    if let Some(before) = query.created_before {
        args.push(Box::new(before.to_sortable_string()));
        clauses.push(format!("i.created_at <= ?{}", args.len()));
    }

    let sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    (sql, args)
}

#[async_trait]
impl IssueStore for SqliteStore {
    async fn insert(&self, issue: &Issue) -> Result<(), StoreError> {
        let issue = issue.clone();
        let proof_files = to_json(&issue.proof_files)?;
        self.call(move |conn| {
            let escalation = issue.escalation.as_ref();
            conn.execute(
                "INSERT INTO issues (id, user_id, type, category, specify_category, description,
                    sent_to, faculty_name, anonymous, proof_files, status, escalated,
                    escalation_reason, escalated_to, escalated_at, resolution_message,
                    created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                params![
                    issue.id.to_string(),
                    issue.user_id.as_i64(),
                    issue.submission_type.as_str(),
                    issue.category,
                    issue.specify_category,
                    issue.description,
                    issue.sent_to,
                    issue.faculty_name,
                    issue.anonymous,
                    proof_files,
                    issue.status.as_str(),
                    issue.escalated,
                    escalation.map(|e| e.reason.clone()),
                    escalation.and_then(|e| e.escalated_to.clone()),
                    escalation.map(|e| e.escalated_at.to_sortable_string()),
                    issue.resolution_message,
                    issue.created_at.to_sortable_string(),
                    issue.updated_at.to_sortable_string(),
                ],
            )
            .store_err()?;
            Ok(())
        })
        .await
    }

    async fn get(&self, id: IssueId) -> Result<Option<Issue>, StoreError> {
        self.call(move |conn| {
            conn.query_row(
                &format!("SELECT {ISSUE_COLUMNS} FROM issues i WHERE i.id = ?1"),
                params![id.to_string()],
                issue_from_row,
            )
            .optional()
            .store_err()
        })
        .await
    }

    async fn list(&self, query: &IssueQuery) -> Result<Vec<Issue>, StoreError> {
        let (where_sql, args) = filter(query);
        self.call(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {ISSUE_COLUMNS} FROM issues i {where_sql}
                     ORDER BY i.created_at DESC, i.rowid DESC"
                ))
                .store_err()?;
            let rows = stmt
                .query_map(params_from_iter(args.iter()), issue_from_row)
                .store_err()?;
            rows.collect::<rusqlite::Result<Vec<_>>>().store_err()
        })
        .await
    }

    async fn list_with_profiles(&self, query: &IssueQuery) -> Result<Vec<IssueView>, StoreError> {
        let (where_sql, args) = filter(query);
        self.call(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {ISSUE_COLUMNS}, u.name, u.pin, u.department
                     FROM issues i LEFT JOIN users u ON u.id = i.user_id
                     {where_sql}
                     ORDER BY i.created_at DESC, i.rowid DESC"
                ))
                .store_err()?;
            let rows = stmt
                .query_map(params_from_iter(args.iter()), view_from_row)
                .store_err()?;
            rows.collect::<rusqlite::Result<Vec<_>>>().store_err()
        })
        .await
    }

    async fn responses(&self, id: IssueId) -> Result<Vec<IssueResponse>, StoreError> {
        self.call(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, issue_id, responder_id, responder_name, message, status, created_at
                     FROM issue_responses
                     WHERE issue_id = ?1
                     ORDER BY created_at, rowid",
                )
                .store_err()?;
            let rows = stmt
                .query_map(params![id.to_string()], response_from_row)
                .store_err()?;
            rows.collect::<rusqlite::Result<Vec<_>>>().store_err()
        })
        .await
    }

    async fn apply_response(
        &self,
        response: &IssueResponse,
        updated: &Issue,
        expected: IssueStatus,
    ) -> Result<bool, StoreError> {
        let response = response.clone();
        let issue_id = updated.id;
        let status = updated.status;
        let resolution = updated.resolution_message.clone();
        let updated_at = updated.updated_at;
        self.call(move |conn| {
            let tx = conn.transaction().store_err()?;
            let changed = tx
                .execute(
                    "UPDATE issues SET status = ?2, resolution_message = ?3, updated_at = ?4
                     WHERE id = ?1 AND status = ?5",
                    params![
                        issue_id.to_string(),
                        status.as_str(),
                        resolution,
                        updated_at.to_sortable_string(),
                        expected.as_str(),
                    ],
                )
                .store_err()?;
            if changed == 0 {
                return Ok(false);
            }
            tx.execute(
                "INSERT INTO issue_responses (id, issue_id, responder_id, responder_name, message, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    response.id.to_string(),
                    response.issue_id.to_string(),
                    response.responder_id.as_i64(),
                    response.responder_name,
                    response.message,
                    response.status.as_str(),
                    response.created_at.to_sortable_string(),
                ],
            )
            .store_err()?;
            tx.commit().store_err()?;
            Ok(true)
        })
        .await
    }

    async fn escalate(&self, updated: &Issue) -> Result<bool, StoreError> {
        let Some(escalation) = updated.escalation.clone() else {
            return Err(StoreError::Backend(format!(
                "issue {} has no escalation details",
                updated.id
            )));
        };
        let issue_id = updated.id;
        let updated_at = updated.updated_at;
        self.call(move |conn| {
            let changed = conn
                .execute(
                    &format!(
                        "UPDATE issues
                         SET escalated = 1, escalation_reason = ?2, escalated_to = ?3,
                             escalated_at = ?4, updated_at = ?5
                         WHERE id = ?1 AND escalated = 0 AND status IN {ACTIVE_STATUSES_SQL}"
                    ),
                    params![
                        issue_id.to_string(),
                        escalation.reason,
                        escalation.escalated_to,
                        escalation.escalated_at.to_sortable_string(),
                        updated_at.to_sortable_string(),
                    ],
                )
                .store_err()?;
            Ok(changed > 0)
        })
        .await
    }
}
