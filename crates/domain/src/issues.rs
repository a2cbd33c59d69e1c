//! Student submissions and the faculty response workflow.
//!
//! A submission is one of three [`SubmissionType`]s and moves through the
//! [`IssueStatus`] workflow:
//!
//! ```text
//! open | submitted ──► in_progress ──► resolved
//!        │                  │
//!        └──────────────────┴────────► rejected
//! ```
//!
//! `resolved` and `rejected` are terminal. A response may also leave the status
//! unchanged (message only) as long as the issue is not terminal.
//!
//! Escalation is requested by the submitter once an active issue has waited
//! [`ESCALATION_WAIT_HOURS`] without resolution. It is a one-way flag.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{FeedxError, IssueId, Principal, ResponseId, Timestamp, UserId};

/// Hours an active issue must wait before its submitter may escalate it.
pub const ESCALATION_WAIT_HOURS: i64 = 48;

/// Maximum number of proof attachments on one issue.
pub const MAX_PROOF_FILES: usize = 3;

/// The category every submission type accepts; requires `specify_category`.
pub const OTHER_CATEGORY: &str = "Other";

// ---------------------------------------------------------------------------
// Submission type
// ---------------------------------------------------------------------------

/// Kind of student submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionType {
    /// A complaint that needs action. May carry proof files.
    #[default]
    Issue,
    /// Comments on teaching, facilities, or administration.
    Feedback,
    /// An improvement idea.
    Suggestion,
}

impl SubmissionType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "issue" => Some(Self::Issue),
            "feedback" => Some(Self::Feedback),
            "suggestion" => Some(Self::Suggestion),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Feedback => "feedback",
            Self::Suggestion => "suggestion",
        }
    }

    /// Categories a submission of this type may be filed under.
    pub fn categories(self) -> &'static [&'static str] {
        match self {
            Self::Issue => &["Academic", "Hostel", "Infrastructure", "Library", OTHER_CATEGORY],
            Self::Feedback => &[
                "Teaching",
                "Facilities",
                "Administration",
                "Events",
                OTHER_CATEGORY,
            ],
            Self::Suggestion => &[
                "Infrastructure",
                "Academic Program",
                "Student Activities",
                "Technology",
                OTHER_CATEGORY,
            ],
        }
    }

    /// Only issues carry proof attachments.
    pub fn accepts_proof_files(self) -> bool {
        self == Self::Issue
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Workflow status of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    Submitted,
    InProgress,
    Resolved,
    Rejected,
}

impl IssueStatus {
    /// Statuses shown in a student's "track issues" view.
    pub const ACTIVE: [IssueStatus; 3] = [Self::Open, Self::Submitted, Self::InProgress];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(Self::Open),
            "submitted" => Some(Self::Submitted),
            "in_progress" => Some(Self::InProgress),
            "resolved" => Some(Self::Resolved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Submitted => "submitted",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
        }
    }

    /// Waiting for a first reaction from staff.
    pub fn is_waiting(self) -> bool {
        matches!(self, Self::Open | Self::Submitted)
    }

    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }

    /// Whether a response may move an issue from `self` to `next`.
    pub fn can_transition_to(self, next: IssueStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if self == next {
            return true;
        }
        match next {
            Self::Open | Self::Submitted => false,
            Self::InProgress => self.is_waiting(),
            Self::Resolved | Self::Rejected => true,
        }
    }
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Request body for a new submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueDraft {
    #[serde(rename = "type")]
    pub submission_type: SubmissionType,
    pub category: String,
    pub specify_category: Option<String>,
    pub description: String,
    pub sent_to: Option<String>,
    pub faculty_name: Option<String>,
    pub anonymous: bool,
    pub proof_files: Vec<String>,
}

impl IssueDraft {
    /// Checks the submission rules for the draft's type.
    pub fn validate(&self) -> Result<(), FeedxError> {
        if self.description.trim().is_empty() {
            return Err(FeedxError::validation("Description is required"));
        }
        let category = self.category.trim();
        if !self.submission_type.categories().contains(&category) {
            return Err(FeedxError::validation(format!(
                "Category '{category}' is not valid for {}",
                self.submission_type.as_str()
            )));
        }
        if category == OTHER_CATEGORY
            && self
                .specify_category
                .as_deref()
                .is_none_or(|c| c.trim().is_empty())
        {
            return Err(FeedxError::validation(
                "Please specify the category when choosing Other",
            ));
        }
        if !self.proof_files.is_empty() && !self.submission_type.accepts_proof_files() {
            return Err(FeedxError::validation(
                "Proof files can only be attached to issues",
            ));
        }
        if self.proof_files.len() > MAX_PROOF_FILES {
            return Err(FeedxError::validation(format!(
                "Maximum {MAX_PROOF_FILES} files allowed"
            )));
        }
        Ok(())
    }
}

/// Escalation details recorded when a submitter escalates an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escalation {
    pub reason: String,
    pub escalated_to: Option<String>,
    pub escalated_at: Timestamp,
}

/// Request body for escalating an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationRequest {
    pub reason: String,
    pub escalated_to: Option<String>,
}

/// A stored submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub submission_type: SubmissionType,
    pub category: String,
    pub specify_category: Option<String>,
    pub description: String,
    pub sent_to: Option<String>,
    pub faculty_name: Option<String>,
    pub anonymous: bool,
    pub proof_files: Vec<String>,
    pub status: IssueStatus,
    pub escalated: bool,
    pub escalation: Option<Escalation>,
    pub resolution_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Issue {
    /// Builds a new `open` issue from a validated draft.
    pub fn from_draft(
        id: IssueId,
        user_id: UserId,
        draft: IssueDraft,
        now: Timestamp,
    ) -> Result<Self, FeedxError> {
        draft.validate()?;
        Ok(Self {
            id,
            user_id,
            submission_type: draft.submission_type,
            category: draft.category.trim().to_string(),
            specify_category: non_blank(draft.specify_category),
            description: draft.description.trim().to_string(),
            sent_to: non_blank(draft.sent_to),
            faculty_name: non_blank(draft.faculty_name),
            anonymous: draft.anonymous,
            proof_files: draft.proof_files,
            status: IssueStatus::Open,
            escalated: false,
            escalation: None,
            resolution_message: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether the issue has waited long enough and is still eligible.
    pub fn can_escalate_at(&self, now: Timestamp) -> bool {
        !self.escalated
            && self.status.is_active()
            && self.created_at.elapsed_until(now) >= Duration::hours(ESCALATION_WAIT_HOURS)
    }

    /// Whole hours (rounded up) until escalation opens; `0` once it is open.
    pub fn hours_until_escalation(&self, now: Timestamp) -> i64 {
        let remaining = Duration::hours(ESCALATION_WAIT_HOURS) - self.created_at.elapsed_until(now);
        if remaining <= Duration::zero() {
            return 0;
        }
        const HOUR_MS: i64 = 3_600_000;
        (remaining.num_milliseconds() + HOUR_MS - 1) / HOUR_MS
    }

    /// Active, not yet escalated, and past the waiting period.
    pub fn is_overdue_at(&self, now: Timestamp) -> bool {
        self.can_escalate_at(now)
    }

    /// Validates an escalation by `caller` at `now`.
    pub fn check_escalation(
        &self,
        caller: &Principal,
        request: &EscalationRequest,
        now: Timestamp,
    ) -> Result<(), FeedxError> {
        if caller.id != self.user_id {
            return Err(FeedxError::forbidden("Only the submitter can escalate an issue"));
        }
        if request.reason.trim().is_empty() {
            return Err(FeedxError::validation("Please provide a reason for escalation"));
        }
        if self.escalated {
            return Err(FeedxError::EscalationNotAllowed(
                "Issue has already been escalated".to_string(),
            ));
        }
        if self.status.is_terminal() {
            return Err(FeedxError::EscalationNotAllowed(format!(
                "Issue is already {}",
                self.status
            )));
        }
        if !self.can_escalate_at(now) {
            return Err(FeedxError::EscalationNotAllowed(format!(
                "Escalation available in {} hours ({ESCALATION_WAIT_HOURS}h minimum)",
                self.hours_until_escalation(now)
            )));
        }
        Ok(())
    }

    /// Resolves the status a response moves this issue to.
    ///
    /// `requested` defaults to the current status.
    pub fn next_status(&self, requested: Option<IssueStatus>) -> Result<IssueStatus, FeedxError> {
        let next = requested.unwrap_or(self.status);
        if self.status.can_transition_to(next) {
            Ok(next)
        } else {
            Err(FeedxError::InvalidTransition {
                from: self.status,
                to: next,
            })
        }
    }

    /// Students see their own issues; staff see everything.
    pub fn is_visible_to(&self, caller: &Principal) -> bool {
        caller.role.is_staff() || caller.id == self.user_id
    }

    /// Applies an accepted response. A terminal status also records the
    /// message as the resolution.
    pub fn record_response(&mut self, response: &IssueResponse) {
        self.status = response.status;
        if response.status.is_terminal() {
            self.resolution_message = Some(response.message.clone());
        }
        self.updated_at = response.created_at;
    }

    /// Sets the escalation flag.
    pub fn mark_escalated(&mut self, escalation: Escalation) {
        self.updated_at = escalation.escalated_at;
        self.escalated = true;
        self.escalation = Some(escalation);
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Request body for a faculty response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseDraft {
    pub message: String,
    pub status: Option<IssueStatus>,
}

/// A faculty response as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueResponse {
    pub id: ResponseId,
    pub issue_id: IssueId,
    pub responder_id: UserId,
    pub responder_name: String,
    pub message: String,
    /// Status the issue moved to with this response.
    pub status: IssueStatus,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Read models
// ---------------------------------------------------------------------------

/// Submitter details shown to staff for non-anonymous issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitterProfile {
    pub name: String,
    pub pin: String,
    pub department: Option<String>,
}

/// An issue as listed for staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueView {
    #[serde(flatten)]
    pub issue: Issue,
    /// `None` for anonymous submissions.
    pub profiles: Option<SubmitterProfile>,
}

/// An issue with its response history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueDetail {
    #[serde(flatten)]
    pub issue: Issue,
    pub responses: Vec<IssueResponse>,
    /// Whole hours until the submitter may escalate; `0` when available.
    pub hours_until_escalation: i64,
    pub can_escalate: bool,
}

/// Filter for issue listings. Empty fields do not filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueQuery {
    pub user_id: Option<UserId>,
    pub statuses: Vec<IssueStatus>,
    pub escalated: Option<bool>,
    pub created_before: Option<Timestamp>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
