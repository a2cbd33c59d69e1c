use std::sync::Arc;

use chrono::Duration;
use domain::issues::{
    Escalation, EscalationRequest, IssueDetail, IssueDraft, IssueQuery, IssueResponse, IssueView,
    ResponseDraft, ESCALATION_WAIT_HOURS,
};
use domain::{
    FeedxError, Issue, IssueId, IssueStatus, IssueStore, Principal, ResponseId, Timestamp,
};
use tracing::{info, instrument, warn};

use crate::access::require_staff;

const NOT_FOUND: FeedxError = FeedxError::NotFound { entity: "Issue" };

/// Submission, review, and escalation of student issues.
#[derive(Clone)]
pub struct IssueService {
    store: Arc<dyn IssueStore>,
}

impl IssueService {
    pub fn new(store: Arc<dyn IssueStore>) -> Self {
        Self { store }
    }

    /// Files a new submission in the `open` state.
    #[instrument(skip(self, caller, draft), fields(user = %caller.username))]
    pub async fn submit(&self, caller: &Principal, draft: IssueDraft) -> Result<Issue, FeedxError> {
        let issue = Issue::from_draft(IssueId::new_random(), caller.id, draft, Timestamp::now())?;
        self.store.insert(&issue).await?;
        info!(
            issue_id = %issue.id,
            kind = issue.submission_type.as_str(),
            category = %issue.category,
            "issue submitted"
        );
        Ok(issue)
    }

    /// One issue with its responses. Students only see their own.
    pub async fn get(&self, caller: &Principal, id: &str) -> Result<IssueDetail, FeedxError> {
        let issue = self.load(id).await?;
        if !issue.is_visible_to(caller) {
            return Err(FeedxError::forbidden("You can only view your own issues"));
        }
        self.detail(issue).await
    }

    /// The caller's issues still awaiting an outcome.
    pub async fn my_active(&self, caller: &Principal) -> Result<Vec<Issue>, FeedxError> {
        let query = IssueQuery {
            user_id: Some(caller.id),
            statuses: IssueStatus::ACTIVE.to_vec(),
            ..IssueQuery::default()
        };
        Ok(self.store.list(&query).await?)
    }

    /// The caller's resolved issues.
    pub async fn my_resolved(&self, caller: &Principal) -> Result<Vec<Issue>, FeedxError> {
        let query = IssueQuery {
            user_id: Some(caller.id),
            statuses: vec![IssueStatus::Resolved],
            ..IssueQuery::default()
        };
        Ok(self.store.list(&query).await?)
    }

    /// Every issue, optionally with one status. `"all"` does not filter and
    /// `"escalated"` keeps escalated issues of any status.
    pub async fn staff_list(
        &self,
        caller: &Principal,
        status: Option<&str>,
    ) -> Result<Vec<IssueView>, FeedxError> {
        require_staff(caller)?;
        let query = match status.map(str::trim).filter(|s| !s.is_empty() && *s != "all") {
            None => IssueQuery::default(),
            Some("escalated") => IssueQuery {
                escalated: Some(true),
                ..IssueQuery::default()
            },
            Some(s) => IssueQuery {
                statuses: vec![IssueStatus::parse(s)
                    .ok_or_else(|| FeedxError::validation(format!("Unknown status '{s}'")))?],
                ..IssueQuery::default()
            },
        };
        Ok(self.store.list_with_profiles(&query).await?)
    }

    /// Active, unescalated issues past the escalation wait.
    pub async fn overdue(&self, caller: &Principal) -> Result<Vec<IssueView>, FeedxError> {
        require_staff(caller)?;
        let query = IssueQuery {
            statuses: IssueStatus::ACTIVE.to_vec(),
            escalated: Some(false),
            created_before: Some(Timestamp::now().plus(-Duration::hours(ESCALATION_WAIT_HOURS))),
            ..IssueQuery::default()
        };
        Ok(self.store.list_with_profiles(&query).await?)
    }

    /// Records a faculty response and moves the issue to its next status.
    #[instrument(skip(self, caller, draft), fields(responder = %caller.username))]
    pub async fn respond(
        &self,
        caller: &Principal,
        id: &str,
        draft: ResponseDraft,
    ) -> Result<IssueDetail, FeedxError> {
        require_staff(caller)?;
        let message = draft.message.trim();
        if message.is_empty() {
            return Err(FeedxError::validation("Response message is required"));
        }

        let mut issue = self.load(id).await?;
        let expected = issue.status;
        let next = issue.next_status(draft.status)?;
        let response = IssueResponse {
            id: ResponseId::new_random(),
            issue_id: issue.id,
            responder_id: caller.id,
            responder_name: caller.name.clone(),
            message: message.to_string(),
            status: next,
            created_at: Timestamp::now(),
        };
        issue.record_response(&response);

        if !self.store.apply_response(&response, &issue, expected).await? {
            warn!(issue_id = %issue.id, "issue changed while responding");
            return Err(FeedxError::Conflict(
                "Issue was updated by someone else; reload and try again".into(),
            ));
        }
        info!(issue_id = %issue.id, from = %expected, to = %next, "response recorded");
        self.detail(issue).await
    }

    /// Escalates the caller's own issue once the wait has passed.
    #[instrument(skip(self, caller, request), fields(user = %caller.username))]
    pub async fn escalate(
        &self,
        caller: &Principal,
        id: &str,
        request: EscalationRequest,
    ) -> Result<IssueDetail, FeedxError> {
        let mut issue = self.load(id).await?;
        let now = Timestamp::now();
        issue.check_escalation(caller, &request, now)?;
        issue.mark_escalated(Escalation {
            reason: request.reason.trim().to_string(),
            escalated_to: request
                .escalated_to
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            escalated_at: now,
        });

        if !self.store.escalate(&issue).await? {
            return Err(FeedxError::EscalationNotAllowed(
                "Issue can no longer be escalated".into(),
            ));
        }
        info!(issue_id = %issue.id, "issue escalated");
        self.detail(issue).await
    }

    async fn load(&self, id: &str) -> Result<Issue, FeedxError> {
        let id = IssueId::parse(id.trim()).ok_or(NOT_FOUND)?;
        self.store.get(id).await?.ok_or(NOT_FOUND)
    }

    async fn detail(&self, issue: Issue) -> Result<IssueDetail, FeedxError> {
        let now = Timestamp::now();
        let responses = self.store.responses(issue.id).await?;
        Ok(IssueDetail {
            hours_until_escalation: issue.hours_until_escalation(now),
            can_escalate: issue.can_escalate_at(now),
            responses,
            issue,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use domain::issues::SubmissionType;
    use domain::Role;

    fn draft(category: &str) -> IssueDraft {
        IssueDraft {
            submission_type: SubmissionType::Issue,
            category: category.into(),
            description: "Projector in room 204 is broken".into(),
            ..IssueDraft::default()
        }
    }

    fn reply(message: &str, status: Option<IssueStatus>) -> ResponseDraft {
        ResponseDraft {
            message: message.into(),
            status,
        }
    }

    /// Stores an issue created `hours_ago` hours in the past.
    async fn aged_issue(h: &Harness, owner: &Principal, hours_ago: i64) -> Issue {
        let created = Timestamp::now().plus(-Duration::hours(hours_ago));
        let issue = Issue::from_draft(IssueId::new_random(), owner.id, draft("Infrastructure"), created).unwrap();
        IssueStore::insert(&h.store, &issue).await.unwrap();
        issue
    }

    #[tokio::test]
    async fn submitted_issues_start_open_and_show_as_active() {
        let h = Harness::new();
        let student = h.account("22001-CM-001", Role::Student).await;
        let issue = h.services.issues.submit(&student, draft("Library")).await.unwrap();
        assert_eq!(issue.status, IssueStatus::Open);

        let active = h.services.issues.my_active(&student).await.unwrap();
        assert_eq!(active, vec![issue.clone()]);
        assert!(h.services.issues.my_resolved(&student).await.unwrap().is_empty());

        let detail = h.services.issues.get(&student, &issue.id.to_string()).await.unwrap();
        assert!(!detail.can_escalate);
        assert_eq!(detail.hours_until_escalation, 48);
    }

    #[tokio::test]
    async fn invalid_drafts_are_rejected() {
        let h = Harness::new();
        let student = h.account("22001-CM-001", Role::Student).await;
        let err = h.services.issues.submit(&student, draft("Teaching")).await.unwrap_err();
        assert!(matches!(err, FeedxError::Validation(_)));
    }

    #[tokio::test]
    async fn students_cannot_read_other_students_issues() {
        let h = Harness::new();
        let owner = h.account("22001-CM-001", Role::Student).await;
        let other = h.account("22001-CM-002", Role::Student).await;
        let faculty = h.account("rao", Role::Faculty).await;
        let issue = h.services.issues.submit(&owner, draft("Library")).await.unwrap();
        let id = issue.id.to_string();

        assert!(matches!(
            h.services.issues.get(&other, &id).await,
            Err(FeedxError::Forbidden(_))
        ));
        assert!(h.services.issues.get(&faculty, &id).await.is_ok());
        assert_eq!(h.services.issues.get(&faculty, "not-a-uuid").await, Err(NOT_FOUND));
    }

    #[tokio::test]
    async fn responses_walk_the_workflow() {
        let h = Harness::new();
        let student = h.account("22001-CM-001", Role::Student).await;
        let faculty = h.account("rao", Role::Faculty).await;
        let issue = h.services.issues.submit(&student, draft("Library")).await.unwrap();
        let id = issue.id.to_string();

        let detail = h
            .services
            .issues
            .respond(&faculty, &id, reply("Checking with the librarian", Some(IssueStatus::InProgress)))
            .await
            .unwrap();
        assert_eq!(detail.issue.status, IssueStatus::InProgress);
        assert_eq!(detail.responses.len(), 1);
        assert_eq!(detail.responses[0].responder_name, "rao name");

        let detail = h
            .services
            .issues
            .respond(&faculty, &id, reply("  Books restocked ", Some(IssueStatus::Resolved)))
            .await
            .unwrap();
        assert_eq!(detail.issue.resolution_message.as_deref(), Some("Books restocked"));
        assert_eq!(detail.responses.len(), 2);

        let err = h
            .services
            .issues
            .respond(&faculty, &id, reply("Reopening", Some(IssueStatus::InProgress)))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FeedxError::InvalidTransition {
                from: IssueStatus::Resolved,
                to: IssueStatus::InProgress
            }
        );

        assert!(h.services.issues.my_active(&student).await.unwrap().is_empty());
        assert_eq!(h.services.issues.my_resolved(&student).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn message_only_responses_keep_the_status() {
        let h = Harness::new();
        let student = h.account("22001-CM-001", Role::Student).await;
        let faculty = h.account("rao", Role::Faculty).await;
        let issue = h.services.issues.submit(&student, draft("Library")).await.unwrap();

        let detail = h
            .services
            .issues
            .respond(&faculty, &issue.id.to_string(), reply("Noted", None))
            .await
            .unwrap();
        assert_eq!(detail.issue.status, IssueStatus::Open);
        assert_eq!(detail.issue.resolution_message, None);
    }

    #[tokio::test]
    async fn responding_requires_staff_and_a_message() {
        let h = Harness::new();
        let student = h.account("22001-CM-001", Role::Student).await;
        let faculty = h.account("rao", Role::Faculty).await;
        let issue = h.services.issues.submit(&student, draft("Library")).await.unwrap();
        let id = issue.id.to_string();

        assert!(matches!(
            h.services.issues.respond(&student, &id, reply("mine", None)).await,
            Err(FeedxError::Forbidden(_))
        ));
        assert!(matches!(
            h.services.issues.respond(&faculty, &id, reply("   ", None)).await,
            Err(FeedxError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn staff_list_filters_by_status() {
        let h = Harness::new();
        let student = h.account("22001-CM-001", Role::Student).await;
        let faculty = h.account("rao", Role::Faculty).await;
        let first = h.services.issues.submit(&student, draft("Library")).await.unwrap();
        h.services.issues.submit(&student, draft("Hostel")).await.unwrap();
        h.services
            .issues
            .respond(&faculty, &first.id.to_string(), reply("Done", Some(IssueStatus::Rejected)))
            .await
            .unwrap();

        let svc = &h.services.issues;
        assert_eq!(svc.staff_list(&faculty, None).await.unwrap().len(), 2);
        assert_eq!(svc.staff_list(&faculty, Some("all")).await.unwrap().len(), 2);
        let rejected = svc.staff_list(&faculty, Some("rejected")).await.unwrap();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].profiles.as_ref().map(|p| p.pin.as_str()), Some("PIN-22001-CM-001"));
        assert!(matches!(
            svc.staff_list(&faculty, Some("closed")).await,
            Err(FeedxError::Validation(_))
        ));
        assert!(matches!(
            svc.staff_list(&student, None).await,
            Err(FeedxError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn escalation_waits_48_hours() {
        let h = Harness::new();
        let student = h.account("22001-CM-001", Role::Student).await;
        let fresh = aged_issue(&h, &student, 10).await;
        let request = EscalationRequest {
            reason: "No response yet".into(),
            escalated_to: Some("Principal".into()),
        };

        let err = h
            .services
            .issues
            .escalate(&student, &fresh.id.to_string(), request.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, FeedxError::EscalationNotAllowed(_)));

        let old = aged_issue(&h, &student, 50).await;
        let detail = h
            .services
            .issues
            .escalate(&student, &old.id.to_string(), request.clone())
            .await
            .unwrap();
        assert!(detail.issue.escalated);
        assert!(!detail.can_escalate);
        assert_eq!(
            detail.issue.escalation.as_ref().and_then(|e| e.escalated_to.as_deref()),
            Some("Principal")
        );

        let again = h
            .services
            .issues
            .escalate(&student, &old.id.to_string(), request)
            .await
            .unwrap_err();
        assert!(matches!(again, FeedxError::EscalationNotAllowed(_)));
    }

    #[tokio::test]
    async fn staff_list_can_show_only_escalated_issues() {
        let h = Harness::new();
        let student = h.account("22001-CM-001", Role::Student).await;
        let faculty = h.account("rao", Role::Faculty).await;
        aged_issue(&h, &student, 3).await;
        let old = aged_issue(&h, &student, 52).await;
        let request = EscalationRequest {
            reason: "Still waiting".into(),
            escalated_to: None,
        };
        h.services
            .issues
            .escalate(&student, &old.id.to_string(), request)
            .await
            .unwrap();

        let escalated = h.services.issues.staff_list(&faculty, Some("escalated")).await.unwrap();
        assert_eq!(escalated.len(), 1);
        assert_eq!(escalated[0].issue.id, old.id);
        assert!(escalated[0].issue.escalated);
        assert_eq!(h.services.issues.staff_list(&faculty, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn only_the_submitter_escalates() {
        let h = Harness::new();
        let owner = h.account("22001-CM-001", Role::Student).await;
        let admin = h.account("root", Role::Admin).await;
        let old = aged_issue(&h, &owner, 72).await;
        let request = EscalationRequest {
            reason: "Ignored".into(),
            escalated_to: None,
        };
        assert!(matches!(
            h.services.issues.escalate(&admin, &old.id.to_string(), request).await,
            Err(FeedxError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn overdue_lists_old_unescalated_active_issues() {
        let h = Harness::new();
        let student = h.account("22001-CM-001", Role::Student).await;
        let faculty = h.account("rao", Role::Faculty).await;
        aged_issue(&h, &student, 5).await;
        let old = aged_issue(&h, &student, 60).await;

        let overdue = h.services.issues.overdue(&faculty).await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].issue.id, old.id);

        h.services
            .issues
            .respond(&faculty, &old.id.to_string(), reply("Fixed", Some(IssueStatus::Resolved)))
            .await
            .unwrap();
        assert!(h.services.issues.overdue(&faculty).await.unwrap().is_empty());
    }
}
