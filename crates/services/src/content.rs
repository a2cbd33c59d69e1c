use std::sync::Arc;

use domain::content::{self, ContentItem};
use domain::{ContentId, ContentStore, FeedxError, Principal, Timestamp};
use serde_json::Value;
use tracing::{info, instrument};

use crate::access::require_admin;
use crate::audit::Auditor;

/// Reads and admin mutations for every content kind.
///
/// Operations are generic over the record type; the type's
/// [`ContentItem::KIND`] selects the collection.
#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn ContentStore>,
    auditor: Auditor,
}

impl ContentService {
    pub(crate) fn new(store: Arc<dyn ContentStore>, auditor: Auditor) -> Self {
        Self { store, auditor }
    }

    /// Newest first. `limit` falls back to the kind's default.
    pub async fn list<T: ContentItem>(&self, limit: Option<usize>) -> Result<Vec<T>, FeedxError> {
        let limit = limit.filter(|l| *l > 0).or(T::KIND.default_limit());
        self.store
            .list(T::KIND, limit)
            .await?
            .into_iter()
            .map(content::decode)
            .collect()
    }

    pub async fn get<T: ContentItem>(&self, id: &str) -> Result<T, FeedxError> {
        let id = parse_id::<T>(id)?;
        self.load(&id).await
    }

    #[instrument(skip(self, caller, body), fields(kind = %T::KIND, actor = %caller.username))]
    pub async fn create<T: ContentItem>(&self, caller: &Principal, body: Value) -> Result<T, FeedxError> {
        require_admin(caller)?;
        let item: T = content::build_new(body, Timestamp::now())?;
        self.store
            .insert(T::KIND, item.id(), item.timestamp(), content::encode(&item)?)
            .await?;
        self.auditor
            .record(caller, "CREATE", &T::KIND.audit_name(), Some(item.id().to_string()))
            .await;
        info!(id = %item.id(), "content created");
        Ok(item)
    }

    #[instrument(skip(self, caller, patch), fields(kind = %T::KIND, actor = %caller.username))]
    pub async fn update<T: ContentItem>(
        &self,
        caller: &Principal,
        id: &str,
        patch: Value,
    ) -> Result<T, FeedxError> {
        require_admin(caller)?;
        let id = parse_id::<T>(id)?;
        let existing: T = self.load(&id).await?;
        let updated = content::apply_patch(&existing, patch, Timestamp::now())?;
        if !self
            .store
            .replace(T::KIND, &id, content::encode(&updated)?)
            .await?
        {
            return Err(not_found::<T>());
        }
        self.auditor
            .record(caller, "UPDATE", &T::KIND.audit_name(), Some(id.to_string()))
            .await;
        info!("content updated");
        Ok(updated)
    }

    #[instrument(skip(self, caller), fields(kind = %T::KIND, actor = %caller.username))]
    pub async fn delete<T: ContentItem>(&self, caller: &Principal, id: &str) -> Result<(), FeedxError> {
        require_admin(caller)?;
        let id = parse_id::<T>(id)?;
        if !self.store.delete(T::KIND, &id).await? {
            return Err(not_found::<T>());
        }
        self.auditor
            .record(caller, "DELETE", &T::KIND.audit_name(), Some(id.to_string()))
            .await;
        info!("content deleted");
        Ok(())
    }

    async fn load<T: ContentItem>(&self, id: &ContentId) -> Result<T, FeedxError> {
        match self.store.get(T::KIND, id).await? {
            Some(document) => content::decode(document),
            None => Err(not_found::<T>()),
        }
    }
}

fn parse_id<T: ContentItem>(id: &str) -> Result<ContentId, FeedxError> {
    ContentId::new(id).ok_or_else(not_found::<T>)
}

fn not_found<T: ContentItem>() -> FeedxError {
    FeedxError::NotFound {
        entity: T::KIND.label(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use domain::content::{Event, Notification, Spotlight, Testimonial, Update};
    use domain::{Priority, Role};
    use serde_json::json;

    #[tokio::test]
    async fn create_then_read_back() {
        let h = Harness::new();
        let admin = h.account("root", Role::Admin).await;

        let created: Update = h
            .services
            .content
            .create(&admin, json!({ "title": "Results", "description": "Sem 3 out", "priority": "high" }))
            .await
            .unwrap();
        assert_eq!(created.priority, Priority::High);

        let fetched: Update = h.services.content.get(created.id.as_str()).await.unwrap();
        assert_eq!(fetched, created);

        let log = h.services.users.admin_logs(&admin).await.unwrap();
        assert_eq!(log[0].action, "CREATE_UPDATE");
        assert_eq!(log[0].resource_type, "update");
    }

    #[tokio::test]
    async fn lists_are_newest_first() {
        let h = Harness::new();
        let admin = h.account("root", Role::Admin).await;
        for title in ["first", "second", "third"] {
            h.services
                .content
                .create::<Notification>(&admin, json!({ "title": title, "description": "d" }))
                .await
                .unwrap();
        }
        let titles: Vec<String> = h
            .services
            .content
            .list::<Notification>(None)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, ["third", "second", "first"]);
    }

    #[tokio::test]
    async fn spotlight_limit_defaults_and_zero_falls_back() {
        let h = Harness::new();
        let admin = h.account("root", Role::Admin).await;
        for i in 0..3 {
            h.services
                .content
                .create::<Spotlight>(&admin, json!({ "title": format!("s{i}"), "description": "d" }))
                .await
                .unwrap();
        }
        assert_eq!(h.services.content.list::<Spotlight>(Some(2)).await.unwrap().len(), 2);
        assert_eq!(h.services.content.list::<Spotlight>(Some(0)).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn update_merges_and_audits() {
        let h = Harness::new();
        let admin = h.account("root", Role::Admin).await;
        let event: Event = h
            .services
            .content
            .create(&admin, json!({ "title": "Fest", "description": "Annual", "location": "Ground" }))
            .await
            .unwrap();

        let updated: Event = h
            .services
            .content
            .update(&admin, event.id.as_str(), json!({ "location": "Auditorium" }))
            .await
            .unwrap();
        assert_eq!(updated.title, "Fest");
        assert_eq!(updated.location, "Auditorium");
        assert!(updated.updated_at.is_some());

        let stored: Event = h.services.content.get(event.id.as_str()).await.unwrap();
        assert_eq!(stored, updated);
        assert_eq!(h.services.users.admin_logs(&admin).await.unwrap()[0].action, "UPDATE_EVENT");
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let h = Harness::new();
        let admin = h.account("root", Role::Admin).await;
        assert_eq!(
            h.services.content.get::<Testimonial>("nope").await,
            Err(FeedxError::NotFound { entity: "Testimonial" })
        );
        assert_eq!(
            h.services.content.update::<Event>(&admin, "nope", json!({})).await,
            Err(FeedxError::NotFound { entity: "Event" })
        );
        assert_eq!(
            h.services.content.delete::<Event>(&admin, "nope").await,
            Err(FeedxError::NotFound { entity: "Event" })
        );
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let h = Harness::new();
        let admin = h.account("root", Role::Admin).await;
        let note: Notification = h
            .services
            .content
            .create(&admin, json!({ "title": "Holiday", "description": "Monday" }))
            .await
            .unwrap();
        h.services.content.delete::<Notification>(&admin, note.id.as_str()).await.unwrap();
        assert!(h.services.content.list::<Notification>(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_admins_mutate() {
        let h = Harness::new();
        let faculty = h.account("rao", Role::Faculty).await;
        assert!(matches!(
            h.services
                .content
                .create::<Notification>(&faculty, json!({ "title": "t", "description": "d" }))
                .await,
            Err(FeedxError::Forbidden(_))
        ));
    }
}
