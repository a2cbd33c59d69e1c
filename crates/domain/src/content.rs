//! Admin-managed content: announcements, events, resources, and testimonials.
//!
//! Each kind is a typed record implementing [`ContentItem`]. Records travel as
//! camelCase JSON; storage keeps them as JSON documents keyed by
//! `(kind, id)`, so the generic helpers here ([`build_new`], [`apply_patch`])
//! work on [`serde_json::Value`] and finish by deserialising into the typed
//! record and validating it.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ContentId, FeedxError, Priority, Timestamp};

/// Default page size for spotlight listings.
pub const DEFAULT_SPOTLIGHT_LIMIT: usize = 50;

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// The six content collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Notifications,
    Updates,
    Resources,
    Events,
    Spotlight,
    Testimonials,
}

impl ContentKind {
    pub const ALL: [ContentKind; 6] = [
        Self::Notifications,
        Self::Updates,
        Self::Resources,
        Self::Events,
        Self::Spotlight,
        Self::Testimonials,
    ];

    /// Collection name, used as the URL segment and the storage key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Notifications => "notifications",
            Self::Updates => "updates",
            Self::Resources => "resources",
            Self::Events => "events",
            Self::Spotlight => "spotlight",
            Self::Testimonials => "testimonials",
        }
    }

    /// Singular prefix for generated ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Notifications => "notification",
            Self::Updates => "update",
            Self::Resources => "resource",
            Self::Events => "event",
            Self::Spotlight => "spotlight",
            Self::Testimonials => "testimonial",
        }
    }

    /// Label used in "not found" messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Notifications => "Notification",
            Self::Updates => "Update",
            Self::Resources => "Resource",
            Self::Events => "Event",
            Self::Spotlight => "Spotlight",
            Self::Testimonials => "Testimonial",
        }
    }

    /// Audit resource type, e.g. `"NOTIFICATION"`.
    pub fn audit_name(self) -> String {
        self.id_prefix().to_uppercase()
    }

    /// Listing limit applied when the caller supplies none.
    pub fn default_limit(self) -> Option<usize> {
        match self {
            Self::Spotlight => Some(DEFAULT_SPOTLIGHT_LIMIT),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Record contract
// ---------------------------------------------------------------------------

/// A typed content record.
pub trait ContentItem: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection this record type belongs to.
    const KIND: ContentKind;

    fn id(&self) -> &ContentId;

    fn timestamp(&self) -> Timestamp;

    /// Checks required fields after (de)serialisation.
    fn validate(&self) -> Result<(), FeedxError>;
}

/// Builds a new record from a request body.
///
/// Client-supplied `id`, `timestamp`, and `updatedAt` are discarded.
pub fn build_new<T: ContentItem>(body: Value, now: Timestamp) -> Result<T, FeedxError> {
    let mut object = into_object(body)?;
    let id = ContentId::generate(T::KIND.id_prefix(), now.as_datetime());
    object.insert("id".into(), Value::String(id.as_str().to_string()));
    object.insert("timestamp".into(), timestamp_value(now));
    object.remove("updatedAt");
    from_object(object)
}

/// Shallow-merges `patch` over `existing`, stamps `updatedAt`, and revalidates.
///
/// `id` and `timestamp` cannot be changed through a patch.
pub fn apply_patch<T: ContentItem>(existing: &T, patch: Value, now: Timestamp) -> Result<T, FeedxError> {
    let mut object = match serde_json::to_value(existing) {
        Ok(Value::Object(object)) => object,
        Ok(_) | Err(_) => {
            return Err(FeedxError::Storage(format!(
                "stored {} {} is not a JSON object",
                T::KIND,
                existing.id()
            )))
        }
    };
    for (key, value) in into_object(patch)? {
        if key == "id" || key == "timestamp" {
            continue;
        }
        object.insert(key, value);
    }
    object.insert("updatedAt".into(), timestamp_value(now));
    from_object(object)
}

/// Deserialises a stored document into its typed record.
pub fn decode<T: ContentItem>(document: Value) -> Result<T, FeedxError> {
    serde_json::from_value(document)
        .map_err(|e| FeedxError::Storage(format!("corrupt {} document: {e}", T::KIND)))
}

/// Serialises a record into its stored document form.
pub fn encode<T: ContentItem>(item: &T) -> Result<Value, FeedxError> {
    serde_json::to_value(item)
        .map_err(|e| FeedxError::Storage(format!("cannot encode {}: {e}", T::KIND)))
}

/// A document from an external source, checked against its record type.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedDocument {
    pub id: ContentId,
    pub created: Timestamp,
    pub document: Value,
}

/// Type-checks a document that already carries its id and timestamp
/// (e.g. a legacy export). Both are kept as given.
pub fn check_document(kind: ContentKind, document: Value) -> Result<CheckedDocument, FeedxError> {
    match kind {
        ContentKind::Notifications => check::<Notification>(document),
        ContentKind::Updates => check::<Update>(document),
        ContentKind::Resources => check::<Resource>(document),
        ContentKind::Events => check::<Event>(document),
        ContentKind::Spotlight => check::<Spotlight>(document),
        ContentKind::Testimonials => check::<Testimonial>(document),
    }
}

fn check<T: ContentItem>(document: Value) -> Result<CheckedDocument, FeedxError> {
    let item: T = serde_json::from_value(document)
        .map_err(|e| FeedxError::validation(format!("Invalid {}: {e}", T::KIND.label().to_lowercase())))?;
    item.validate()?;
    Ok(CheckedDocument {
        id: item.id().clone(),
        created: item.timestamp(),
        document: encode(&item)?,
    })
}

fn into_object(body: Value) -> Result<Map<String, Value>, FeedxError> {
    match body {
        Value::Object(object) => Ok(object),
        _ => Err(FeedxError::validation("Request body must be a JSON object")),
    }
}

fn from_object<T: ContentItem>(object: Map<String, Value>) -> Result<T, FeedxError> {
    let item: T = serde_json::from_value(Value::Object(object))
        .map_err(|e| FeedxError::validation(format!("Invalid {}: {e}", T::KIND.label().to_lowercase())))?;
    item.validate()?;
    Ok(item)
}

fn timestamp_value(ts: Timestamp) -> Value {
    Value::String(ts.to_sortable_string())
}

fn require(fields: &[&str], what: &str) -> Result<(), FeedxError> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        Err(FeedxError::validation(format!("{what} are required")))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A short announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: ContentId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// A news update with optional images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    pub id: ContentId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub priority: Priority,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Study material with attached files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: ContentId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "long_description")]
    pub long_description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// A campus event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: ContentId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, alias = "register_link")]
    pub register_link: String,
    #[serde(default)]
    pub files: Vec<String>,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// A highlighted achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spotlight {
    pub id: ContentId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// A quote from a student or alumnus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: ContentId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image: String,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

macro_rules! titled_content {
    ($ty:ident, $kind:ident) => {
        impl ContentItem for $ty {
            const KIND: ContentKind = ContentKind::$kind;

            fn id(&self) -> &ContentId {
                &self.id
            }

            fn timestamp(&self) -> Timestamp {
                self.timestamp
            }

            fn validate(&self) -> Result<(), FeedxError> {
                require(&[self.title.as_str(), self.description.as_str()], "Title and description")
            }
        }
    };
}

titled_content!(Notification, Notifications);
titled_content!(Update, Updates);
titled_content!(Resource, Resources);
titled_content!(Event, Events);
titled_content!(Spotlight, Spotlight);

impl ContentItem for Testimonial {
    const KIND: ContentKind = ContentKind::Testimonials;

    fn id(&self) -> &ContentId {
        &self.id
    }

    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn validate(&self) -> Result<(), FeedxError> {
        require(
            &[self.name.as_str(), self.title.as_str(), self.content.as_str()],
            "Name, title, and content",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_new_assigns_id_and_timestamp() {
        let now = Timestamp::now();
        let update: Update = build_new(
            json!({ "id": "forged", "title": "Exams", "description": "Schedule out", "timestamp": "1999-01-01T00:00:00Z" }),
            now,
        )
        .unwrap();
        assert!(update.id.as_str().starts_with("update-"));
        assert_eq!(update.timestamp, Timestamp::parse_rfc3339(&now.to_sortable_string()).unwrap());
        assert_eq!(update.priority, Priority::Medium);
        assert!(update.images.is_empty());
    }

    #[test]
    fn missing_title_is_a_validation_error() {
        let err = build_new::<Notification>(json!({ "description": "x" }), Timestamp::now()).unwrap_err();
        assert_eq!(err, FeedxError::validation("Title and description are required"));
    }

    #[test]
    fn testimonials_require_name_title_content() {
        let err = build_new::<Testimonial>(json!({ "title": "Alumni", "content": "Great" }), Timestamp::now())
            .unwrap_err();
        assert_eq!(err, FeedxError::validation("Name, title, and content are required"));
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        assert!(matches!(
            build_new::<Event>(json!(["not", "an", "object"]), Timestamp::now()),
            Err(FeedxError::Validation(_))
        ));
    }

    #[test]
    fn patch_merges_fields_and_protects_identity() {
        let created = Timestamp::now();
        let event: Event = build_new(
            json!({ "title": "Hackathon", "description": "24h", "location": "Lab 2", "registerLink": "https://r" }),
            created,
        )
        .unwrap();

        let later = created.plus(chrono::Duration::minutes(5));
        let patched = apply_patch(
            &event,
            json!({ "id": "other", "timestamp": "2000-01-01T00:00:00Z", "location": "Auditorium" }),
            later,
        )
        .unwrap();

        assert_eq!(patched.id, event.id);
        assert_eq!(patched.timestamp, event.timestamp);
        assert_eq!(patched.location, "Auditorium");
        assert_eq!(patched.register_link, "https://r");
        assert!(patched.updated_at.is_some());
    }

    #[test]
    fn patch_cannot_blank_required_fields() {
        let note: Notification =
            build_new(json!({ "title": "Holiday", "description": "Friday" }), Timestamp::now()).unwrap();
        assert!(apply_patch(&note, json!({ "title": "" }), Timestamp::now()).is_err());
    }

    #[test]
    fn legacy_snake_case_fields_are_accepted() {
        let resource: Resource = serde_json::from_value(json!({
            "id": "resource-1",
            "title": "DBMS notes",
            "description": "Unit 1",
            "long_description": "Full notes",
            "timestamp": "2024-01-01T00:00:00Z",
        }))
        .unwrap();
        assert_eq!(resource.long_description, "Full notes");
        let wire = serde_json::to_value(&resource).unwrap();
        assert_eq!(wire["longDescription"], "Full notes");
        assert!(wire.get("updatedAt").is_none());
    }

    #[test]
    fn checked_documents_keep_their_identity() {
        let checked = check_document(
            ContentKind::Updates,
            json!({ "id": "lx3k9a", "title": "Fees", "description": "Due Friday", "timestamp": "2024-06-01T10:00:00.000Z" }),
        )
        .unwrap();
        assert_eq!(checked.id.as_str(), "lx3k9a");
        assert_eq!(checked.created, Timestamp::parse_rfc3339("2024-06-01T10:00:00Z").unwrap());
        assert_eq!(checked.document["priority"], "medium");

        assert!(check_document(ContentKind::Testimonials, json!({ "id": "t", "timestamp": "2024-06-01T10:00:00Z" })).is_err());
    }

    #[test]
    fn only_spotlight_has_a_default_limit() {
        assert_eq!(ContentKind::Spotlight.default_limit(), Some(50));
        assert_eq!(ContentKind::Events.default_limit(), None);
        assert_eq!(ContentKind::Testimonials.audit_name(), "TESTIMONIAL");
    }
}
