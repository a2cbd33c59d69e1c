//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example,
//! a [`ContentId`] with an [`InstituteCode`] even though both are strings under
//! the hood.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.trim().is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for UUID-wrapped newtypes (generated by the service).
// Generates: struct (Copy), new_random(), from_uuid(), parse(), as_uuid(), Display.
// ---------------------------------------------------------------------------
macro_rules! uuid_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            pub fn new_random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID (e.g. read back from storage).
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Parses the hyphenated textual form, returning `None` when malformed.
            pub fn parse(value: &str) -> Option<Self> {
                Uuid::parse_str(value).ok().map(Self)
            }

            /// Returns the underlying [`Uuid`].
            pub fn as_uuid(self) -> Uuid {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: storage-assigned integers
// ---------------------------------------------------------------------------

/// Identifies a registered account.
///
/// Wraps the row id assigned by storage on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    /// Creates a new identifier from a raw row id.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying integer value.
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed
// ---------------------------------------------------------------------------

uuid_id! {
    /// Identifies a student submission (issue, feedback, or suggestion).
    IssueId
}

uuid_id! {
    /// Identifies one faculty response attached to an issue.
    ResponseId
}

// ---------------------------------------------------------------------------
// Identifiers: string-backed
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies a content record (notification, update, resource, ...).
    ///
    /// Fresh ids have the form `"<prefix>-<unix-millis>-<8 hex>"`; ids imported
    /// from legacy JSON files are preserved verbatim.
    ContentId
}

impl ContentId {
    /// Generates a fresh id for a record created at `at`.
    pub fn generate(prefix: &str, at: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{prefix}-{}-{}", at.timestamp_millis(), &suffix[..8]))
    }
}

string_id! {
    /// A login name. Unique across accounts.
    Username
}

/// Institute directory key (e.g. `"GPTK"`).
///
/// Always stored upper-case so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstituteCode(String);

impl InstituteCode {
    /// Normalises `value` to upper case, returning `None` if it is blank.
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let v = value.as_ref().trim();
        if v.is_empty() {
            None
        } else {
            Some(Self(v.to_uppercase()))
        }
    }

    /// Returns the normalised code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InstituteCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn string_ids_reject_blank_values() {
        assert!(ContentId::new("").is_none());
        assert!(Username::new("   ").is_none());
        assert_eq!(Username::new("admin").unwrap().as_str(), "admin");
    }

    #[test]
    fn generated_content_id_carries_prefix_and_millis() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let id = ContentId::generate("event", at);
        let parts: Vec<&str> = id.as_str().split('-').collect();
        assert_eq!(parts[0], "event");
        assert_eq!(parts[1], at.timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn institute_codes_are_upper_cased() {
        let code = InstituteCode::new(" gptk ").unwrap();
        assert_eq!(code.as_str(), "GPTK");
        assert_eq!(code, InstituteCode::new("GPTK").unwrap());
        assert!(InstituteCode::new("").is_none());
    }

    #[test]
    fn issue_id_parses_its_own_display_form() {
        let id = IssueId::new_random();
        assert_eq!(IssueId::parse(&id.to_string()), Some(id));
        assert!(IssueId::parse("not-a-uuid").is_none());
    }
}
