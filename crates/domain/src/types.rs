//! Shared value types for the FeedX domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants and participate in domain decisions
//! (who may do what, how old a submission is).

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::{UserId, Username};

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time, truncated to microseconds so it
    /// survives a round trip through [`Timestamp::to_sortable_string`].
    pub fn now() -> Self {
        Self(Utc::now().trunc_subsecs(6))
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Parses an RFC 3339 string, normalising any offset to UTC.
    pub fn parse_rfc3339(value: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| Self(dt.with_timezone(&Utc)))
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Fixed-width RFC 3339 form (microsecond precision, `Z` suffix).
    ///
    /// Strings in this form sort in chronological order.
    pub fn to_sortable_string(self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Time elapsed from `self` until `later`. Negative when `later` is earlier.
    pub fn elapsed_until(self, later: Timestamp) -> Duration {
        later.0 - self.0
    }

    /// Returns this timestamp shifted by `delta`.
    pub fn plus(self, delta: Duration) -> Self {
        Self(self.0 + delta)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// Roles and principals
// ---------------------------------------------------------------------------

/// What an account is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Submits and tracks their own issues.
    Student,
    /// Reviews and responds to issues.
    Faculty,
    /// Manages content, institutes, and accounts. Also acts as faculty.
    #[default]
    Admin,
}

impl Role {
    /// Parses the stored form (`"student"`, `"faculty"`, `"admin"`).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(Self::Student),
            "faculty" => Some(Self::Faculty),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Faculty => "faculty",
            Self::Admin => "admin",
        }
    }

    /// Faculty and admins may list every issue and respond to it.
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Faculty | Self::Admin)
    }

    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller of an operation, as recovered from a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Account row id.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// Display name.
    pub name: String,
    /// Granted role.
    pub role: Role,
}

// ---------------------------------------------------------------------------
// Announcement priority
// ---------------------------------------------------------------------------

/// Display priority of an update announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sortable_strings_order_chronologically() {
        let earlier = Timestamp::parse_rfc3339("2024-05-01T10:00:00Z").unwrap();
        let later = earlier.plus(Duration::milliseconds(1500));
        assert!(earlier.to_sortable_string() < later.to_sortable_string());
        assert_eq!(
            Timestamp::parse_rfc3339(&later.to_sortable_string()),
            Some(later)
        );
    }

    #[test]
    fn parse_normalises_offsets_to_utc() {
        let ts = Timestamp::parse_rfc3339("2024-05-01T15:30:00+05:30").unwrap();
        assert_eq!(ts.to_sortable_string(), "2024-05-01T10:00:00.000000Z");
    }

    #[test]
    fn staff_roles() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Faculty.is_staff());
        assert!(!Role::Student.is_staff());
        assert!(!Role::Faculty.is_admin());
        assert_eq!(Role::parse("faculty"), Some(Role::Faculty));
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
        let p: Priority = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(p, Priority::High);
    }
}
