//! Event payload normalization and fingerprint grouping

use crate::error::{Result, StoreError};
use crate::types::{Event, EventUser, GroupKey, Level, ProjectId};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An event as submitted for storage, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Grouping fingerprint. Events sharing a fingerprint within one
    /// project collapse into a single issue.
    pub fingerprint: Vec<String>,

    pub timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default)]
    pub level: Level,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<EventUser>,
}

impl EventPayload {
    /// Create a payload with the given fingerprint, timestamped now
    pub fn new(fingerprint: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            fingerprint: fingerprint.into_iter().map(Into::into).collect(),
            timestamp: Utc::now(),
            environment: None,
            message: None,
            level: Level::default(),
            user: None,
        }
    }

    /// Override the event timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the environment name (e.g. "production")
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Set the event message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the event severity
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Attach a user context with the given email
    pub fn with_user_email(mut self, email: impl Into<String>) -> Self {
        self.user.get_or_insert_with(EventUser::default).email = Some(email.into());
        self
    }

    /// Attach a user context with the given username
    pub fn with_user_username(mut self, username: impl Into<String>) -> Self {
        self.user.get_or_insert_with(EventUser::default).username = Some(username.into());
        self
    }

    /// Normalize into a stored event for `project_id`.
    ///
    /// The timestamp is truncated to whole seconds; sub-second precision
    /// does not survive ingestion.
    pub fn normalize(self, project_id: ProjectId) -> Result<Event> {
        if self.fingerprint.is_empty() {
            return Err(StoreError::InvalidEvent(
                "fingerprint must have at least one part".to_string(),
            ));
        }

        let timestamp = self.timestamp.with_nanosecond(0).unwrap_or(self.timestamp);

        Ok(Event {
            id: Uuid::new_v4(),
            project_id,
            group_key: grouping_key(&self.fingerprint),
            fingerprint: self.fingerprint,
            timestamp,
            environment: self.environment,
            message: self.message,
            level: self.level,
            user: self.user,
        })
    }
}

/// Stable digest of a fingerprint.
///
/// Parts are length-prefixed before hashing so part boundaries stay
/// unambiguous: `["ab", "c"]` and `["a", "bc"]` produce different keys.
pub fn grouping_key(fingerprint: &[String]) -> GroupKey {
    let mut hasher = blake3::Hasher::new();
    for part in fingerprint {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_truncates_to_whole_seconds() {
        let ts = Utc
            .with_ymd_and_hms(2024, 5, 17, 10, 30, 45)
            .unwrap()
            .with_nanosecond(123_456_789)
            .unwrap();
        let event = EventPayload::new(["boom"])
            .with_timestamp(ts)
            .normalize(Uuid::new_v4())
            .unwrap();

        assert_eq!(event.timestamp.nanosecond(), 0);
        assert_eq!(
            event.timestamp,
            Utc.with_ymd_and_hms(2024, 5, 17, 10, 30, 45).unwrap()
        );
    }

    #[test]
    fn test_normalize_rejects_empty_fingerprint() {
        let payload = EventPayload::new(Vec::<String>::new());
        let result = payload.normalize(Uuid::new_v4());
        assert!(matches!(result, Err(StoreError::InvalidEvent(_))));
    }

    #[test]
    fn test_grouping_key_part_boundaries() {
        let joined = vec!["put-me-in-group1".to_string()];
        let split = vec!["put-me-in-".to_string(), "group1".to_string()];
        assert_ne!(grouping_key(&joined), grouping_key(&split));
    }

    #[test]
    fn test_user_email_builder_keeps_username() {
        let payload = EventPayload::new(["boom"])
            .with_user_username("alice")
            .with_user_email("alice@example.com");

        let user = payload.user.unwrap();
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
        assert_eq!(user.username.as_deref(), Some("alice"));
    }

    proptest! {
        #[test]
        fn grouping_key_is_deterministic(
            parts in proptest::collection::vec("[a-z0-9-]{1,16}", 1..6)
        ) {
            prop_assert_eq!(grouping_key(&parts), grouping_key(&parts));
        }

        #[test]
        fn grouping_key_distinguishes_segmentations(
            a in "[a-z]{2,8}",
            b in "[a-z]{2,8}"
        ) {
            let joined = vec![format!("{}{}", a, b)];
            let split = vec![a, b];
            prop_assert_ne!(grouping_key(&joined), grouping_key(&split));
        }
    }
}
