//! Core domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique organization identifier
pub type OrgId = Uuid;

/// Unique team identifier
pub type TeamId = Uuid;

/// Unique project identifier
pub type ProjectId = Uuid;

/// Unique user identifier
pub type UserId = Uuid;

/// Unique organization member identifier
pub type MemberId = Uuid;

/// Unique issue identifier
pub type IssueId = Uuid;

/// Unique event identifier
pub type EventId = Uuid;

/// Fingerprint digest identifying an issue within a project
pub type GroupKey = String;

/// Tenant root. Teams, projects, and members all hang off an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrgId,

    /// URL-safe identifier, globally unique
    pub slug: String,

    pub name: String,

    /// Open membership: members may join teams themselves and see every
    /// project in the organization without a team association.
    pub allow_joinleave: bool,

    pub date_added: DateTime<Utc>,
}

impl Organization {
    /// Create a new organization
    pub fn new(slug: impl Into<String>, name: impl Into<String>, allow_joinleave: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            slug: slug.into(),
            name: name.into(),
            allow_joinleave,
            date_added: Utc::now(),
        }
    }
}

/// Team within an organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,

    pub organization_id: OrgId,

    /// URL-safe identifier, unique per organization
    pub slug: String,

    pub date_added: DateTime<Utc>,
}

impl Team {
    /// Create a new team
    pub fn new(organization_id: OrgId, slug: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            slug: slug.into(),
            date_added: Utc::now(),
        }
    }
}

/// Project within an organization. Events are stored per project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,

    pub organization_id: OrgId,

    /// URL-safe identifier, unique per organization
    pub slug: String,

    pub name: String,

    /// Teams whose members can see this project
    pub team_ids: Vec<TeamId>,

    pub date_added: DateTime<Utc>,
}

impl Project {
    /// Create a new project linked to the given teams
    pub fn new(
        organization_id: OrgId,
        slug: impl Into<String>,
        name: impl Into<String>,
        team_ids: Vec<TeamId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            slug: slug.into(),
            name: name.into(),
            team_ids,
            date_added: Utc::now(),
        }
    }
}

/// Authentication principal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    pub email: String,

    pub username: String,

    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Create a new user
    pub fn new(email: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            username: username.into(),
            date_joined: Utc::now(),
        }
    }
}

/// A user's membership in an organization. At most one per (organization,
/// user) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationMember {
    pub id: MemberId,

    pub organization_id: OrgId,

    pub user_id: UserId,

    pub date_added: DateTime<Utc>,
}

impl OrganizationMember {
    /// Create a new membership record
    pub fn new(organization_id: OrgId, user_id: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            user_id,
            date_added: Utc::now(),
        }
    }
}

/// Join record between a member and a team. The member sees the team's
/// projects only while `is_active` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationMemberTeam {
    pub member_id: MemberId,

    pub team_id: TeamId,

    pub is_active: bool,

    pub date_added: DateTime<Utc>,
}

impl OrganizationMemberTeam {
    /// Create a new member/team association
    pub fn new(member_id: MemberId, team_id: TeamId, is_active: bool) -> Self {
        Self {
            member_id,
            team_id,
            is_active,
            date_added: Utc::now(),
        }
    }
}

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Level {
    /// Lowercase name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Error
    }
}

/// User context attached to an event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// A normalized, stored event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,

    pub project_id: ProjectId,

    /// Digest of the fingerprint, shared by all events of one issue
    pub group_key: GroupKey,

    pub fingerprint: Vec<String>,

    /// Whole-second timestamp (sub-second precision dropped on ingest)
    pub timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub level: Level,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<EventUser>,
}

impl Event {
    /// Issue title derived from the event
    pub fn title(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| "<unlabeled event>".to_string())
    }
}

/// Aggregate of all events in one project sharing a fingerprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,

    pub project_id: ProjectId,

    pub group_key: GroupKey,

    /// Title taken from the event that opened the issue
    pub title: String,

    pub level: Level,

    pub first_seen: DateTime<Utc>,

    pub last_seen: DateTime<Utc>,

    pub times_seen: u64,
}

impl Issue {
    /// Open a new issue from the first event of a group
    pub fn from_event(event: &Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: event.project_id,
            group_key: event.group_key.clone(),
            title: event.title(),
            level: event.level,
            first_seen: event.timestamp,
            last_seen: event.timestamp,
            times_seen: 1,
        }
    }

    /// Fold another event of the same group into this issue
    pub fn record(&mut self, event: &Event) {
        self.times_seen += 1;
        if event.timestamp < self.first_seen {
            self.first_seen = event.timestamp;
        }
        if event.timestamp > self.last_seen {
            self.last_seen = event.timestamp;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_event(timestamp: DateTime<Utc>) -> Event {
        Event {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            group_key: "abc".to_string(),
            fingerprint: vec!["boom".to_string()],
            timestamp,
            environment: None,
            message: Some("NullPointerException".to_string()),
            level: Level::Error,
            user: None,
        }
    }

    #[test]
    fn test_organization_creation() {
        let org = Organization::new("acme", "Acme Inc", false);
        assert_eq!(org.slug, "acme");
        assert!(!org.allow_joinleave);
    }

    #[test]
    fn test_issue_from_event_takes_title() {
        let event = sample_event(Utc::now());
        let issue = Issue::from_event(&event);
        assert_eq!(issue.title, "NullPointerException");
        assert_eq!(issue.times_seen, 1);
        assert_eq!(issue.first_seen, issue.last_seen);
    }

    #[test]
    fn test_issue_record_widens_seen_window() {
        let now = Utc::now();
        let first = sample_event(now);
        let mut issue = Issue::from_event(&first);

        let mut earlier = sample_event(now - Duration::hours(2));
        earlier.project_id = first.project_id;
        let mut later = sample_event(now + Duration::hours(1));
        later.project_id = first.project_id;

        issue.record(&earlier);
        issue.record(&later);

        assert_eq!(issue.times_seen, 3);
        assert_eq!(issue.first_seen, earlier.timestamp);
        assert_eq!(issue.last_seen, later.timestamp);
    }

    #[test]
    fn test_untitled_event_gets_placeholder() {
        let mut event = sample_event(Utc::now());
        event.message = None;
        assert_eq!(event.title(), "<unlabeled event>");
    }
}
