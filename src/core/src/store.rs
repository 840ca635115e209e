//! Event storage and fingerprint grouping
//!
//! `EventStore` is the seam a persistent backend would implement; the
//! in-memory implementation below is the only one shipped.

use crate::error::Result;
use crate::event::EventPayload;
use crate::types::{Event, GroupKey, Issue, IssueId, ProjectId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Event store trait
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Normalize and store an event, folding it into its issue
    async fn store_event(&self, project_id: ProjectId, payload: EventPayload) -> Result<Event>;

    /// All issues in a project, in no particular order
    async fn issues_for_project(&self, project_id: ProjectId) -> Result<Vec<Issue>>;

    /// Issues in the given projects with at least one event whose user
    /// email exactly equals `email`, in no particular order
    async fn issues_with_user_email(
        &self,
        project_ids: &[ProjectId],
        email: &str,
    ) -> Result<Vec<Issue>>;

    /// Stored events for an issue, in arrival order
    async fn events_for_issue(&self, issue_id: IssueId) -> Result<Vec<Event>>;
}

#[derive(Default)]
struct EventStoreInner {
    issues: HashMap<IssueId, Issue>,
    /// (project, group key) -> issue, the grouping identity
    groups: HashMap<(ProjectId, GroupKey), IssueId>,
    events: HashMap<IssueId, Vec<Event>>,
    /// Exact-match index: event-user email -> issues containing it
    email_index: HashMap<String, HashSet<IssueId>>,
}

/// In-memory event store implementation
pub struct InMemoryEventStore {
    inner: Arc<RwLock<EventStoreInner>>,
}

impl InMemoryEventStore {
    /// Create a new in-memory event store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(EventStoreInner::default())),
        }
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn store_event(&self, project_id: ProjectId, payload: EventPayload) -> Result<Event> {
        let event = payload.normalize(project_id)?;
        let mut inner = self.inner.write().await;

        let group = (project_id, event.group_key.clone());
        let issue_id = match inner.groups.get(&group).copied() {
            Some(issue_id) => {
                if let Some(issue) = inner.issues.get_mut(&issue_id) {
                    issue.record(&event);
                }
                issue_id
            }
            None => {
                let issue = Issue::from_event(&event);
                let issue_id = issue.id;
                inner.groups.insert(group, issue_id);
                inner.issues.insert(issue_id, issue);
                issue_id
            }
        };

        if let Some(email) = event.user.as_ref().and_then(|user| user.email.as_deref()) {
            inner
                .email_index
                .entry(email.to_string())
                .or_default()
                .insert(issue_id);
        }
        inner.events.entry(issue_id).or_default().push(event.clone());

        debug!(
            project_id = %project_id,
            issue_id = %issue_id,
            group_key = %event.group_key,
            "stored event"
        );
        Ok(event)
    }

    async fn issues_for_project(&self, project_id: ProjectId) -> Result<Vec<Issue>> {
        let inner = self.inner.read().await;
        Ok(inner
            .issues
            .values()
            .filter(|issue| issue.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn issues_with_user_email(
        &self,
        project_ids: &[ProjectId],
        email: &str,
    ) -> Result<Vec<Issue>> {
        let inner = self.inner.read().await;
        let Some(candidates) = inner.email_index.get(email) else {
            return Ok(Vec::new());
        };

        let visible: HashSet<ProjectId> = project_ids.iter().copied().collect();
        Ok(candidates
            .iter()
            .filter_map(|issue_id| inner.issues.get(issue_id))
            .filter(|issue| visible.contains(&issue.project_id))
            .cloned()
            .collect())
    }

    async fn events_for_issue(&self, issue_id: IssueId) -> Result<Vec<Event>> {
        let inner = self.inner.read().await;
        Ok(inner.events.get(&issue_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_same_fingerprint_groups_into_one_issue() {
        let store = InMemoryEventStore::new();
        let project = Uuid::new_v4();

        store
            .store_event(project, EventPayload::new(["boom"]).with_message("first"))
            .await
            .unwrap();
        store
            .store_event(project, EventPayload::new(["boom"]).with_message("second"))
            .await
            .unwrap();

        let issues = store.issues_for_project(project).await.unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].times_seen, 2);
        // The opening event names the issue
        assert_eq!(issues[0].title, "first");
    }

    #[tokio::test]
    async fn test_same_fingerprint_distinct_projects_distinct_issues() {
        let store = InMemoryEventStore::new();
        let project1 = Uuid::new_v4();
        let project2 = Uuid::new_v4();

        store
            .store_event(project1, EventPayload::new(["boom"]))
            .await
            .unwrap();
        store
            .store_event(project2, EventPayload::new(["boom"]))
            .await
            .unwrap();

        assert_eq!(store.issues_for_project(project1).await.unwrap().len(), 1);
        assert_eq!(store.issues_for_project(project2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_email_index_is_exact_match() {
        let store = InMemoryEventStore::new();
        let project = Uuid::new_v4();

        store
            .store_event(
                project,
                EventPayload::new(["boom"]).with_user_email("foo@example.com"),
            )
            .await
            .unwrap();

        let hits = store
            .issues_with_user_email(&[project], "foo@example.com")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        for miss in ["foo", "FOO@EXAMPLE.COM", "foo@example.co", "bar@example.com"] {
            let hits = store.issues_with_user_email(&[project], miss).await.unwrap();
            assert!(hits.is_empty(), "{} should not match", miss);
        }
    }

    #[tokio::test]
    async fn test_email_query_scoped_to_projects() {
        let store = InMemoryEventStore::new();
        let visible = Uuid::new_v4();
        let hidden = Uuid::new_v4();

        store
            .store_event(
                visible,
                EventPayload::new(["a"]).with_user_email("foo@example.com"),
            )
            .await
            .unwrap();
        store
            .store_event(
                hidden,
                EventPayload::new(["b"]).with_user_email("foo@example.com"),
            )
            .await
            .unwrap();

        let hits = store
            .issues_with_user_email(&[visible], "foo@example.com")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].project_id, visible);

        let hits = store
            .issues_with_user_email(&[], "foo@example.com")
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_issue_matched_once_despite_many_events() {
        let store = InMemoryEventStore::new();
        let project = Uuid::new_v4();

        for _ in 0..3 {
            store
                .store_event(
                    project,
                    EventPayload::new(["boom"]).with_user_email("foo@example.com"),
                )
                .await
                .unwrap();
        }

        let hits = store
            .issues_with_user_email(&[project], "foo@example.com")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].times_seen, 3);
    }

    #[tokio::test]
    async fn test_events_kept_in_arrival_order() {
        let store = InMemoryEventStore::new();
        let project = Uuid::new_v4();

        store
            .store_event(project, EventPayload::new(["boom"]).with_message("one"))
            .await
            .unwrap();
        store
            .store_event(project, EventPayload::new(["boom"]).with_message("two"))
            .await
            .unwrap();

        let issues = store.issues_for_project(project).await.unwrap();
        let events = store.events_for_issue(issues[0].id).await.unwrap();
        let messages: Vec<_> = events.iter().filter_map(|e| e.message.as_deref()).collect();
        assert_eq!(messages, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_event_without_email_not_indexed() {
        let store = InMemoryEventStore::new();
        let project = Uuid::new_v4();

        store
            .store_event(project, EventPayload::new(["boom"]))
            .await
            .unwrap();

        let hits = store.issues_with_user_email(&[project], "").await.unwrap();
        assert!(hits.is_empty());
        assert_eq!(store.issues_for_project(project).await.unwrap().len(), 1);
    }
}
