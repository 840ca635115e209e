//! Access-filtered user issue search

use crate::access::AccessResolver;
use crate::error::{Result, SearchError};
use crate::metrics::MetricsCollector;
use faultline_core::{Directory, EventStore, Issue, MemberId, OrgId, Project, ProjectId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Ceiling on results returned by a single search
pub const MAX_SEARCH_LIMIT: usize = 1000;

/// Result limit applied when the caller does not pick one
pub const DEFAULT_SEARCH_LIMIT: usize = 100;

/// One search result: an issue together with its project
#[derive(Debug, Clone)]
pub struct UserIssueHit {
    pub issue: Issue,
    pub project: Project,
}

/// Issue search scoped to the projects a member can see
///
/// # Pipeline
///
/// ```text
/// Request → AccessResolver → EventStore email index → project join
///               ↓                                          ↓
///         (live directory state)                     sort + limit
/// ```
pub struct SearchService {
    directory: Arc<Directory>,
    events: Arc<dyn EventStore>,
    access: AccessResolver,
    metrics: Arc<MetricsCollector>,
}

impl SearchService {
    /// Create a search service over the given directory and event store
    pub fn new(directory: Arc<Directory>, events: Arc<dyn EventStore>) -> Self {
        let access = AccessResolver::new(directory.clone());
        Self {
            directory,
            events,
            access,
            metrics: Arc::new(MetricsCollector::new()),
        }
    }

    /// Metrics collector, shared so callers can expose it
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Search for issues whose events carry exactly the given user email,
    /// restricted to projects visible to the member.
    ///
    /// A member with no visible projects gets `Ok` with an empty vec, not
    /// an error. Results are ordered by `last_seen` descending (issue id
    /// as tie-break) and truncated to `limit`, which is clamped to
    /// `1..=MAX_SEARCH_LIMIT`.
    pub async fn search_user_issues(
        &self,
        org_id: OrgId,
        member_id: MemberId,
        email: &str,
        limit: usize,
    ) -> Result<Vec<UserIssueHit>> {
        let start = Instant::now();

        if email.trim().is_empty() {
            self.metrics.record_error().await;
            return Err(SearchError::InvalidQuery(
                "email filter must not be empty".to_string(),
            ));
        }
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT);

        let org = self
            .directory
            .organization(org_id)
            .ok_or_else(|| SearchError::NotFound(format!("organization {}", org_id)))?;
        let member = self
            .directory
            .member(member_id)
            .ok_or_else(|| SearchError::NotFound(format!("member {}", member_id)))?;
        if member.organization_id != org.id {
            return Err(SearchError::NotFound(format!(
                "member {} in organization '{}'",
                member_id, org.slug
            )));
        }

        debug!(org = %org.slug, member_id = %member_id, email = %email, "user issue search");

        let projects = self.access.visible_projects(&org, member_id);
        if projects.is_empty() {
            self.metrics.record_search(0).await;
            self.metrics.record_latency(start.elapsed()).await;
            info!(
                org = %org.slug,
                member_id = %member_id,
                "member sees no projects, empty result"
            );
            return Ok(Vec::new());
        }

        let project_ids: Vec<ProjectId> = projects.iter().map(|project| project.id).collect();
        let projects_by_id: HashMap<ProjectId, Project> = projects
            .into_iter()
            .map(|project| (project.id, project))
            .collect();

        let issues = self.events.issues_with_user_email(&project_ids, email).await?;

        let mut hits: Vec<UserIssueHit> = issues
            .into_iter()
            .filter_map(|issue| {
                projects_by_id.get(&issue.project_id).map(|project| UserIssueHit {
                    project: project.clone(),
                    issue,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.issue
                .last_seen
                .cmp(&a.issue.last_seen)
                .then_with(|| a.issue.id.cmp(&b.issue.id))
        });
        hits.truncate(limit);

        self.metrics.record_search(hits.len()).await;
        self.metrics.record_latency(start.elapsed()).await;

        info!(
            org = %org.slug,
            member_id = %member_id,
            hits = hits.len(),
            "user issue search complete"
        );
        Ok(hits)
    }
}
