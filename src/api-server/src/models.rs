use chrono::{DateTime, Utc};
use faultline_core::Project;
use faultline_search::UserIssueHit;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Query parameters accepted by the user issue search endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UserIssueSearchParams {
    /// Email to match against event users (exact match, case sensitive)
    pub email: Option<String>,

    /// Maximum number of results
    #[validate(range(min = 1, max = 1000))]
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

/// Project summary nested in each search result
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectResponse {
    /// Project ID
    pub id: Uuid,

    /// URL-safe project identifier
    pub slug: String,

    /// Display name
    pub name: String,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            slug: project.slug,
            name: project.name,
        }
    }
}

/// One issue row returned by the search endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssueResponse {
    /// Issue ID
    pub id: Uuid,

    /// Title taken from the event that opened the issue
    pub title: String,

    /// Severity (debug, info, warning, error, fatal)
    pub level: String,

    /// When the first event of the group was seen
    pub first_seen: DateTime<Utc>,

    /// When the most recent event of the group was seen
    pub last_seen: DateTime<Utc>,

    /// Number of events aggregated into this issue
    pub times_seen: u64,

    /// Project the issue belongs to
    pub project: ProjectResponse,
}

impl From<UserIssueHit> for IssueResponse {
    fn from(hit: UserIssueHit) -> Self {
        Self {
            id: hit.issue.id,
            title: hit.issue.title,
            level: hit.issue.level.as_str().to_string(),
            first_seen: hit.issue.first_seen,
            last_seen: hit.issue.last_seen,
            times_seen: hit.issue.times_seen,
            project: hit.project.into(),
        }
    }
}

/// Search statistics summary
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchStatsResponse {
    pub total_searches: u64,
    pub matched_searches: u64,
    pub empty_searches: u64,
    pub issues_returned: u64,
    pub match_rate: f64,
    pub avg_latency_ms: f64,
}
