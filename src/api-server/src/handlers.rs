use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use validator::Validate;

use crate::{
    error::{ApiError, Result},
    models::{IssueResponse, SearchStatsResponse, UserIssueSearchParams},
    session::AuthedUser,
    state::AppState,
    HealthResponse,
};

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Search issues by affected user email
///
/// Returns issues from projects the authenticated member can see, most
/// recently seen first. Visibility follows active team associations, or
/// the whole organization when it has open membership.
#[utoipa::path(
    get,
    path = "/api/v1/organizations/{org_slug}/issues/search",
    params(
        ("org_slug" = String, Path, description = "Organization slug"),
        ("email" = Option<String>, Query, description = "Email to match against event users (exact match)"),
        ("limit" = Option<usize>, Query, description = "Maximum number of results (1-1000, default 100)")
    ),
    responses(
        (status = 200, description = "Matching issues, most recently seen first", body = Vec<IssueResponse>),
        (status = 400, description = "Missing email or invalid limit"),
        (status = 401, description = "Missing or invalid session token"),
        (status = 403, description = "User is not a member of the organization"),
        (status = 404, description = "Organization not found")
    ),
    tag = "issues"
)]
pub async fn search_user_issues(
    State(state): State<AppState>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Path(org_slug): Path<String>,
    Query(params): Query<UserIssueSearchParams>,
) -> Result<Json<Vec<IssueResponse>>> {
    // Validate query parameters
    params
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let email = match params.email.as_deref() {
        Some(email) if !email.trim().is_empty() => email,
        _ => {
            return Err(ApiError::BadRequest(
                "email parameter is required".to_string(),
            ))
        }
    };

    let org = state
        .directory
        .organization_by_slug(&org_slug)
        .ok_or_else(|| ApiError::NotFound(format!("Organization '{}' not found", org_slug)))?;

    let member = state
        .directory
        .member_for_user(org.id, user_id)
        .ok_or_else(|| {
            ApiError::Forbidden(format!(
                "User is not a member of organization '{}'",
                org_slug
            ))
        })?;

    let hits = state
        .search
        .search_user_issues(org.id, member.id, email, params.limit)
        .await?;

    Ok(Json(hits.into_iter().map(IssueResponse::from).collect()))
}

/// Get metrics (Prometheus format)
#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Prometheus metrics", body = String)
    ),
    tag = "metrics"
)]
pub async fn prometheus_metrics(State(state): State<AppState>) -> String {
    state.search.metrics().export_prometheus().await
}

/// Get search statistics summary
#[utoipa::path(
    get,
    path = "/api/v1/metrics",
    responses(
        (status = 200, description = "Search statistics", body = SearchStatsResponse)
    ),
    tag = "metrics"
)]
pub async fn search_stats(State(state): State<AppState>) -> Json<SearchStatsResponse> {
    let metrics = state.search.metrics().get_metrics().await;

    Json(SearchStatsResponse {
        total_searches: metrics.total_searches,
        matched_searches: metrics.matched_searches,
        empty_searches: metrics.empty_searches,
        issues_returned: metrics.issues_returned,
        match_rate: metrics.match_rate(),
        avg_latency_ms: metrics.avg_latency_ms,
    })
}
