//! Route definitions for the API server
//!
//! This module configures all HTTP routes with OpenAPI documentation.
//! Routes are organized by functionality:
//! - Health and metrics endpoints
//! - User issue search under /api/v1

use crate::{handlers, middleware, state::AppState};
use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Faultline API",
        version = "0.1.0",
        description = "Issue search over grouped error events, filtered by team access",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    paths(
        handlers::health_check,
        handlers::prometheus_metrics,
        handlers::search_user_issues,
        handlers::search_stats,
    ),
    components(
        schemas(
            crate::HealthResponse,
            crate::models::UserIssueSearchParams,
            crate::models::ProjectResponse,
            crate::models::IssueResponse,
            crate::models::SearchStatsResponse,
        )
    ),
    tags(
        (name = "health", description = "Health and monitoring endpoints"),
        (name = "issues", description = "User issue search endpoints"),
        (name = "metrics", description = "Search engine metrics"),
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    )
)]
pub struct ApiDoc;

/// Create the application router with all routes and middleware
///
/// This function builds the complete Axum router with:
/// - Health and metrics endpoints (no auth)
/// - Search routes under /api/v1 (session auth)
/// - OpenAPI/Swagger documentation
/// - Middleware layers for logging, auth, CORS, etc.
pub fn create_router(state: AppState) -> Router {
    // Authenticated API routes
    let api_routes = Router::new()
        .route(
            "/organizations/:org_slug/issues/search",
            get(handlers::search_user_issues),
        )
        .route("/metrics", get(handlers::search_stats));

    Router::new()
        // Health and metrics (no auth required)
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::prometheus_metrics))
        // API routes (auth required)
        .nest("/api/v1", api_routes)
        // OpenAPI documentation
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add state
        .with_state(state.clone())
        // Add middleware layers (executed bottom to top)
        .layer(axum_middleware::from_fn(
            middleware::error_handling_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(middleware::cors_layer())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(AppState::default());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let app = create_router(AppState::default());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("faultline_searches_total"));
    }

    #[tokio::test]
    async fn test_openapi_json() {
        let app = create_router(AppState::default());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_auth_required_for_search() {
        let app = create_router(AppState::default());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/organizations/acme/issues/search?email=foo@example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_search_unknown_org_is_404() {
        let state = AppState::default();
        let token = state.sessions.issue(Uuid::new_v4());
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/organizations/nowhere/issues/search?email=foo@example.com")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stats_requires_auth() {
        let app = create_router(AppState::default());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
