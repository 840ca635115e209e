//! Middleware layer for the API server
//!
//! This module provides middleware components for:
//! - Session authentication
//! - Request logging and tracing
//! - CORS configuration
//! - Request ID tracking
//! - Error handling

use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{error::ApiError, session::AuthedUser, state::AppState};

/// Request ID header name
pub const X_REQUEST_ID: &str = "x-request-id";

/// Configure CORS middleware
///
/// This allows cross-origin requests from any origin. In production, you
/// should restrict allowed origins to known domains.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static(X_REQUEST_ID),
        ])
        .expose_headers([HeaderName::from_static(X_REQUEST_ID)])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Request ID middleware
///
/// Generates or extracts a unique request ID for tracking requests through
/// the system. The request ID is added to all log messages and returned in
/// the response headers.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    // Extract or generate request ID
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    // Store request ID in extensions for handlers to access
    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;

    // Add request ID to response headers
    response.headers_mut().insert(
        X_REQUEST_ID,
        HeaderValue::from_str(&request_id.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("invalid-uuid")),
    );

    response
}

/// Request logging middleware
///
/// Logs all incoming requests with method, URI, and response status.
/// Includes request ID for correlation.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<Uuid>()
        .copied()
        .unwrap_or_else(Uuid::new_v4);

    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Incoming request"
    );

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed();

    let status = response.status();
    let level = match status.as_u16() {
        500..=599 => tracing::Level::ERROR,
        400..=499 => tracing::Level::WARN,
        _ => tracing::Level::INFO,
    };

    // `tracing::event!` requires a const level, so dispatch per level.
    match level {
        tracing::Level::ERROR => tracing::event!(
            tracing::Level::ERROR,
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            duration_ms = elapsed.as_millis() as u64,
            "Request completed"
        ),
        tracing::Level::WARN => tracing::event!(
            tracing::Level::WARN,
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            duration_ms = elapsed.as_millis() as u64,
            "Request completed"
        ),
        _ => tracing::event!(
            tracing::Level::INFO,
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            duration_ms = elapsed.as_millis() as u64,
            "Request completed"
        ),
    }

    response
}

/// Session authentication middleware
///
/// Resolves the `Authorization: Bearer <token>` header against the session
/// store and attaches the authenticated user to the request. Health, metrics,
/// and documentation endpoints are left open.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let request_id = request
        .extensions()
        .get::<Uuid>()
        .copied()
        .unwrap_or_else(Uuid::new_v4);

    // Skip auth for health, metrics, and documentation endpoints
    let path = request.uri().path().to_string();
    if path == "/health" || path == "/metrics" || path.starts_with("/api-docs") {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned);

    match token {
        Some(token) => match state.sessions.resolve(&token) {
            Some(user_id) => {
                request.extensions_mut().insert(AuthedUser(user_id));
                Ok(next.run(request).await)
            }
            None => {
                warn!(
                    request_id = %request_id,
                    "Invalid or expired session token"
                );
                Err(ApiError::Unauthorized(
                    "invalid or expired session token".to_string(),
                ))
            }
        },
        None => {
            warn!(
                request_id = %request_id,
                path = %path,
                "Missing bearer token"
            );
            Err(ApiError::Unauthorized("missing bearer token".to_string()))
        }
    }
}

/// Error handling middleware
///
/// Logs server errors with their request ID so 5xx responses can be traced
/// back to a specific request.
pub async fn error_handling_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .extensions()
        .get::<Uuid>()
        .copied()
        .unwrap_or_else(Uuid::new_v4);

    let response = next.run(request).await;

    if response.status().is_server_error() {
        error!(
            request_id = %request_id,
            status = %response.status().as_u16(),
            "Server error occurred"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn test_handler() -> &'static str {
        "OK"
    }

    fn authed_app(state: AppState) -> Router {
        Router::new()
            .route("/api/test", get(test_handler))
            .route("/health", get(test_handler))
            .layer(middleware::from_fn_with_state(state, auth_middleware))
    }

    #[tokio::test]
    async fn test_request_id_middleware() {
        let app = Router::new()
            .route("/", get(test_handler))
            .layer(middleware::from_fn(request_id_middleware));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().contains_key(X_REQUEST_ID));
    }

    #[tokio::test]
    async fn test_cors_layer() {
        let app = Router::new()
            .route("/", get(test_handler))
            .layer(cors_layer());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/")
                    .header(header::ORIGIN, "http://example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_auth_middleware_health_endpoint() {
        let app = authed_app(AppState::default());

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
    async fn test_auth_middleware_missing_token() {
        let app = authed_app(AppState::default());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_middleware_unknown_token() {
        let app = authed_app(AppState::default());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/test")
                    .header(header::AUTHORIZATION, "Bearer bogus")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_middleware_valid_token() {
        let state = AppState::default();
        let token = state.sessions.issue(Uuid::new_v4());
        let app = authed_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/test")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
