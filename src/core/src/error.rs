//! Error types for the directory and event store

use thiserror::Error;

/// Directory and event store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Slug already taken within its namespace
    #[error("Duplicate slug: {0}")]
    DuplicateSlug(String),

    /// Record already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Entities from different organizations cannot be linked
    #[error("Cross-organization link: {0}")]
    CrossOrganization(String),

    /// Referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Self-service join requires open membership
    #[error("Closed membership: {0}")]
    ClosedMembership(String),

    /// Event payload rejected during normalization
    #[error("Invalid event: {0}")]
    InvalidEvent(String),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
