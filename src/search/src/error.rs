//! Error types for the search engine

use thiserror::Error;

/// Search engine errors
#[derive(Debug, Error)]
pub enum SearchError {
    /// Missing or malformed search filter
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Underlying store failure
    #[error("Store error: {0}")]
    Store(#[from] faultline_core::StoreError),
}

/// Result type for search operations
pub type Result<T> = std::result::Result<T, SearchError>;
