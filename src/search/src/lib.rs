//! # Faultline Search
//!
//! Access-filtered user issue search for the Faultline issue tracker.
//!
//! ## Features
//!
//! - **Team-gated visibility**: a member only searches projects reachable
//!   through an active team association
//! - **Live resolution**: no caching between directory and search, so
//!   membership changes apply to the very next query
//! - **Exact-match email filter** over the event store's user index
//! - **Built-in metrics** with Prometheus text exposition
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use faultline_core::{Directory, EventPayload, EventStore, InMemoryEventStore};
//! use faultline_search::SearchService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let directory = Arc::new(Directory::new());
//!     let events = Arc::new(InMemoryEventStore::new());
//!
//!     let org = directory.create_organization("acme", "Acme", false)?;
//!     let team = directory.create_team(org.id, "backend")?;
//!     let project = directory.create_project(org.id, "api", "API", &[team.id])?;
//!     let user = directory.create_user("owner@example.com", "owner");
//!     let member = directory.create_member(org.id, user.id)?;
//!     directory.add_member_team(member.id, team.id, true)?;
//!
//!     events
//!         .store_event(
//!             project.id,
//!             EventPayload::new(["checkout-crash"]).with_user_email("foo@example.com"),
//!         )
//!         .await?;
//!
//!     let search = SearchService::new(directory, events);
//!     let hits = search
//!         .search_user_issues(org.id, member.id, "foo@example.com", 100)
//!         .await?;
//!
//!     assert_eq!(hits.len(), 1);
//!     println!("{} ({})", hits[0].issue.title, hits[0].project.slug);
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod engine;
pub mod error;
pub mod metrics;

// Re-export commonly used types
pub use access::AccessResolver;
pub use engine::{SearchService, UserIssueHit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
pub use error::{Result, SearchError};
pub use metrics::{MetricsCollector, SearchMetrics};
