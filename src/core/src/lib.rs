//! # Faultline Core
//!
//! Shared domain types, the organization directory, and event storage for
//! the Faultline issue tracker. The search engine and the API server both
//! build on this package.

pub mod directory;
pub mod error;
pub mod event;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use directory::Directory;
pub use error::{Result, StoreError};
pub use event::{grouping_key, EventPayload};
pub use store::{EventStore, InMemoryEventStore};
pub use types::{
    Event, EventId, EventUser, GroupKey, Issue, IssueId, Level, MemberId, OrgId, Organization,
    OrganizationMember, OrganizationMemberTeam, Project, ProjectId, Team, TeamId, User, UserId,
};
