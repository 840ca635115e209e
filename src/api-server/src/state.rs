use faultline_core::{Directory, InMemoryEventStore};
use faultline_search::SearchService;
use std::sync::Arc;
use std::time::Instant;

use crate::session::SessionStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Organization, team, project, and membership directory
    pub directory: Arc<Directory>,

    /// Event store backing issue grouping and search
    pub events: Arc<InMemoryEventStore>,

    /// Access-filtered user issue search engine
    pub search: Arc<SearchService>,

    /// Bearer token sessions
    pub sessions: Arc<SessionStore>,

    /// Server start time for uptime calculation
    pub start_time: Instant,

    /// Application version
    pub version: String,
}

impl AppState {
    pub fn new() -> Self {
        let directory = Arc::new(Directory::new());
        let events = Arc::new(InMemoryEventStore::new());
        let search = Arc::new(SearchService::new(directory.clone(), events.clone()));

        Self {
            directory,
            events,
            search,
            sessions: Arc::new(SessionStore::new()),
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
