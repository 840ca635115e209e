//! Project visibility resolution

use faultline_core::{Directory, MemberId, Organization, Project};
use std::sync::Arc;
use tracing::debug;

/// Resolves which projects an organization member can see.
///
/// Visibility is computed from live directory state on every call. There
/// is no cache in this path: a team association added or deactivated
/// between two searches must show up in the very next one.
pub struct AccessResolver {
    directory: Arc<Directory>,
}

impl AccessResolver {
    /// Create a resolver over the given directory
    pub fn new(directory: Arc<Directory>) -> Self {
        Self { directory }
    }

    /// Projects visible to a member of `org`.
    ///
    /// Open-membership organizations expose every project. Otherwise the
    /// member sees the union of projects linked to teams it holds an
    /// active association with; zero active associations means zero
    /// visible projects.
    pub fn visible_projects(&self, org: &Organization, member_id: MemberId) -> Vec<Project> {
        if org.allow_joinleave {
            let projects = self.directory.projects_in_organization(org.id);
            debug!(
                org = %org.slug,
                member_id = %member_id,
                count = projects.len(),
                "open membership, all projects visible"
            );
            return projects;
        }

        let team_ids = self.directory.active_team_ids(member_id);
        if team_ids.is_empty() {
            debug!(org = %org.slug, member_id = %member_id, "no active team associations");
            return Vec::new();
        }

        let projects = self.directory.projects_for_teams(org.id, &team_ids);
        debug!(
            org = %org.slug,
            member_id = %member_id,
            teams = team_ids.len(),
            count = projects.len(),
            "resolved visible projects"
        );
        projects
    }
}
