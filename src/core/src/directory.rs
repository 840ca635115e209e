//! In-memory organization directory
//!
//! Holds organizations, teams, projects, users, and membership records.
//! Every lookup reads live state; there is no caching layer, so a
//! membership change is visible to the very next read.

use crate::error::{Result, StoreError};
use crate::types::{
    MemberId, OrgId, Organization, OrganizationMember, OrganizationMemberTeam, Project, ProjectId,
    Team, TeamId, User, UserId,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;

/// Concurrent directory of organizations and their structure
pub struct Directory {
    organizations: DashMap<OrgId, Organization>,
    teams: DashMap<TeamId, Team>,
    projects: DashMap<ProjectId, Project>,
    users: DashMap<UserId, User>,
    members: DashMap<MemberId, OrganizationMember>,
    member_teams: DashMap<(MemberId, TeamId), OrganizationMemberTeam>,

    // Secondary indexes, kept in lockstep with the primary maps
    org_slugs: DashMap<String, OrgId>,
    team_slugs: DashMap<(OrgId, String), TeamId>,
    project_slugs: DashMap<(OrgId, String), ProjectId>,
    member_index: DashMap<(OrgId, UserId), MemberId>,
}

impl Directory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self {
            organizations: DashMap::new(),
            teams: DashMap::new(),
            projects: DashMap::new(),
            users: DashMap::new(),
            members: DashMap::new(),
            member_teams: DashMap::new(),
            org_slugs: DashMap::new(),
            team_slugs: DashMap::new(),
            project_slugs: DashMap::new(),
            member_index: DashMap::new(),
        }
    }

    /// Create an organization. Slugs are globally unique.
    pub fn create_organization(
        &self,
        slug: impl Into<String>,
        name: impl Into<String>,
        allow_joinleave: bool,
    ) -> Result<Organization> {
        let org = Organization::new(slug, name, allow_joinleave);
        match self.org_slugs.entry(org.slug.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateSlug(format!(
                "organization '{}'",
                org.slug
            ))),
            Entry::Vacant(vacant) => {
                vacant.insert(org.id);
                self.organizations.insert(org.id, org.clone());
                Ok(org)
            }
        }
    }

    /// Create a team. Slugs are unique within the organization.
    pub fn create_team(&self, organization_id: OrgId, slug: impl Into<String>) -> Result<Team> {
        if !self.organizations.contains_key(&organization_id) {
            return Err(StoreError::NotFound(format!(
                "organization {}",
                organization_id
            )));
        }

        let team = Team::new(organization_id, slug);
        match self.team_slugs.entry((organization_id, team.slug.clone())) {
            Entry::Occupied(_) => Err(StoreError::DuplicateSlug(format!("team '{}'", team.slug))),
            Entry::Vacant(vacant) => {
                vacant.insert(team.id);
                self.teams.insert(team.id, team.clone());
                Ok(team)
            }
        }
    }

    /// Create a project linked to the given teams. Every team must belong
    /// to `organization_id`.
    pub fn create_project(
        &self,
        organization_id: OrgId,
        slug: impl Into<String>,
        name: impl Into<String>,
        team_ids: &[TeamId],
    ) -> Result<Project> {
        if !self.organizations.contains_key(&organization_id) {
            return Err(StoreError::NotFound(format!(
                "organization {}",
                organization_id
            )));
        }
        for team_id in team_ids {
            let team = self
                .teams
                .get(team_id)
                .ok_or_else(|| StoreError::NotFound(format!("team {}", team_id)))?;
            if team.organization_id != organization_id {
                return Err(StoreError::CrossOrganization(format!(
                    "team {} belongs to another organization",
                    team_id
                )));
            }
        }

        let project = Project::new(organization_id, slug, name, team_ids.to_vec());
        match self
            .project_slugs
            .entry((organization_id, project.slug.clone()))
        {
            Entry::Occupied(_) => Err(StoreError::DuplicateSlug(format!(
                "project '{}'",
                project.slug
            ))),
            Entry::Vacant(vacant) => {
                vacant.insert(project.id);
                self.projects.insert(project.id, project.clone());
                Ok(project)
            }
        }
    }

    /// Link an existing project to an additional team
    pub fn add_project_team(&self, project_id: ProjectId, team_id: TeamId) -> Result<()> {
        let team_org = self
            .teams
            .get(&team_id)
            .map(|team| team.organization_id)
            .ok_or_else(|| StoreError::NotFound(format!("team {}", team_id)))?;
        let mut project = self
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| StoreError::NotFound(format!("project {}", project_id)))?;
        if project.organization_id != team_org {
            return Err(StoreError::CrossOrganization(format!(
                "team {} belongs to another organization",
                team_id
            )));
        }
        if !project.team_ids.contains(&team_id) {
            project.team_ids.push(team_id);
        }
        Ok(())
    }

    /// Register a user
    pub fn create_user(&self, email: impl Into<String>, username: impl Into<String>) -> User {
        let user = User::new(email, username);
        self.users.insert(user.id, user.clone());
        user
    }

    /// Add a user to an organization. At most one membership per
    /// (organization, user) pair.
    pub fn create_member(
        &self,
        organization_id: OrgId,
        user_id: UserId,
    ) -> Result<OrganizationMember> {
        if !self.organizations.contains_key(&organization_id) {
            return Err(StoreError::NotFound(format!(
                "organization {}",
                organization_id
            )));
        }
        if !self.users.contains_key(&user_id) {
            return Err(StoreError::NotFound(format!("user {}", user_id)));
        }

        match self.member_index.entry((organization_id, user_id)) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(format!(
                "user {} is already a member of organization {}",
                user_id, organization_id
            ))),
            Entry::Vacant(vacant) => {
                let member = OrganizationMember::new(organization_id, user_id);
                vacant.insert(member.id);
                self.members.insert(member.id, member.clone());
                Ok(member)
            }
        }
    }

    /// Associate a member with a team. Both must belong to the same
    /// organization; at most one association per (member, team) pair.
    pub fn add_member_team(
        &self,
        member_id: MemberId,
        team_id: TeamId,
        is_active: bool,
    ) -> Result<OrganizationMemberTeam> {
        let member_org = self
            .members
            .get(&member_id)
            .map(|member| member.organization_id)
            .ok_or_else(|| StoreError::NotFound(format!("member {}", member_id)))?;
        let team_org = self
            .teams
            .get(&team_id)
            .map(|team| team.organization_id)
            .ok_or_else(|| StoreError::NotFound(format!("team {}", team_id)))?;
        if member_org != team_org {
            return Err(StoreError::CrossOrganization(format!(
                "member {} and team {} belong to different organizations",
                member_id, team_id
            )));
        }

        match self.member_teams.entry((member_id, team_id)) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(format!(
                "member {} is already associated with team {}",
                member_id, team_id
            ))),
            Entry::Vacant(vacant) => {
                let assoc = OrganizationMemberTeam::new(member_id, team_id, is_active);
                vacant.insert(assoc.clone());
                Ok(assoc)
            }
        }
    }

    /// Flip the `is_active` flag on an existing association
    pub fn set_member_team_active(
        &self,
        member_id: MemberId,
        team_id: TeamId,
        is_active: bool,
    ) -> Result<()> {
        let mut assoc = self
            .member_teams
            .get_mut(&(member_id, team_id))
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "association between member {} and team {}",
                    member_id, team_id
                ))
            })?;
        assoc.is_active = is_active;
        Ok(())
    }

    /// Self-service team join. Only organizations with open membership
    /// (`allow_joinleave`) permit this; closed organizations require an
    /// explicit `add_member_team`.
    pub fn join_team(&self, member_id: MemberId, team_id: TeamId) -> Result<OrganizationMemberTeam> {
        let member_org = self
            .members
            .get(&member_id)
            .map(|member| member.organization_id)
            .ok_or_else(|| StoreError::NotFound(format!("member {}", member_id)))?;
        let org = self
            .organizations
            .get(&member_org)
            .ok_or_else(|| StoreError::NotFound(format!("organization {}", member_org)))?;
        if !org.allow_joinleave {
            return Err(StoreError::ClosedMembership(org.slug.clone()));
        }
        drop(org);

        self.add_member_team(member_id, team_id, true)
    }

    /// Look up an organization by id
    pub fn organization(&self, id: OrgId) -> Option<Organization> {
        self.organizations.get(&id).map(|org| org.clone())
    }

    /// Look up an organization by slug
    pub fn organization_by_slug(&self, slug: &str) -> Option<Organization> {
        let id = *self.org_slugs.get(slug)?;
        self.organizations.get(&id).map(|org| org.clone())
    }

    /// Look up a team by id
    pub fn team(&self, id: TeamId) -> Option<Team> {
        self.teams.get(&id).map(|team| team.clone())
    }

    /// Look up a project by id
    pub fn project(&self, id: ProjectId) -> Option<Project> {
        self.projects.get(&id).map(|project| project.clone())
    }

    /// Look up a user by id
    pub fn user(&self, id: UserId) -> Option<User> {
        self.users.get(&id).map(|user| user.clone())
    }

    /// Look up a member by id
    pub fn member(&self, id: MemberId) -> Option<OrganizationMember> {
        self.members.get(&id).map(|member| member.clone())
    }

    /// Look up a user's membership in an organization
    pub fn member_for_user(&self, organization_id: OrgId, user_id: UserId) -> Option<OrganizationMember> {
        let member_id = *self.member_index.get(&(organization_id, user_id))?;
        self.members.get(&member_id).map(|member| member.clone())
    }

    /// Team ids the member holds an active association with
    pub fn active_team_ids(&self, member_id: MemberId) -> Vec<TeamId> {
        self.member_teams
            .iter()
            .filter(|entry| {
                let assoc = entry.value();
                assoc.member_id == member_id && assoc.is_active
            })
            .map(|entry| entry.value().team_id)
            .collect()
    }

    /// All projects in an organization, sorted by slug
    pub fn projects_in_organization(&self, organization_id: OrgId) -> Vec<Project> {
        let mut projects: Vec<Project> = self
            .projects
            .iter()
            .filter(|entry| entry.value().organization_id == organization_id)
            .map(|entry| entry.value().clone())
            .collect();
        projects.sort_by(|a, b| a.slug.cmp(&b.slug));
        projects
    }

    /// Projects in the organization linked to at least one of the given
    /// teams, sorted by slug
    pub fn projects_for_teams(&self, organization_id: OrgId, team_ids: &[TeamId]) -> Vec<Project> {
        let wanted: HashSet<TeamId> = team_ids.iter().copied().collect();
        let mut projects: Vec<Project> = self
            .projects
            .iter()
            .filter(|entry| {
                let project = entry.value();
                project.organization_id == organization_id
                    && project.team_ids.iter().any(|team| wanted.contains(team))
            })
            .map(|entry| entry.value().clone())
            .collect();
        projects.sort_by(|a, b| a.slug.cmp(&b.slug));
        projects
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}
