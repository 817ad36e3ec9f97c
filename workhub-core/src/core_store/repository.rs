//! Repository contracts
//!
//! A generic CRUD surface plus per-entity specializations. Each method maps
//! to exactly one persistence operation; absent rows come back as `Ok(None)`,
//! never as errors.

use crate::core_model::{
    Channel, ChannelId, MemberRole, NewChannel, NewUser, NewWorkspace, User, UserId, Workspace,
    WorkspaceId,
};

use super::errors::StoreError;

/// Uniform create/read/update/delete over one entity type
pub trait Repository: Send + Sync {
    type Entity;
    type Draft;
    type Id;

    /// Persist a new entity built from a draft
    fn create(&self, draft: Self::Draft) -> Result<Self::Entity, StoreError>;

    /// Every stored entity
    fn get_all(&self) -> Result<Vec<Self::Entity>, StoreError>;

    /// Lookup by identifier
    fn get_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>, StoreError>;

    /// Overwrite a stored entity
    fn update(&self, entity: &Self::Entity) -> Result<(), StoreError>;

    /// Remove by identifier; reports whether a row was removed
    fn delete(&self, id: &Self::Id) -> Result<bool, StoreError>;
}

/// User persistence with unique-field lookups
pub trait UserStore: Repository<Entity = User, Draft = NewUser, Id = UserId> {
    fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
}

/// Workspace persistence with membership and channel-reference operations
pub trait WorkspaceStore:
    Repository<Entity = Workspace, Draft = NewWorkspace, Id = WorkspaceId>
{
    fn get_by_name(&self, name: &str) -> Result<Option<Workspace>, StoreError>;

    fn get_by_join_code(&self, join_code: &str) -> Result<Option<Workspace>, StoreError>;

    /// Append a member entry to the workspace's member list
    fn add_member(
        &self,
        workspace_id: &WorkspaceId,
        member_id: &UserId,
        role: MemberRole,
    ) -> Result<(), StoreError>;

    /// Append a channel reference to the workspace's channel list
    fn add_channel(
        &self,
        workspace_id: &WorkspaceId,
        channel_id: &ChannelId,
    ) -> Result<(), StoreError>;

    /// Workspaces whose member list contains the given user
    fn get_for_member(&self, member_id: &UserId) -> Result<Vec<Workspace>, StoreError>;
}

/// Channel persistence with bulk deletion
pub trait ChannelStore: Repository<Entity = Channel, Draft = NewChannel, Id = ChannelId> {
    fn get_by_workspace(&self, workspace_id: &WorkspaceId) -> Result<Vec<Channel>, StoreError>;

    /// Delete every channel whose id appears in the set; returns the count
    fn delete_many(&self, ids: &[ChannelId]) -> Result<usize, StoreError>;
}
