//! Workspace lifecycle and membership
//!
//! Creation and deletion are multi-step sequences against the store with no
//! cross-step transaction. Creation compensates by deleting the partial
//! workspace when a later step fails; deletion keeps the channels-first
//! ordering, so a failure between the two steps leaves a workspace with
//! dangling channel references.

use std::sync::Arc;
use tracing::{debug, warn};

use workhub_core::core_model::{
    generate_join_code, ChannelId, MemberRole, NewChannel, NewWorkspace, UserId, Workspace,
    WorkspaceId, DEFAULT_CHANNEL_NAME,
};
use workhub_core::core_store::{ChannelStore, Repository, StoreError, WorkspaceStore};

use crate::error::{ApiError, ApiResult};

/// Input for the creation flow
#[derive(Debug, Clone)]
pub struct CreateWorkspace {
    pub name: String,
    pub description: String,
    /// The creator; becomes the first member, with the admin role
    pub owner: UserId,
}

/// Orchestrates workspace operations over the workspace and channel stores
pub struct WorkspaceService {
    workspaces: Arc<dyn WorkspaceStore>,
    channels: Arc<dyn ChannelStore>,
}

impl WorkspaceService {
    pub fn new(workspaces: Arc<dyn WorkspaceStore>, channels: Arc<dyn ChannelStore>) -> Self {
        Self {
            workspaces,
            channels,
        }
    }

    /// Create a workspace with its creator as admin and a "general" channel
    pub async fn create_workspace(&self, input: CreateWorkspace) -> ApiResult<Workspace> {
        let join_code = generate_join_code();

        let workspace = match self.workspaces.create(NewWorkspace {
            name: input.name,
            description: input.description,
            join_code,
        }) {
            Ok(ws) => ws,
            Err(StoreError::Validation(errors)) => return Err(ApiError::validation(errors)),
            Err(err) if err.is_duplicate() => {
                return Err(ApiError::validation_message(
                    "workspace",
                    "A workspace with same details already exists",
                ))
            }
            Err(other) => return Err(other.into()),
        };

        debug!(workspace_id = %workspace.id, "created workspace");

        if let Err(err) = self.attach_defaults(&workspace.id, &input.owner) {
            warn!(workspace_id = %workspace.id, error = %err, "workspace setup failed, rolling back");
            self.roll_back_creation(&workspace.id);
            return Err(err.into());
        }

        self.workspaces
            .get_by_id(&workspace.id)?
            .ok_or_else(workspace_id_not_found)
    }

    fn attach_defaults(&self, workspace_id: &WorkspaceId, owner: &UserId) -> Result<(), StoreError> {
        // the creator of the workspace is admin
        self.workspaces
            .add_member(workspace_id, owner, MemberRole::Admin)?;

        let channel = self.channels.create(NewChannel {
            workspace_id: workspace_id.clone(),
            name: DEFAULT_CHANNEL_NAME.to_string(),
        })?;
        self.workspaces.add_channel(workspace_id, &channel.id)?;

        Ok(())
    }

    /// Best-effort removal of a partially initialized workspace
    ///
    /// Channels are looked up by workspace rather than through the reference
    /// list, which may not have been written yet when the failure hit.
    fn roll_back_creation(&self, workspace_id: &WorkspaceId) {
        match self.channels.get_by_workspace(workspace_id) {
            Ok(channels) => {
                let ids: Vec<ChannelId> = channels.into_iter().map(|c| c.id).collect();
                if !ids.is_empty() {
                    if let Err(err) = self.channels.delete_many(&ids) {
                        warn!(workspace_id = %workspace_id, error = %err, "rollback could not remove channels");
                    }
                }
            }
            Err(err) => {
                warn!(workspace_id = %workspace_id, error = %err, "rollback could not list channels")
            }
        }

        if let Err(err) = self.workspaces.delete(workspace_id) {
            warn!(workspace_id = %workspace_id, error = %err, "rollback could not remove workspace");
        }
    }

    pub async fn get_all_workspaces(&self) -> ApiResult<Vec<Workspace>> {
        Ok(self.workspaces.get_all()?)
    }

    /// Lookup by id; an absent workspace is an error here
    pub async fn get_workspace_by_id(&self, workspace_id: &WorkspaceId) -> ApiResult<Workspace> {
        self.workspaces
            .get_by_id(workspace_id)?
            .ok_or_else(workspace_id_not_found)
    }

    /// Lookup by name; an absent workspace is not an error
    pub async fn get_workspace_by_name(&self, name: &str) -> ApiResult<Option<Workspace>> {
        Ok(self.workspaces.get_by_name(name)?)
    }

    /// Delete a workspace and its channels, admin members only
    pub async fn delete_workspace_by_id(
        &self,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
    ) -> ApiResult<bool> {
        let workspace = self.workspaces.get_by_id(workspace_id)?.ok_or_else(|| {
            ApiError::not_found("Invalid data", "workspace not found with this id")
        })?;

        // Only an entry with the admin role authorizes; plain membership
        // does not, despite what the error message suggests
        if workspace.admin_entry(user_id).is_none() {
            return Err(ApiError::unauthorized(
                "User is either not a member or an admin of the workspace",
                "User is not allowed to delete the workspace",
            ));
        }

        // channels strictly before the workspace record
        self.channels.delete_many(&workspace.channels)?;
        let deleted = self.workspaces.delete(workspace_id)?;

        debug!(workspace_id = %workspace_id, "deleted workspace");
        Ok(deleted)
    }

    /// Workspaces whose member list contains the given user
    pub async fn fetch_workspaces_for_member(
        &self,
        member_id: &UserId,
    ) -> ApiResult<Vec<Workspace>> {
        Ok(self.workspaces.get_for_member(member_id)?)
    }

    /// Redeem a join code, adding the user as a plain member
    pub async fn join_workspace(
        &self,
        join_code: &str,
        member_id: &UserId,
    ) -> ApiResult<Workspace> {
        let workspace = self.workspaces.get_by_join_code(join_code)?.ok_or_else(|| {
            ApiError::not_found(
                "Invalid join code received",
                "workspace with this join code does not exist",
            )
        })?;

        if workspace.is_member(member_id) {
            return Err(ApiError::validation_message(
                "member",
                "User is already a member of the workspace",
            ));
        }

        self.workspaces
            .add_member(&workspace.id, member_id, MemberRole::Member)?;

        self.workspaces
            .get_by_id(&workspace.id)?
            .ok_or_else(workspace_id_not_found)
    }
}

fn workspace_id_not_found() -> ApiError {
    ApiError::not_found("Invalid id received", "workspace with this id does not exist")
}
