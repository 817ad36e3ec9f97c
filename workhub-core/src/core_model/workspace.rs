//! Workspace entity, membership, and join codes

use super::types::{ChannelId, Timestamp, UserId, WorkspaceId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a workspace join code
pub const JOIN_CODE_LEN: usize = 6;

/// Name of the channel every workspace starts with
pub const DEFAULT_CHANNEL_NAME: &str = "general";

/// A workspace groups members and channels (like Slack workspaces)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    /// Unique identifier
    pub id: WorkspaceId,

    /// Human-readable name
    pub name: String,

    /// Free-form description
    pub description: String,

    /// Short invite token distributed to new members
    pub join_code: String,

    /// Members in join order
    pub members: Vec<WorkspaceMember>,

    /// Channel references in attach order
    pub channels: Vec<ChannelId>,

    /// When the workspace was created
    pub created_at: Timestamp,

    /// Last metadata update
    pub updated_at: Timestamp,
}

impl Workspace {
    /// Check whether a user appears in the member list
    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.members.iter().any(|m| &m.member_id == user_id)
    }

    /// First member entry for the user holding the admin role, if any
    ///
    /// Authorization is boolean, so only the first match matters.
    pub fn admin_entry(&self, user_id: &UserId) -> Option<&WorkspaceMember> {
        self.members
            .iter()
            .find(|m| &m.member_id == user_id && m.role == MemberRole::Admin)
    }
}

/// Draft for persisting a new workspace; member and channel lists start empty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWorkspace {
    pub name: String,
    pub description: String,
    pub join_code: String,
}

/// The (identity, role) pair recording a user's membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceMember {
    pub member_id: UserId,
    pub role: MemberRole,
}

/// Privilege level within a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberRole {
    /// Can delete the workspace and manage membership
    Admin,
    /// Default role
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(MemberRole::Admin),
            "member" => Some(MemberRole::Member),
            _ => None,
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Generate a workspace join code
///
/// Takes a random 128-bit identifier, encodes it, keeps the first six
/// characters, and uppercases them. Uniqueness rides on the store's unique
/// index over join codes.
pub fn generate_join_code() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    raw[..JOIN_CODE_LEN].to_uppercase()
}
