//! Channel entity

use super::types::{ChannelId, Timestamp, WorkspaceId};
use serde::{Deserialize, Serialize};

/// A named channel inside a workspace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Draft for persisting a new channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChannel {
    pub workspace_id: WorkspaceId,
    pub name: String,
}
