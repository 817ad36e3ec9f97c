//! Data model: users, workspaces, channels, and shared types

pub mod channel;
pub mod types;
pub mod user;
pub mod validation;
pub mod workspace;

pub use channel::{Channel, NewChannel};
pub use types::{ChannelId, Timestamp, UserId, WorkspaceId};
pub use user::{avatar_url, hash_password, NewUser, User};
pub use validation::{FieldError, ValidationError};
pub use workspace::{
    generate_join_code, MemberRole, NewWorkspace, Workspace, WorkspaceMember,
    DEFAULT_CHANNEL_NAME, JOIN_CODE_LEN,
};
