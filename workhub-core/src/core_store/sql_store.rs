//! SQL-backed repository implementations
//!
//! All three stores share one r2d2 connection pool. Member and channel lists
//! are kept in join tables and read back in insert order.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row};

use crate::core_model::{
    avatar_url, Channel, ChannelId, MemberRole, NewChannel, NewUser, NewWorkspace, Timestamp,
    User, UserId, Workspace, WorkspaceId, WorkspaceMember,
};

use super::errors::StoreError;
use super::repository::{ChannelStore, Repository, UserStore, WorkspaceStore};

// ===== Users =====

/// User repository over SQLite
pub struct SqlUserStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqlUserStore {
    /// Create the store, running any pending migrations
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Result<Self, StoreError> {
        super::migrations::migrate(&pool)?;
        Ok(Self { pool })
    }

    fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: UserId::new(row.get::<_, String>(0)?),
            email: row.get(1)?,
            username: row.get(2)?,
            password: row.get(3)?,
            avatar: row.get(4)?,
            created_at: Timestamp::from_millis(row.get::<_, i64>(5)?.max(0) as u64),
            updated_at: Timestamp::from_millis(row.get::<_, i64>(6)?.max(0) as u64),
        })
    }

    fn get_by_field(&self, field: &str, value: &str) -> Result<Option<User>, StoreError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT id, email, username, password, avatar, created_at, updated_at
             FROM users WHERE {} = ?",
            field
        );
        let user = conn
            .query_row(&sql, params![value], Self::row_to_user)
            .optional()?;
        Ok(user)
    }
}

impl Repository for SqlUserStore {
    type Entity = User;
    type Draft = NewUser;
    type Id = UserId;

    /// Validates the draft, hashes the password, derives the avatar, and
    /// inserts the row
    fn create(&self, draft: NewUser) -> Result<User, StoreError> {
        draft.validate()?;
        let user = User::from_draft(&draft)?;

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO users (id, email, username, password, avatar, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                user.id.as_str(),
                &user.email,
                &user.username,
                &user.password,
                &user.avatar,
                user.created_at.as_millis() as i64,
                user.updated_at.as_millis() as i64,
            ],
        )?;

        Ok(user)
    }

    fn get_all(&self) -> Result<Vec<User>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, email, username, password, avatar, created_at, updated_at
             FROM users ORDER BY rowid",
        )?;
        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn get_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        self.get_by_field("id", id.as_str())
    }

    /// The avatar follows the username on every save
    fn update(&self, user: &User) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE users SET email = ?, username = ?, password = ?, avatar = ?, updated_at = ?
             WHERE id = ?",
            params![
                &user.email,
                &user.username,
                &user.password,
                avatar_url(&user.username),
                Timestamp::now().as_millis() as i64,
                user.id.as_str(),
            ],
        )?;
        Ok(())
    }

    fn delete(&self, id: &UserId) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        let removed = conn.execute("DELETE FROM users WHERE id = ?", params![id.as_str()])?;
        Ok(removed > 0)
    }
}

impl UserStore for SqlUserStore {
    fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.get_by_field("email", email)
    }

    fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.get_by_field("username", username)
    }
}

// ===== Workspaces =====

/// Workspace repository over SQLite
pub struct SqlWorkspaceStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqlWorkspaceStore {
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Result<Self, StoreError> {
        super::migrations::migrate(&pool)?;
        Ok(Self { pool })
    }

    fn row_to_workspace(row: &Row<'_>) -> rusqlite::Result<Workspace> {
        Ok(Workspace {
            id: WorkspaceId::new(row.get::<_, String>(0)?),
            name: row.get(1)?,
            description: row.get(2)?,
            join_code: row.get(3)?,
            members: Vec::new(),
            channels: Vec::new(),
            created_at: Timestamp::from_millis(row.get::<_, i64>(4)?.max(0) as u64),
            updated_at: Timestamp::from_millis(row.get::<_, i64>(5)?.max(0) as u64),
        })
    }

    /// Load the member and channel lists for a bare workspace row
    fn hydrate(
        &self,
        conn: &rusqlite::Connection,
        mut workspace: Workspace,
    ) -> Result<Workspace, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT member_id, role FROM workspace_members
             WHERE workspace_id = ? ORDER BY rowid",
        )?;
        let members = stmt
            .query_map(params![workspace.id.as_str()], |row| {
                let member_id = UserId::new(row.get::<_, String>(0)?);
                let role_str: String = row.get(1)?;
                Ok(WorkspaceMember {
                    member_id,
                    role: MemberRole::parse(&role_str).unwrap_or(MemberRole::Member),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        workspace.members = members;

        let mut stmt = conn.prepare(
            "SELECT channel_id FROM workspace_channels
             WHERE workspace_id = ? ORDER BY rowid",
        )?;
        let channels = stmt
            .query_map(params![workspace.id.as_str()], |row| {
                Ok(ChannelId::new(row.get::<_, String>(0)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        workspace.channels = channels;

        Ok(workspace)
    }

    fn get_by_field(&self, field: &str, value: &str) -> Result<Option<Workspace>, StoreError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT id, name, description, join_code, created_at, updated_at
             FROM workspaces WHERE {} = ?",
            field
        );
        let workspace = conn
            .query_row(&sql, params![value], Self::row_to_workspace)
            .optional()?;

        match workspace {
            Some(ws) => Ok(Some(self.hydrate(&conn, ws)?)),
            None => Ok(None),
        }
    }
}

impl Repository for SqlWorkspaceStore {
    type Entity = Workspace;
    type Draft = NewWorkspace;
    type Id = WorkspaceId;

    /// Member and channel lists start empty; they are appended to separately
    fn create(&self, draft: NewWorkspace) -> Result<Workspace, StoreError> {
        let now = Timestamp::now();
        let workspace = Workspace {
            id: WorkspaceId::generate(),
            name: draft.name,
            description: draft.description,
            join_code: draft.join_code,
            members: Vec::new(),
            channels: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO workspaces (id, name, description, join_code, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                workspace.id.as_str(),
                &workspace.name,
                &workspace.description,
                &workspace.join_code,
                workspace.created_at.as_millis() as i64,
                workspace.updated_at.as_millis() as i64,
            ],
        )?;

        Ok(workspace)
    }

    fn get_all(&self) -> Result<Vec<Workspace>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT id FROM workspaces ORDER BY rowid")?;
        let ids = stmt
            .query_map([], |row| Ok(WorkspaceId::new(row.get::<_, String>(0)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        let mut workspaces = Vec::new();
        for id in ids {
            if let Some(ws) = self.get_by_id(&id)? {
                workspaces.push(ws);
            }
        }
        Ok(workspaces)
    }

    fn get_by_id(&self, id: &WorkspaceId) -> Result<Option<Workspace>, StoreError> {
        self.get_by_field("id", id.as_str())
    }

    fn update(&self, workspace: &Workspace) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE workspaces SET name = ?, description = ?, join_code = ?, updated_at = ?
             WHERE id = ?",
            params![
                &workspace.name,
                &workspace.description,
                &workspace.join_code,
                Timestamp::now().as_millis() as i64,
                workspace.id.as_str(),
            ],
        )?;
        Ok(())
    }

    /// Removes the workspace row together with its member entries and channel
    /// references, in one transaction. Channel entities are not touched.
    fn delete(&self, id: &WorkspaceId) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM workspace_members WHERE workspace_id = ?",
            params![id.as_str()],
        )?;
        tx.execute(
            "DELETE FROM workspace_channels WHERE workspace_id = ?",
            params![id.as_str()],
        )?;
        let removed = tx.execute("DELETE FROM workspaces WHERE id = ?", params![id.as_str()])?;

        tx.commit()?;
        Ok(removed > 0)
    }
}

impl WorkspaceStore for SqlWorkspaceStore {
    fn get_by_name(&self, name: &str) -> Result<Option<Workspace>, StoreError> {
        self.get_by_field("name", name)
    }

    fn get_by_join_code(&self, join_code: &str) -> Result<Option<Workspace>, StoreError> {
        self.get_by_field("join_code", join_code)
    }

    fn add_member(
        &self,
        workspace_id: &WorkspaceId,
        member_id: &UserId,
        role: MemberRole,
    ) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO workspace_members (workspace_id, member_id, role) VALUES (?, ?, ?)",
            params![workspace_id.as_str(), member_id.as_str(), role.as_str()],
        )?;
        Ok(())
    }

    fn add_channel(
        &self,
        workspace_id: &WorkspaceId,
        channel_id: &ChannelId,
    ) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO workspace_channels (workspace_id, channel_id) VALUES (?, ?)",
            params![workspace_id.as_str(), channel_id.as_str()],
        )?;
        Ok(())
    }

    fn get_for_member(&self, member_id: &UserId) -> Result<Vec<Workspace>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT workspace_id FROM workspace_members
             WHERE member_id = ? ORDER BY rowid",
        )?;
        let ids = stmt
            .query_map(params![member_id.as_str()], |row| {
                Ok(WorkspaceId::new(row.get::<_, String>(0)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        let mut workspaces = Vec::new();
        for id in ids {
            if let Some(ws) = self.get_by_id(&id)? {
                workspaces.push(ws);
            }
        }
        Ok(workspaces)
    }
}

// ===== Channels =====

/// Channel repository over SQLite
pub struct SqlChannelStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqlChannelStore {
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Result<Self, StoreError> {
        super::migrations::migrate(&pool)?;
        Ok(Self { pool })
    }

    fn row_to_channel(row: &Row<'_>) -> rusqlite::Result<Channel> {
        Ok(Channel {
            id: ChannelId::new(row.get::<_, String>(0)?),
            workspace_id: WorkspaceId::new(row.get::<_, String>(1)?),
            name: row.get(2)?,
            created_at: Timestamp::from_millis(row.get::<_, i64>(3)?.max(0) as u64),
            updated_at: Timestamp::from_millis(row.get::<_, i64>(4)?.max(0) as u64),
        })
    }
}

impl Repository for SqlChannelStore {
    type Entity = Channel;
    type Draft = NewChannel;
    type Id = ChannelId;

    fn create(&self, draft: NewChannel) -> Result<Channel, StoreError> {
        let now = Timestamp::now();
        let channel = Channel {
            id: ChannelId::generate(),
            workspace_id: draft.workspace_id,
            name: draft.name,
            created_at: now,
            updated_at: now,
        };

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO channels (id, workspace_id, name, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                channel.id.as_str(),
                channel.workspace_id.as_str(),
                &channel.name,
                channel.created_at.as_millis() as i64,
                channel.updated_at.as_millis() as i64,
            ],
        )?;

        Ok(channel)
    }

    fn get_all(&self) -> Result<Vec<Channel>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, workspace_id, name, created_at, updated_at FROM channels ORDER BY rowid",
        )?;
        let channels = stmt
            .query_map([], Self::row_to_channel)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(channels)
    }

    fn get_by_id(&self, id: &ChannelId) -> Result<Option<Channel>, StoreError> {
        let conn = self.pool.get()?;
        let channel = conn
            .query_row(
                "SELECT id, workspace_id, name, created_at, updated_at
                 FROM channels WHERE id = ?",
                params![id.as_str()],
                Self::row_to_channel,
            )
            .optional()?;
        Ok(channel)
    }

    fn update(&self, channel: &Channel) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE channels SET name = ?, updated_at = ? WHERE id = ?",
            params![
                &channel.name,
                Timestamp::now().as_millis() as i64,
                channel.id.as_str(),
            ],
        )?;
        Ok(())
    }

    fn delete(&self, id: &ChannelId) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        let removed = conn.execute("DELETE FROM channels WHERE id = ?", params![id.as_str()])?;
        Ok(removed > 0)
    }
}

impl ChannelStore for SqlChannelStore {
    fn get_by_workspace(&self, workspace_id: &WorkspaceId) -> Result<Vec<Channel>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, workspace_id, name, created_at, updated_at
             FROM channels WHERE workspace_id = ? ORDER BY rowid",
        )?;
        let channels = stmt
            .query_map(params![workspace_id.as_str()], Self::row_to_channel)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(channels)
    }

    fn delete_many(&self, ids: &[ChannelId]) -> Result<usize, StoreError> {
        let conn = self.pool.get()?;
        let tx = conn.unchecked_transaction()?;

        let mut removed = 0;
        for id in ids {
            removed += tx.execute("DELETE FROM channels WHERE id = ?", params![id.as_str()])?;
        }

        tx.commit()?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_store::memory_pool;

    fn user_draft(email: &str, username: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: username.to_string(),
            password: "secret123".to_string(),
        }
    }

    fn workspace_draft(name: &str) -> NewWorkspace {
        NewWorkspace {
            name: name.to_string(),
            description: "a team workspace".to_string(),
            join_code: crate::core_model::generate_join_code(),
        }
    }

    #[test]
    fn test_user_create_and_lookups() {
        let store = SqlUserStore::new(memory_pool().unwrap()).unwrap();
        let created = store.create(user_draft("alice@example.com", "alice42")).unwrap();

        let by_id = store.get_by_id(&created.id).unwrap().unwrap();
        assert_eq!(by_id.email, "alice@example.com");

        let by_email = store.get_by_email("alice@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        let by_username = store.get_by_username("alice42").unwrap().unwrap();
        assert_eq!(by_username.id, created.id);

        // Absent rows are not errors
        assert!(store.get_by_email("nobody@example.com").unwrap().is_none());
        assert!(store.get_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn test_user_password_stored_hashed() {
        let store = SqlUserStore::new(memory_pool().unwrap()).unwrap();
        let created = store.create(user_draft("bob@example.com", "bob42")).unwrap();

        let stored = store.get_by_id(&created.id).unwrap().unwrap();
        assert_ne!(stored.password, "secret123");
        assert!(stored.verify_password("secret123"));
        assert_eq!(stored.avatar, "https://robohash.org/bob42");
    }

    #[test]
    fn test_user_duplicate_email_is_duplicate_key() {
        let store = SqlUserStore::new(memory_pool().unwrap()).unwrap();
        store.create(user_draft("carol@example.com", "carol1")).unwrap();

        let err = store
            .create(user_draft("carol@example.com", "carol2"))
            .unwrap_err();
        assert!(err.is_duplicate());
        assert!(err.to_string().contains("users.email"));
    }

    #[test]
    fn test_user_duplicate_username_is_duplicate_key() {
        let store = SqlUserStore::new(memory_pool().unwrap()).unwrap();
        store.create(user_draft("dave@example.com", "dave42")).unwrap();

        let err = store
            .create(user_draft("other@example.com", "dave42"))
            .unwrap_err();
        assert!(err.is_duplicate());
        assert!(err.to_string().contains("users.username"));
    }

    #[test]
    fn test_user_invalid_draft_is_validation_error() {
        let store = SqlUserStore::new(memory_pool().unwrap()).unwrap();
        let err = store.create(user_draft("broken", "x")).unwrap_err();

        match err {
            StoreError::Validation(v) => {
                assert!(v.messages().contains(&"Please fill a valid email address"));
                assert!(v.messages().contains(&"Username must be at least 3 characters"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_workspace_create_starts_empty() {
        let store = SqlWorkspaceStore::new(memory_pool().unwrap()).unwrap();
        let ws = store.create(workspace_draft("eng")).unwrap();

        let loaded = store.get_by_id(&ws.id).unwrap().unwrap();
        assert!(loaded.members.is_empty());
        assert!(loaded.channels.is_empty());
        assert_eq!(loaded.join_code, ws.join_code);
    }

    #[test]
    fn test_workspace_member_and_channel_lists_keep_order() {
        let pool = memory_pool().unwrap();
        let store = SqlWorkspaceStore::new(pool).unwrap();
        let ws = store.create(workspace_draft("eng")).unwrap();

        store
            .add_member(&ws.id, &UserId::new("alice"), MemberRole::Admin)
            .unwrap();
        store
            .add_member(&ws.id, &UserId::new("bob"), MemberRole::Member)
            .unwrap();
        store.add_channel(&ws.id, &ChannelId::new("c1")).unwrap();
        store.add_channel(&ws.id, &ChannelId::new("c2")).unwrap();

        let loaded = store.get_by_id(&ws.id).unwrap().unwrap();
        assert_eq!(loaded.members.len(), 2);
        assert_eq!(loaded.members[0].member_id, UserId::new("alice"));
        assert_eq!(loaded.members[0].role, MemberRole::Admin);
        assert_eq!(loaded.members[1].member_id, UserId::new("bob"));
        assert_eq!(
            loaded.channels,
            vec![ChannelId::new("c1"), ChannelId::new("c2")]
        );
    }

    #[test]
    fn test_workspace_duplicate_name_description_rejected() {
        let store = SqlWorkspaceStore::new(memory_pool().unwrap()).unwrap();
        store.create(workspace_draft("eng")).unwrap();

        let err = store.create(workspace_draft("eng")).unwrap_err();
        assert!(err.is_duplicate());
    }

    #[test]
    fn test_workspace_same_name_different_description_allowed() {
        let store = SqlWorkspaceStore::new(memory_pool().unwrap()).unwrap();
        store.create(workspace_draft("eng")).unwrap();

        let mut draft = workspace_draft("eng");
        draft.description = "another description".to_string();
        assert!(store.create(draft).is_ok());
    }

    #[test]
    fn test_workspace_lookup_by_name_and_join_code() {
        let store = SqlWorkspaceStore::new(memory_pool().unwrap()).unwrap();
        let ws = store.create(workspace_draft("design")).unwrap();

        assert_eq!(
            store.get_by_name("design").unwrap().unwrap().id,
            ws.id
        );
        assert_eq!(
            store.get_by_join_code(&ws.join_code).unwrap().unwrap().id,
            ws.id
        );
        assert!(store.get_by_name("missing").unwrap().is_none());
        assert!(store.get_by_join_code("ZZZZZZ").unwrap().is_none());
    }

    #[test]
    fn test_get_for_member_filters_by_membership() {
        let store = SqlWorkspaceStore::new(memory_pool().unwrap()).unwrap();
        let alice = UserId::new("alice");

        let first = store.create(workspace_draft("one")).unwrap();
        let second = store.create(workspace_draft("two")).unwrap();
        let _third = store.create(workspace_draft("three")).unwrap();

        store.add_member(&first.id, &alice, MemberRole::Admin).unwrap();
        store.add_member(&second.id, &alice, MemberRole::Member).unwrap();

        let mine = store.get_for_member(&alice).unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, first.id);
        assert_eq!(mine[1].id, second.id);
    }

    #[test]
    fn test_workspace_delete_removes_lists() {
        let pool = memory_pool().unwrap();
        let store = SqlWorkspaceStore::new(pool.clone()).unwrap();
        let ws = store.create(workspace_draft("gone")).unwrap();
        store
            .add_member(&ws.id, &UserId::new("alice"), MemberRole::Admin)
            .unwrap();
        store.add_channel(&ws.id, &ChannelId::new("c1")).unwrap();

        assert!(store.delete(&ws.id).unwrap());
        assert!(store.get_by_id(&ws.id).unwrap().is_none());

        let conn = pool.get().unwrap();
        let members: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM workspace_members WHERE workspace_id = ?",
                params![ws.id.as_str()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(members, 0);

        // Deleting again reports nothing removed
        assert!(!store.delete(&ws.id).unwrap());
    }

    #[test]
    fn test_channel_crud_and_delete_many() {
        let pool = memory_pool().unwrap();
        let store = SqlChannelStore::new(pool).unwrap();
        let workspace_id = WorkspaceId::generate();

        let general = store
            .create(NewChannel {
                workspace_id: workspace_id.clone(),
                name: "general".to_string(),
            })
            .unwrap();
        let random = store
            .create(NewChannel {
                workspace_id: workspace_id.clone(),
                name: "random".to_string(),
            })
            .unwrap();

        let listed = store.get_by_workspace(&workspace_id).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "general");

        let removed = store
            .delete_many(&[general.id.clone(), random.id.clone()])
            .unwrap();
        assert_eq!(removed, 2);
        assert!(store.get_by_id(&general.id).unwrap().is_none());
        assert!(store.get_by_id(&random.id).unwrap().is_none());
    }
}
