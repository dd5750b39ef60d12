// SPDX-License-Identifier: Apache-2.0

use rusqlite::{params, OptionalExtension};

use corkboard_core::{Role, UserId, WorkspaceId};
use corkboard_model::{User, Workspace};

use crate::rows::{role_at, user_from_row, workspace_from_row};
use crate::{Page, Result, Store, StoreError};

const WS_COLS: &str = "id, name, description, created_by, created_at, updated_at";

/// A workspace as seen by one of its members.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceRecord {
    pub workspace: Workspace,
    pub role: Role,
    pub joined_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberRecord {
    pub user: User,
    pub role: Role,
    pub joined_at: i64,
}

impl Store {
    /// Create the workspace and its creator-owner membership in one
    /// transaction: no moment exists where the workspace has no owner.
    pub fn create_workspace(&mut self, workspace: &Workspace) -> Result<()> {
        let tx = self.conn_mut().transaction()?;
        tx.execute(
            "INSERT INTO workspaces (id, name, description, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                workspace.id.as_str(),
                workspace.name,
                workspace.description,
                workspace.created_by.as_str(),
                workspace.created_at,
                workspace.updated_at
            ],
        )?;
        tx.execute(
            "INSERT INTO workspace_members (workspace_id, user_id, role, joined_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                workspace.id.as_str(),
                workspace.created_by.as_str(),
                Role::Owner.as_str(),
                workspace.created_at
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn workspace_by_id(&self, id: &WorkspaceId) -> Result<Option<Workspace>> {
        let found = self
            .conn()
            .prepare_cached(&format!("SELECT {WS_COLS} FROM workspaces WHERE id = ?1"))?
            .query_row(params![id.as_str()], workspace_from_row)
            .optional()?;
        Ok(found)
    }

    pub fn update_workspace(
        &mut self,
        id: &WorkspaceId,
        name: &str,
        description: Option<&str>,
        now_ms: i64,
    ) -> Result<Workspace> {
        let changed = self.conn().execute(
            "UPDATE workspaces SET name = ?2, description = ?3, updated_at = ?4 WHERE id = ?1",
            params![id.as_str(), name, description, now_ms],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("workspace"));
        }
        self.workspace_by_id(id)?
            .ok_or(StoreError::NotFound("workspace"))
    }

    /// Workspaces the user belongs to, most recently joined first.
    pub fn workspaces_for_user(&self, user: &UserId, page: Page) -> Result<Vec<WorkspaceRecord>> {
        let mut stmt = self.conn().prepare_cached(
            "SELECT w.id, w.name, w.description, w.created_by, w.created_at, w.updated_at,
                    m.role, m.joined_at
             FROM workspace_members m
             JOIN workspaces w ON w.id = m.workspace_id
             WHERE m.user_id = ?1
             ORDER BY m.joined_at DESC
             LIMIT ?2 OFFSET ?3",
        )?;
        let records = stmt
            .query_map(params![user.as_str(), page.limit(), page.offset()], |row| {
                Ok(WorkspaceRecord {
                    workspace: workspace_from_row(row)?,
                    role: role_at(row, 6)?,
                    joined_at: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// The freshly-read membership role for (workspace, user); `None` when
    /// no row exists. Every privileged call re-resolves through here.
    pub fn membership_role(&self, workspace: &WorkspaceId, user: &UserId) -> Result<Option<Role>> {
        let role = self
            .conn()
            .prepare_cached(
                "SELECT role FROM workspace_members WHERE workspace_id = ?1 AND user_id = ?2",
            )?
            .query_row(params![workspace.as_str(), user.as_str()], |row| {
                role_at(row, 0)
            })
            .optional()?;
        Ok(role)
    }

    pub fn workspace_members(&self, workspace: &WorkspaceId) -> Result<Vec<MemberRecord>> {
        let mut stmt = self.conn().prepare_cached(
            "SELECT u.id, u.email, u.display_name, u.avatar_url, u.created_at,
                    m.role, m.joined_at
             FROM workspace_members m
             JOIN users u ON u.id = m.user_id
             WHERE m.workspace_id = ?1
             ORDER BY m.joined_at ASC",
        )?;
        let members = stmt
            .query_map(params![workspace.as_str()], |row| {
                Ok(MemberRecord {
                    user: user_from_row(row)?,
                    role: role_at(row, 5)?,
                    joined_at: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(members)
    }

    /// Insert a membership row. A second row for the same (workspace, user)
    /// pair violates the schema's primary key and surfaces as `Conflict`.
    pub fn insert_member(
        &mut self,
        workspace: &WorkspaceId,
        user: &UserId,
        role: Role,
        now_ms: i64,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT INTO workspace_members (workspace_id, user_id, role, joined_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![workspace.as_str(), user.as_str(), role.as_str(), now_ms],
        )?;
        Ok(())
    }

    pub fn remove_member(&mut self, workspace: &WorkspaceId, user: &UserId) -> Result<()> {
        let removed = self.conn().execute(
            "DELETE FROM workspace_members WHERE workspace_id = ?1 AND user_id = ?2",
            params![workspace.as_str(), user.as_str()],
        )?;
        if removed == 0 {
            return Err(StoreError::NotFound("membership"));
        }
        Ok(())
    }

    /// Cascades through every descendant table.
    pub fn delete_workspace(&mut self, id: &WorkspaceId) -> Result<()> {
        let removed = self
            .conn()
            .execute("DELETE FROM workspaces WHERE id = ?1", params![id.as_str()])?;
        if removed == 0 {
            return Err(StoreError::NotFound("workspace"));
        }
        Ok(())
    }
}
