// SPDX-License-Identifier: Apache-2.0

use rusqlite::{params, OptionalExtension};

use corkboard_core::{InvitationId, WorkspaceId};
use corkboard_model::{User, WorkspaceInvitation};

use crate::rows::{id_at, role_at};
use crate::{Result, Store, StoreError};

const INV_COLS: &str = "id, workspace_id, email, role, invited_by, created_at";

fn invitation_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<WorkspaceInvitation> {
    Ok(WorkspaceInvitation {
        id: id_at(row, 0)?,
        workspace_id: id_at(row, 1)?,
        email: row.get(2)?,
        role: role_at(row, 3)?,
        invited_by: id_at(row, 4)?,
        created_at: row.get(5)?,
    })
}

impl Store {
    /// Create a pending invitation.
    ///
    /// Rejected with `Conflict` when the email already resolves to a member
    /// of the workspace, or when a pending invitation for (workspace, email)
    /// already exists (schema uniqueness).
    pub fn create_invitation(&mut self, invitation: &WorkspaceInvitation) -> Result<()> {
        let already_member: Option<i64> = self
            .conn()
            .prepare_cached(
                "SELECT 1 FROM workspace_members m
                 JOIN users u ON u.id = m.user_id
                 WHERE m.workspace_id = ?1 AND u.email = ?2",
            )?
            .query_row(
                params![invitation.workspace_id.as_str(), invitation.email],
                |row| row.get(0),
            )
            .optional()?;
        if already_member.is_some() {
            return Err(StoreError::Conflict(format!(
                "{} is already a member of this workspace",
                invitation.email
            )));
        }
        self.conn().execute(
            "INSERT INTO workspace_invitations (id, workspace_id, email, role, invited_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                invitation.id.as_str(),
                invitation.workspace_id.as_str(),
                invitation.email,
                invitation.role.as_str(),
                invitation.invited_by.as_str(),
                invitation.created_at
            ],
        )?;
        Ok(())
    }

    pub fn invitation_by_id(&self, id: &InvitationId) -> Result<Option<WorkspaceInvitation>> {
        let found = self
            .conn()
            .prepare_cached(&format!(
                "SELECT {INV_COLS} FROM workspace_invitations WHERE id = ?1"
            ))?
            .query_row(params![id.as_str()], invitation_from_row)
            .optional()?;
        Ok(found)
    }

    pub fn invitations_for_workspace(
        &self,
        workspace: &WorkspaceId,
    ) -> Result<Vec<WorkspaceInvitation>> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "SELECT {INV_COLS} FROM workspace_invitations
             WHERE workspace_id = ?1 ORDER BY created_at ASC"
        ))?;
        let invitations = stmt
            .query_map(params![workspace.as_str()], invitation_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(invitations)
    }

    pub fn invitations_for_email(&self, email: &str) -> Result<Vec<WorkspaceInvitation>> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "SELECT {INV_COLS} FROM workspace_invitations
             WHERE email = ?1 ORDER BY created_at ASC"
        ))?;
        let invitations = stmt
            .query_map(params![email], invitation_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(invitations)
    }

    /// Convert the invitation into a membership with the proposed role and
    /// delete it, in one transaction. A second accept finds no invitation
    /// row and fails with `NotFound` before any membership write — the
    /// operation is idempotent in effect, never in duplication.
    pub fn accept_invitation(
        &mut self,
        id: &InvitationId,
        accepting_user: &User,
        now_ms: i64,
    ) -> Result<WorkspaceInvitation> {
        let tx = self.conn_mut().transaction()?;
        let invitation = tx
            .prepare(&format!(
                "SELECT {INV_COLS} FROM workspace_invitations WHERE id = ?1"
            ))?
            .query_row(params![id.as_str()], invitation_from_row)
            .optional()?
            .ok_or(StoreError::NotFound("invitation"))?;
        if !invitation.email.eq_ignore_ascii_case(&accepting_user.email) {
            return Err(StoreError::NotFound("invitation"));
        }
        tx.execute(
            "INSERT INTO workspace_members (workspace_id, user_id, role, joined_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                invitation.workspace_id.as_str(),
                accepting_user.id.as_str(),
                invitation.role.as_str(),
                now_ms
            ],
        )?;
        tx.execute(
            "DELETE FROM workspace_invitations WHERE id = ?1",
            params![id.as_str()],
        )?;
        tx.commit()?;
        Ok(invitation)
    }

    /// Reject or revoke: delete without creating a membership.
    pub fn delete_invitation(&mut self, id: &InvitationId) -> Result<()> {
        let removed = self.conn().execute(
            "DELETE FROM workspace_invitations WHERE id = ?1",
            params![id.as_str()],
        )?;
        if removed == 0 {
            return Err(StoreError::NotFound("invitation"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use corkboard_core::{now_ms, InvitationId, Role};
    use corkboard_model::WorkspaceInvitation;

    use crate::{testutil, StoreError};

    fn invitation_for(
        ws: &corkboard_model::Workspace,
        email: &str,
        role: Role,
        inviter: &corkboard_model::User,
    ) -> WorkspaceInvitation {
        WorkspaceInvitation {
            id: InvitationId::mint(),
            workspace_id: ws.id.clone(),
            email: email.to_string(),
            role,
            invited_by: inviter.id.clone(),
            created_at: now_ms(),
        }
    }

    #[test]
    fn accept_converts_to_membership_and_deletes_the_invitation() {
        let mut store = testutil::store();
        let ada = testutil::user(&mut store, "ada@example.com", "ada");
        let bob = testutil::user(&mut store, "bob@example.com", "bob");
        let ws = testutil::workspace(&mut store, &ada, "Research");

        let invitation = invitation_for(&ws, "bob@example.com", Role::Member, &ada);
        store.create_invitation(&invitation).expect("invite");

        store
            .accept_invitation(&invitation.id, &bob, now_ms())
            .expect("accept");
        assert_eq!(
            store.membership_role(&ws.id, &bob.id).expect("query"),
            Some(Role::Member)
        );
        assert_eq!(store.invitation_by_id(&invitation.id).expect("query"), None);
    }

    #[test]
    fn second_accept_is_not_found_and_creates_nothing() {
        let mut store = testutil::store();
        let ada = testutil::user(&mut store, "ada@example.com", "ada");
        let bob = testutil::user(&mut store, "bob@example.com", "bob");
        let ws = testutil::workspace(&mut store, &ada, "Research");

        let invitation = invitation_for(&ws, "bob@example.com", Role::Member, &ada);
        store.create_invitation(&invitation).expect("invite");
        store
            .accept_invitation(&invitation.id, &bob, now_ms())
            .expect("first accept");

        let second = store.accept_invitation(&invitation.id, &bob, now_ms());
        assert!(matches!(second, Err(StoreError::NotFound("invitation"))));
        assert_eq!(
            store.workspace_members(&ws.id).expect("members").len(),
            2
        );
    }

    #[test]
    fn inviting_an_existing_member_conflicts() {
        let mut store = testutil::store();
        let ada = testutil::user(&mut store, "ada@example.com", "ada");
        let bob = testutil::user(&mut store, "bob@example.com", "bob");
        let ws = testutil::workspace(&mut store, &ada, "Research");
        testutil::member(&mut store, &ws, &bob, Role::Member);

        let invitation = invitation_for(&ws, "bob@example.com", Role::Admin, &ada);
        assert!(matches!(
            store.create_invitation(&invitation),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn duplicate_pending_invitation_conflicts() {
        let mut store = testutil::store();
        let ada = testutil::user(&mut store, "ada@example.com", "ada");
        let ws = testutil::workspace(&mut store, &ada, "Research");

        store
            .create_invitation(&invitation_for(&ws, "new@example.com", Role::Member, &ada))
            .expect("first invite");
        assert!(matches!(
            store.create_invitation(&invitation_for(&ws, "new@example.com", Role::Guest, &ada)),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn accept_requires_the_invited_email() {
        let mut store = testutil::store();
        let ada = testutil::user(&mut store, "ada@example.com", "ada");
        let eve = testutil::user(&mut store, "eve@example.com", "eve");
        let ws = testutil::workspace(&mut store, &ada, "Research");

        let invitation = invitation_for(&ws, "bob@example.com", Role::Member, &ada);
        store.create_invitation(&invitation).expect("invite");

        assert!(matches!(
            store.accept_invitation(&invitation.id, &eve, now_ms()),
            Err(StoreError::NotFound(_))
        ));
        // Rejected accepts leave the invitation pending.
        assert!(store.invitation_by_id(&invitation.id).expect("query").is_some());
    }

    #[test]
    fn reject_deletes_without_creating_membership() {
        let mut store = testutil::store();
        let ada = testutil::user(&mut store, "ada@example.com", "ada");
        let bob = testutil::user(&mut store, "bob@example.com", "bob");
        let ws = testutil::workspace(&mut store, &ada, "Research");

        let invitation = invitation_for(&ws, "bob@example.com", Role::Member, &ada);
        store.create_invitation(&invitation).expect("invite");
        store.delete_invitation(&invitation.id).expect("reject");

        assert_eq!(store.membership_role(&ws.id, &bob.id).expect("query"), None);
        assert!(matches!(
            store.delete_invitation(&invitation.id),
            Err(StoreError::NotFound(_))
        ));
    }
}
