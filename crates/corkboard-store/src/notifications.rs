// SPDX-License-Identifier: Apache-2.0

use rusqlite::{params, OptionalExtension};

use corkboard_core::{NotificationId, UserId};
use corkboard_model::Notification;

use crate::rows::notification_from_row;
use crate::{Page, Result, Store, StoreError};

const NOTIFICATION_COLS: &str = "id, user_id, workspace_id, task_id, kind, title, body, payload, \
                                 is_read, read_at, created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotificationCounts {
    pub total: u32,
    pub unread: u32,
}

impl Store {
    pub fn create_notification(&mut self, notification: &Notification) -> Result<()> {
        self.conn().execute(
            "INSERT INTO notifications (id, user_id, workspace_id, task_id, kind, title, body,
                                        payload, is_read, read_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                notification.id.as_str(),
                notification.user_id.as_str(),
                notification.workspace_id.as_str(),
                notification.task_id.as_ref().map(|id| id.as_str()),
                notification.kind.as_str(),
                notification.title,
                notification.body,
                notification.payload.to_string(),
                notification.is_read as i64,
                notification.read_at,
                notification.created_at
            ],
        )?;
        Ok(())
    }

    /// Newest first; `unread_only` narrows to unread rows.
    pub fn notifications_for_user(
        &self,
        user: &UserId,
        unread_only: bool,
        page: Page,
    ) -> Result<Vec<Notification>> {
        let sql = if unread_only {
            format!(
                "SELECT {NOTIFICATION_COLS} FROM notifications
                 WHERE user_id = ?1 AND is_read = 0
                 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
            )
        } else {
            format!(
                "SELECT {NOTIFICATION_COLS} FROM notifications
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
            )
        };
        let mut stmt = self.conn().prepare_cached(&sql)?;
        let notifications = stmt
            .query_map(
                params![user.as_str(), page.limit(), page.offset()],
                notification_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notifications)
    }

    /// Mark one notification read; scoped to the recipient so one user
    /// cannot consume another's notifications.
    pub fn mark_notification_read(
        &mut self,
        id: &NotificationId,
        user: &UserId,
        now_ms: i64,
    ) -> Result<Notification> {
        let changed = self.conn().execute(
            "UPDATE notifications SET is_read = 1, read_at = ?3
             WHERE id = ?1 AND user_id = ?2",
            params![id.as_str(), user.as_str(), now_ms],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("notification"));
        }
        let found = self
            .conn()
            .prepare_cached(&format!(
                "SELECT {NOTIFICATION_COLS} FROM notifications WHERE id = ?1"
            ))?
            .query_row(params![id.as_str()], notification_from_row)
            .optional()?;
        found.ok_or(StoreError::NotFound("notification"))
    }

    /// Bulk read; returns how many rows flipped.
    pub fn mark_all_notifications_read(&mut self, user: &UserId, now_ms: i64) -> Result<u32> {
        let changed = self.conn().execute(
            "UPDATE notifications SET is_read = 1, read_at = ?2
             WHERE user_id = ?1 AND is_read = 0",
            params![user.as_str(), now_ms],
        )?;
        Ok(changed as u32)
    }

    pub fn notification_counts(&self, user: &UserId) -> Result<NotificationCounts> {
        let (total, unread): (i64, i64) = self
            .conn()
            .prepare_cached(
                "SELECT COUNT(*), COALESCE(SUM(CASE WHEN is_read = 0 THEN 1 ELSE 0 END), 0)
                 FROM notifications WHERE user_id = ?1",
            )?
            .query_row(params![user.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;
        Ok(NotificationCounts {
            total: total as u32,
            unread: unread as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use corkboard_core::{now_ms, NotificationId};
    use corkboard_model::{Notification, NotificationKind};

    use crate::{testutil, Page, StoreError};

    fn notification_for(
        user: &corkboard_model::User,
        ws: &corkboard_model::Workspace,
        created_at: i64,
    ) -> Notification {
        Notification {
            id: NotificationId::mint(),
            user_id: user.id.clone(),
            workspace_id: ws.id.clone(),
            task_id: None,
            kind: NotificationKind::Mentioned,
            title: "You were mentioned".to_string(),
            body: "ada mentioned you".to_string(),
            payload: serde_json::json!({}),
            is_read: false,
            read_at: None,
            created_at,
        }
    }

    #[test]
    fn unread_filter_and_counts() {
        let mut store = testutil::store();
        let ada = testutil::user(&mut store, "ada@example.com", "ada");
        let ws = testutil::workspace(&mut store, &ada, "Research");

        let first = notification_for(&ada, &ws, 1_000);
        let second = notification_for(&ada, &ws, 2_000);
        store.create_notification(&first).expect("first");
        store.create_notification(&second).expect("second");

        store
            .mark_notification_read(&first.id, &ada.id, now_ms())
            .expect("read one");

        let unread = store
            .notifications_for_user(&ada.id, true, Page::default())
            .expect("unread");
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, second.id);

        let counts = store.notification_counts(&ada.id).expect("counts");
        assert_eq!(counts.total, 2);
        assert_eq!(counts.unread, 1);
    }

    #[test]
    fn recipients_cannot_read_each_others_notifications() {
        let mut store = testutil::store();
        let ada = testutil::user(&mut store, "ada@example.com", "ada");
        let bob = testutil::user(&mut store, "bob@example.com", "bob");
        let ws = testutil::workspace(&mut store, &ada, "Research");

        let note = notification_for(&ada, &ws, 1_000);
        store.create_notification(&note).expect("create");

        assert!(matches!(
            store.mark_notification_read(&note.id, &bob.id, now_ms()),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn bulk_read_flips_only_unread_rows() {
        let mut store = testutil::store();
        let ada = testutil::user(&mut store, "ada@example.com", "ada");
        let ws = testutil::workspace(&mut store, &ada, "Research");

        for at in [1_000, 2_000, 3_000] {
            store
                .create_notification(&notification_for(&ada, &ws, at))
                .expect("create");
        }
        assert_eq!(
            store
                .mark_all_notifications_read(&ada.id, now_ms())
                .expect("bulk"),
            3
        );
        assert_eq!(
            store
                .mark_all_notifications_read(&ada.id, now_ms())
                .expect("bulk again"),
            0
        );
        let counts = store.notification_counts(&ada.id).expect("counts");
        assert_eq!(counts.unread, 0);
    }

    #[test]
    fn unknown_notification_is_not_found() {
        let mut store = testutil::store();
        let ada = testutil::user(&mut store, "ada@example.com", "ada");
        assert!(matches!(
            store.mark_notification_read(&NotificationId::mint(), &ada.id, now_ms()),
            Err(StoreError::NotFound(_))
        ));
    }
}
