// SPDX-License-Identifier: Apache-2.0

//! Server-emitted realtime event catalog.
//!
//! Wire shape is `{"event": "<name>", "data": {...}}`. Payloads carry the
//! fully denormalized entity plus the author/context fields a client needs
//! to render without a follow-up fetch. Delivery guarantee is per-room emit
//! order only; there is no replay — reconnecting clients refetch state.

use serde::{Deserialize, Serialize};

use corkboard_core::{ProjectId, TaskId, UserId};

use crate::entities::{Activity, Attachment, Comment, Notification, Task, TaskStatus, User};

/// Old/new field pairs attached to task update events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TaskChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<(TaskStatus, TaskStatus)>,
}

/// Identity snippet attached to presence and typing events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUser {
    pub id: UserId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl From<&User> for PresenceUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    TaskCreated {
        task: Task,
        created_by: PresenceUser,
        project_name: String,
    },
    TaskUpdated {
        task: Task,
        updated_by: PresenceUser,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        changes: Option<TaskChanges>,
    },
    /// Position/status move, either the authoritative write or a best-effort
    /// peer relay ahead of it.
    TaskMoved {
        task_id: TaskId,
        project_id: ProjectId,
        status: TaskStatus,
        position: f64,
        moved_by: PresenceUser,
    },
    TaskDeleted {
        task_id: TaskId,
        project_id: ProjectId,
        deleted_by: PresenceUser,
    },
    CommentCreated {
        comment: Comment,
        author: PresenceUser,
        mentions: Vec<PresenceUser>,
        task_title: String,
    },
    AttachmentUploaded {
        attachment: Attachment,
        uploaded_by: PresenceUser,
    },
    AttachmentDeleted {
        attachment_id: corkboard_core::AttachmentId,
        task_id: TaskId,
        deleted_by: PresenceUser,
    },
    NewActivity {
        activity: Activity,
        user: PresenceUser,
    },
    NewNotification {
        notification: Notification,
    },
    UserTyping {
        user: PresenceUser,
        task_id: TaskId,
    },
    UserStoppedTyping {
        user: PresenceUser,
        task_id: TaskId,
    },
    UserOnline {
        user: PresenceUser,
        timestamp: i64,
    },
    UserOffline {
        user: PresenceUser,
        timestamp: i64,
    },
}

impl ServerEvent {
    /// Event name as it appears on the wire.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TaskCreated { .. } => "task_created",
            Self::TaskUpdated { .. } => "task_updated",
            Self::TaskMoved { .. } => "task_moved",
            Self::TaskDeleted { .. } => "task_deleted",
            Self::CommentCreated { .. } => "comment_created",
            Self::AttachmentUploaded { .. } => "attachment_uploaded",
            Self::AttachmentDeleted { .. } => "attachment_deleted",
            Self::NewActivity { .. } => "new_activity",
            Self::NewNotification { .. } => "new_notification",
            Self::UserTyping { .. } => "user_typing",
            Self::UserStoppedTyping { .. } => "user_stopped_typing",
            Self::UserOnline { .. } => "user_online",
            Self::UserOffline { .. } => "user_offline",
        }
    }
}
