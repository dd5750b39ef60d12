// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod entities;
pub mod events;

pub const CRATE_NAME: &str = "corkboard-model";

pub use entities::{
    Activity, Attachment, Comment, CommentMention, Notification, NotificationKind, Project, Task,
    TaskAssignment, TaskPriority, TaskStatus, User, Workspace, WorkspaceInvitation,
    WorkspaceMember,
};
pub use events::{PresenceUser, ServerEvent, TaskChanges};
