// SPDX-License-Identifier: Apache-2.0

//! Activity log and notification fan-out.
//!
//! Both are best-effort side effects of a primary mutation that has already
//! committed: a failure here is logged and swallowed, never rolled back
//! into or surfaced from the request that triggered it.

use serde_json::Value;

use corkboard_core::{
    extract_mention_candidates, now_ms, ActivityId, NotificationId, ProjectId, TaskId, UserId,
    WorkspaceId,
};
use corkboard_model::{
    Activity, Comment, Notification, NotificationKind, PresenceUser, ServerEvent, Task, User,
};
use tracing::warn;

use crate::realtime::RoomId;
use crate::state::AppState;

/// Record an audit entry and announce it in the workspace room.
pub async fn log_activity(
    state: &AppState,
    actor: &User,
    workspace_id: &WorkspaceId,
    project_id: Option<ProjectId>,
    task_id: Option<TaskId>,
    action: &str,
    details: Value,
) {
    let activity = Activity {
        id: ActivityId::mint(),
        workspace_id: workspace_id.clone(),
        project_id,
        task_id,
        user_id: actor.id.clone(),
        action: action.to_string(),
        details,
        created_at: now_ms(),
    };
    {
        let mut store = state.store.lock().await;
        if let Err(err) = store.insert_activity(&activity) {
            warn!(action, error = %err, "activity write failed");
            return;
        }
    }
    state
        .broadcaster
        .publish(
            &RoomId::Workspace(workspace_id.clone()),
            &ServerEvent::NewActivity {
                activity,
                user: PresenceUser::from(actor),
            },
        )
        .await;
}

/// Persist a notification and push it to the recipient's room.
pub async fn notify(
    state: &AppState,
    recipient: &UserId,
    workspace_id: &WorkspaceId,
    task_id: Option<TaskId>,
    kind: NotificationKind,
    title: &str,
    body: &str,
    payload: Value,
) {
    let notification = Notification {
        id: NotificationId::mint(),
        user_id: recipient.clone(),
        workspace_id: workspace_id.clone(),
        task_id,
        kind,
        title: title.to_string(),
        body: body.to_string(),
        payload,
        is_read: false,
        read_at: None,
        created_at: now_ms(),
    };
    {
        let mut store = state.store.lock().await;
        if let Err(err) = store.create_notification(&notification) {
            warn!(kind = kind.as_str(), error = %err, "notification write failed");
            return;
        }
    }
    state
        .broadcaster
        .publish(
            &RoomId::User(recipient.clone()),
            &ServerEvent::NewNotification { notification },
        )
        .await;
}

/// Resolve `@name` candidates in a fresh comment against real workspace
/// membership; persist a mention row and notify each resolved member. The
/// membership check is the authorization boundary here and is never
/// skipped.
pub async fn record_mentions(
    state: &AppState,
    comment: &Comment,
    workspace_id: &WorkspaceId,
    task: &Task,
    project_name: &str,
    author: &User,
) -> Vec<User> {
    let mut mentioned = Vec::new();
    for candidate in extract_mention_candidates(&comment.content) {
        let resolved = {
            let store = state.store.lock().await;
            match store.user_by_display_name(&candidate) {
                Ok(user) => user,
                Err(err) => {
                    warn!(candidate = %candidate, error = %err, "mention lookup failed");
                    continue;
                }
            }
        };
        let Some(user) = resolved else {
            continue;
        };
        let is_member = {
            let store = state.store.lock().await;
            matches!(store.membership_role(workspace_id, &user.id), Ok(Some(_)))
        };
        if !is_member {
            continue;
        }
        {
            let mut store = state.store.lock().await;
            if let Err(err) = store.insert_mention(&comment.id, &user.id) {
                warn!(candidate = %candidate, error = %err, "mention write failed");
                continue;
            }
        }
        notify(
            state,
            &user.id,
            workspace_id,
            Some(task.id.clone()),
            NotificationKind::Mentioned,
            "You were mentioned in a comment",
            &format!(
                "{} mentioned you in task \"{}\"",
                author.display_name, task.title
            ),
            serde_json::json!({
                "task_id": task.id,
                "comment_id": comment.id,
                "project_name": project_name,
            }),
        )
        .await;
        mentioned.push(user);
    }
    mentioned
}
