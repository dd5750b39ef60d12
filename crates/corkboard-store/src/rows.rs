// SPDX-License-Identifier: Apache-2.0

//! Row decoding helpers shared by the resource modules.

use rusqlite::types::Type;
use rusqlite::Row;

use corkboard_core::Role;
use corkboard_model::{
    Activity, Attachment, Comment, Notification, NotificationKind, Project, Task, TaskPriority,
    TaskStatus, User, Workspace,
};

use crate::StoreError;

/// Convert a decode failure into a rusqlite conversion error so it can
/// surface from inside `query_map` closures.
fn decode_err(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(StoreError::Invalid(message)))
}

pub(crate) fn id_at<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| decode_err(idx, e.to_string()))
}

pub(crate) fn opt_id_at<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: Option<String> = row.get(idx)?;
    raw.map(|value| {
        value
            .parse::<T>()
            .map_err(|e| decode_err(idx, e.to_string()))
    })
    .transpose()
}

pub(crate) fn role_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Role> {
    let raw: String = row.get(idx)?;
    Role::parse(&raw).ok_or_else(|| decode_err(idx, format!("unknown role {raw:?}")))
}

pub(crate) fn status_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<TaskStatus> {
    let raw: String = row.get(idx)?;
    TaskStatus::parse(&raw).ok_or_else(|| decode_err(idx, format!("unknown status {raw:?}")))
}

pub(crate) fn priority_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<TaskPriority> {
    let raw: String = row.get(idx)?;
    TaskPriority::parse(&raw).ok_or_else(|| decode_err(idx, format!("unknown priority {raw:?}")))
}

pub(crate) fn kind_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<NotificationKind> {
    let raw: String = row.get(idx)?;
    NotificationKind::parse(&raw)
        .ok_or_else(|| decode_err(idx, format!("unknown notification kind {raw:?}")))
}

pub(crate) fn json_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<serde_json::Value> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| decode_err(idx, e.to_string()))
}

/// Column order: id, email, display_name, avatar_url, created_at.
pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    user_at_offset(row, 0)
}

/// A user whose five columns start at `base` in a joined row.
pub(crate) fn user_at_offset(row: &Row<'_>, base: usize) -> rusqlite::Result<User> {
    Ok(User {
        id: id_at(row, base)?,
        email: row.get(base + 1)?,
        display_name: row.get(base + 2)?,
        avatar_url: row.get(base + 3)?,
        created_at: row.get(base + 4)?,
    })
}

/// Column order: id, name, description, created_by, created_at, updated_at.
pub(crate) fn workspace_from_row(row: &Row<'_>) -> rusqlite::Result<Workspace> {
    Ok(Workspace {
        id: id_at(row, 0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_by: id_at(row, 3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Column order: id, workspace_id, name, description, created_by, position,
/// created_at, updated_at.
pub(crate) fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: id_at(row, 0)?,
        workspace_id: id_at(row, 1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_by: id_at(row, 4)?,
        position: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Column order: id, project_id, title, description, priority, status,
/// due_date, created_by, position, created_at, updated_at.
pub(crate) fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: id_at(row, 0)?,
        project_id: id_at(row, 1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        priority: priority_at(row, 4)?,
        status: status_at(row, 5)?,
        due_date: row.get(6)?,
        created_by: id_at(row, 7)?,
        position: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Column order: id, task_id, author_id, content, created_at.
pub(crate) fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: id_at(row, 0)?,
        task_id: id_at(row, 1)?,
        author_id: id_at(row, 2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Column order: id, task_id, filename, storage_key, size_bytes, mime_type,
/// uploaded_by, created_at.
pub(crate) fn attachment_from_row(row: &Row<'_>) -> rusqlite::Result<Attachment> {
    Ok(Attachment {
        id: id_at(row, 0)?,
        task_id: id_at(row, 1)?,
        filename: row.get(2)?,
        storage_key: row.get(3)?,
        size_bytes: row.get(4)?,
        mime_type: row.get(5)?,
        uploaded_by: id_at(row, 6)?,
        created_at: row.get(7)?,
    })
}

/// Column order: id, user_id, workspace_id, task_id, kind, title, body,
/// payload, is_read, read_at, created_at.
pub(crate) fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: id_at(row, 0)?,
        user_id: id_at(row, 1)?,
        workspace_id: id_at(row, 2)?,
        task_id: opt_id_at(row, 3)?,
        kind: kind_at(row, 4)?,
        title: row.get(5)?,
        body: row.get(6)?,
        payload: json_at(row, 7)?,
        is_read: row.get::<_, i64>(8)? != 0,
        read_at: row.get(9)?,
        created_at: row.get(10)?,
    })
}

/// Column order: id, workspace_id, project_id, task_id, user_id, action,
/// details, created_at.
pub(crate) fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: id_at(row, 0)?,
        workspace_id: id_at(row, 1)?,
        project_id: opt_id_at(row, 2)?,
        task_id: opt_id_at(row, 3)?,
        user_id: id_at(row, 4)?,
        action: row.get(5)?,
        details: json_at(row, 6)?,
        created_at: row.get(7)?,
    })
}
