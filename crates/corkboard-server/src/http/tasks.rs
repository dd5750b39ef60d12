// SPDX-License-Identifier: Apache-2.0

//! Task CRUD and the board-move write path.
//!
//! A drag lands here as `PATCH /tasks/:id/position` carrying the final
//! (status, position) pair; the store writes both in one row update and the
//! result fans out to the project room. Assignment notifications and the
//! activity log ride behind the committed write, best-effort.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use corkboard_api::dto::{
    CreateTaskBody, TaskView, UpdateTaskBody, UpdateTaskPositionBody, UpdateTaskStatusBody,
};
use corkboard_api::{params, ApiError, PageParams};
use corkboard_core::{next_position, now_ms, Role, TaskId, WorkspaceId};
use corkboard_model::{
    NotificationKind, PresenceUser, ServerEvent, Task, TaskChanges, TaskPriority, TaskStatus, User,
};
use corkboard_store::{Page, TaskFilter, TaskRecord};

use crate::auth::authenticate;
use crate::http::{require_role, HttpResult};
use crate::realtime::RoomId;
use crate::services::{log_activity, notify};
use crate::state::AppState;

fn task_view(record: TaskRecord) -> TaskView {
    TaskView {
        task: record.task,
        created_by: record.created_by,
        assignees: record.assignees,
        comment_count: record.comment_count,
        attachment_count: record.attachment_count,
    }
}

/// task → project → workspace, with the membership check at the top.
async fn authorize_task(
    state: &AppState,
    user: &User,
    task_id: &TaskId,
    required: Role,
) -> Result<(Task, WorkspaceId), crate::http::HttpError> {
    let (task, workspace_id) = {
        let store = state.store.lock().await;
        let task = store
            .task_by_id(task_id)?
            .ok_or_else(|| ApiError::not_found("Task"))?;
        let (_, workspace_id) = store.task_workspace(task_id)?;
        (task, workspace_id)
    };
    require_role(state, &workspace_id, &user.id, required).await?;
    Ok((task, workspace_id))
}

pub(crate) async fn list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<corkboard_core::ProjectId>,
    Query(query): Query<HashMap<String, String>>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    let workspace_id = {
        let store = state.store.lock().await;
        store.project_workspace(&project_id)?
    };
    require_role(&state, &workspace_id, &user.id, Role::Guest).await?;

    let page = PageParams::parse(&query, 50)?;
    let filter = TaskFilter {
        status: params::parse_status_filter(&query)?,
        priority: params::parse_priority_filter(&query)?,
    };
    let records = {
        let store = state.store.lock().await;
        store.tasks_for_project(&project_id, filter, Page::new(page.page, page.limit))?
    };
    let tasks: Vec<TaskView> = records.into_iter().map(task_view).collect();
    Ok(Json(json!({ "tasks": tasks })).into_response())
}

pub(crate) async fn get_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<TaskId>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    authorize_task(&state, &user, &task_id, Role::Guest).await?;

    let record = {
        let store = state.store.lock().await;
        store
            .task_record(&task_id)?
            .ok_or_else(|| ApiError::not_found("Task"))?
    };
    Ok(Json(json!({ "task": task_view(record) })).into_response())
}

pub(crate) async fn create_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateTaskBody>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    body.validate()?;

    let (workspace_id, project_name) = {
        let store = state.store.lock().await;
        let project = store
            .project_by_id(&body.project_id)?
            .ok_or_else(|| ApiError::not_found("Project"))?;
        (project.workspace_id, project.name)
    };
    require_role(&state, &workspace_id, &user.id, Role::Member).await?;

    let now = now_ms();
    let task = Task {
        id: TaskId::mint(),
        project_id: body.project_id.clone(),
        title: body.title.trim().to_string(),
        description: body.description.as_deref().map(str::trim).map(String::from),
        priority: body.priority.unwrap_or(TaskPriority::Medium),
        status: body.status.unwrap_or(TaskStatus::Todo),
        due_date: body.due_date,
        created_by: user.id.clone(),
        position: next_position(now),
        created_at: now,
        updated_at: now,
    };
    {
        let mut store = state.store.lock().await;
        store.create_task(&task, &body.assignee_ids)?;
    }

    for assignee in &body.assignee_ids {
        notify(
            &state,
            assignee,
            &workspace_id,
            Some(task.id.clone()),
            NotificationKind::TaskAssigned,
            "Task assigned to you",
            &format!("You have been assigned to task \"{}\"", task.title),
            json!({ "task_id": task.id, "project_name": project_name }),
        )
        .await;
    }
    log_activity(
        &state,
        &user,
        &workspace_id,
        Some(body.project_id.clone()),
        Some(task.id.clone()),
        "task_created",
        json!({ "task_title": task.title, "assignee_count": body.assignee_ids.len() }),
    )
    .await;
    state
        .broadcaster
        .publish(
            &RoomId::Project(body.project_id.clone()),
            &ServerEvent::TaskCreated {
                task: task.clone(),
                created_by: PresenceUser::from(&user),
                project_name,
            },
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Task created successfully",
            "task": task,
        })),
    )
        .into_response())
}

pub(crate) async fn update_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<TaskId>,
    Json(body): Json<UpdateTaskBody>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    body.validate()?;
    let (before, workspace_id) = authorize_task(&state, &user, &task_id, Role::Member).await?;

    let updated = {
        let mut store = state.store.lock().await;
        store.update_task(
            &task_id,
            body.title.trim(),
            body.description.as_deref().map(str::trim),
            body.priority,
            body.due_date,
            now_ms(),
        )?
    };
    log_activity(
        &state,
        &user,
        &workspace_id,
        Some(before.project_id.clone()),
        Some(task_id),
        "task_updated",
        json!({ "task_title": updated.title }),
    )
    .await;
    state
        .broadcaster
        .publish(
            &RoomId::Project(updated.project_id.clone()),
            &ServerEvent::TaskUpdated {
                task: updated.clone(),
                updated_by: PresenceUser::from(&user),
                changes: None,
            },
        )
        .await;

    Ok(Json(json!({
        "message": "Task updated successfully",
        "task": updated,
    }))
    .into_response())
}

pub(crate) async fn update_status_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<TaskId>,
    Json(body): Json<UpdateTaskStatusBody>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    let (before, workspace_id) = authorize_task(&state, &user, &task_id, Role::Guest).await?;

    let updated = {
        let mut store = state.store.lock().await;
        store.update_task_status(&task_id, body.status, now_ms())?
    };
    log_activity(
        &state,
        &user,
        &workspace_id,
        Some(updated.project_id.clone()),
        Some(task_id),
        "task_status_updated",
        json!({
            "task_title": updated.title,
            "old_status": before.status,
            "new_status": updated.status,
        }),
    )
    .await;
    state
        .broadcaster
        .publish(
            &RoomId::Project(updated.project_id.clone()),
            &ServerEvent::TaskUpdated {
                task: updated.clone(),
                updated_by: PresenceUser::from(&user),
                changes: Some(TaskChanges {
                    status: Some((before.status, updated.status)),
                }),
            },
        )
        .await;

    Ok(Json(json!({
        "message": "Task status updated successfully",
        "task": updated,
    }))
    .into_response())
}

pub(crate) async fn update_position_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<TaskId>,
    Json(body): Json<UpdateTaskPositionBody>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    let (_, _workspace_id) = authorize_task(&state, &user, &task_id, Role::Guest).await?;

    if !body.position.is_finite() {
        return Err(ApiError::validation("Invalid position").into());
    }
    let updated = {
        let mut store = state.store.lock().await;
        store.update_task_position(&task_id, body.status, body.position, now_ms())?
    };
    state
        .broadcaster
        .publish(
            &RoomId::Project(updated.project_id.clone()),
            &ServerEvent::TaskMoved {
                task_id: updated.id.clone(),
                project_id: updated.project_id.clone(),
                status: updated.status,
                position: updated.position,
                moved_by: PresenceUser::from(&user),
            },
        )
        .await;

    Ok(Json(json!({
        "message": "Task position updated successfully",
        "task": updated,
    }))
    .into_response())
}

pub(crate) async fn delete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<TaskId>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    let (task, workspace_id) = authorize_task(&state, &user, &task_id, Role::Member).await?;

    {
        let mut store = state.store.lock().await;
        store.delete_task(&task_id)?;
    }
    log_activity(
        &state,
        &user,
        &workspace_id,
        Some(task.project_id.clone()),
        None,
        "task_deleted",
        json!({ "task_title": task.title }),
    )
    .await;
    state
        .broadcaster
        .publish(
            &RoomId::Project(task.project_id.clone()),
            &ServerEvent::TaskDeleted {
                task_id,
                project_id: task.project_id.clone(),
                deleted_by: PresenceUser::from(&user),
            },
        )
        .await;

    Ok(Json(json!({ "message": "Task deleted successfully" })).into_response())
}
