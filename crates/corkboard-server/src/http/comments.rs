// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use corkboard_api::dto::{CommentView, CreateCommentBody};
use corkboard_api::{ApiError, PageParams};
use corkboard_core::{now_ms, CommentId, Role, TaskId};
use corkboard_model::{Comment, PresenceUser, ServerEvent};
use corkboard_store::Page;

use crate::auth::authenticate;
use crate::http::{require_role, HttpResult};
use crate::realtime::RoomId;
use crate::services::{log_activity, record_mentions};
use crate::state::AppState;

pub(crate) async fn list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<TaskId>,
    Query(query): Query<HashMap<String, String>>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    let workspace_id = {
        let store = state.store.lock().await;
        store.task_workspace(&task_id)?.1
    };
    require_role(&state, &workspace_id, &user.id, Role::Guest).await?;

    let page = PageParams::parse(&query, 20)?;
    let records = {
        let store = state.store.lock().await;
        store.comments_for_task(&task_id, Page::new(page.page, page.limit))?
    };
    let comments: Vec<CommentView> = records
        .into_iter()
        .map(|r| CommentView {
            comment: r.comment,
            author: r.author,
            mentions: r.mentions,
        })
        .collect();
    Ok(Json(json!({ "comments": comments })).into_response())
}

pub(crate) async fn create_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateCommentBody>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    body.validate()?;

    let (task, workspace_id, project_name) = {
        let store = state.store.lock().await;
        let task = store
            .task_by_id(&body.task_id)?
            .ok_or_else(|| ApiError::not_found("Task"))?;
        let (project_id, workspace_id) = store.task_workspace(&body.task_id)?;
        let project_name = store
            .project_by_id(&project_id)?
            .map(|p| p.name)
            .unwrap_or_default();
        (task, workspace_id, project_name)
    };
    require_role(&state, &workspace_id, &user.id, Role::Guest).await?;

    let comment = Comment {
        id: CommentId::mint(),
        task_id: body.task_id.clone(),
        author_id: user.id.clone(),
        content: body.content.trim().to_string(),
        created_at: now_ms(),
    };
    {
        let mut store = state.store.lock().await;
        store.create_comment(&comment)?;
    }

    // Mention fan-out rides behind the committed comment: candidates are
    // validated against real membership, then persisted and notified.
    let mentioned =
        record_mentions(&state, &comment, &workspace_id, &task, &project_name, &user).await;

    log_activity(
        &state,
        &user,
        &workspace_id,
        Some(task.project_id.clone()),
        Some(task.id.clone()),
        "comment_created",
        json!({ "task_title": task.title, "mention_count": mentioned.len() }),
    )
    .await;
    state
        .broadcaster
        .publish(
            &RoomId::Task(task.id.clone()),
            &ServerEvent::CommentCreated {
                comment: comment.clone(),
                author: PresenceUser::from(&user),
                mentions: mentioned.iter().map(PresenceUser::from).collect(),
                task_title: task.title.clone(),
            },
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Comment created successfully",
            "comment": CommentView {
                comment,
                author: user,
                mentions: mentioned,
            },
        })),
    )
        .into_response())
}
