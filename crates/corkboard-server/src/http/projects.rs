// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use corkboard_api::dto::{CreateProjectBody, ProjectView, TaskStatsView};
use corkboard_api::{ApiError, PageParams};
use corkboard_core::{next_position, now_ms, ProjectId, Role};
use corkboard_model::Project;
use corkboard_store::{Page, ProjectRecord};

use crate::auth::authenticate;
use crate::http::{require_role, HttpResult};
use crate::services::log_activity;
use crate::state::AppState;

fn project_view(record: ProjectRecord) -> ProjectView {
    ProjectView {
        project: record.project,
        created_by: record.created_by,
        task_stats: TaskStatsView {
            total: record.stats.total,
            todo: record.stats.todo,
            in_progress: record.stats.in_progress,
            review: record.stats.review,
            done: record.stats.done,
        },
    }
}

pub(crate) async fn create_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateProjectBody>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    require_role(&state, &body.workspace_id, &user.id, Role::Member).await?;
    body.validate()?;

    let now = now_ms();
    let project = Project {
        id: ProjectId::mint(),
        workspace_id: body.workspace_id.clone(),
        name: body.name.trim().to_string(),
        description: body.description.as_deref().map(str::trim).map(String::from),
        created_by: user.id.clone(),
        position: next_position(now),
        created_at: now,
        updated_at: now,
    };
    {
        let mut store = state.store.lock().await;
        store.create_project(&project)?;
    }
    log_activity(
        &state,
        &user,
        &body.workspace_id,
        Some(project.id.clone()),
        None,
        "project_created",
        json!({ "project_name": project.name }),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Project created successfully",
            "project": project,
        })),
    )
        .into_response())
}

pub(crate) async fn list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(workspace_id): Path<corkboard_core::WorkspaceId>,
    Query(query): Query<HashMap<String, String>>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    require_role(&state, &workspace_id, &user.id, Role::Member).await?;
    let params = PageParams::parse(&query, 20)?;

    let records = {
        let store = state.store.lock().await;
        store.projects_for_workspace(&workspace_id, Page::new(params.page, params.limit))?
    };
    let projects: Vec<ProjectView> = records.into_iter().map(project_view).collect();
    Ok(Json(json!({ "projects": projects })).into_response())
}

pub(crate) async fn get_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<ProjectId>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;

    let project = {
        let store = state.store.lock().await;
        store
            .project_by_id(&project_id)?
            .ok_or_else(|| ApiError::not_found("Project"))?
    };
    // Any membership grants read access to the board shell.
    let role = require_role(&state, &project.workspace_id, &user.id, Role::Guest).await?;

    Ok(Json(json!({
        "project": project,
        "user_role": role,
    }))
    .into_response())
}
