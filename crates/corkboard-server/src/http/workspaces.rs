// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use corkboard_api::dto::{MemberView, WorkspaceBody, WorkspaceDetail, WorkspaceSummary};
use corkboard_api::{ApiError, PageParams};
use corkboard_core::{now_ms, Role, WorkspaceId};
use corkboard_model::Workspace;
use corkboard_store::Page;

use crate::auth::authenticate;
use crate::http::{require_role, HttpResult};
use crate::services::log_activity;
use crate::state::AppState;

pub(crate) async fn list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    let params = PageParams::parse(&query, 20)?;

    let records = {
        let store = state.store.lock().await;
        store.workspaces_for_user(&user.id, Page::new(params.page, params.limit))?
    };
    let workspaces: Vec<WorkspaceSummary> = records
        .into_iter()
        .map(|r| WorkspaceSummary {
            workspace: r.workspace,
            user_role: r.role,
            joined_at: r.joined_at,
        })
        .collect();
    Ok(Json(json!({ "workspaces": workspaces })).into_response())
}

pub(crate) async fn create_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<WorkspaceBody>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    body.validate()?;

    let now = now_ms();
    let workspace = Workspace {
        id: WorkspaceId::mint(),
        name: body.name.trim().to_string(),
        description: body.description.as_deref().map(str::trim).map(String::from),
        created_by: user.id.clone(),
        created_at: now,
        updated_at: now,
    };
    {
        let mut store = state.store.lock().await;
        store.create_workspace(&workspace)?;
    }
    log_activity(
        &state,
        &user,
        &workspace.id,
        None,
        None,
        "workspace_created",
        json!({ "workspace_name": workspace.name }),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Workspace created successfully",
            "workspace": workspace,
        })),
    )
        .into_response())
}

pub(crate) async fn get_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(workspace_id): Path<WorkspaceId>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    let role = require_role(&state, &workspace_id, &user.id, Role::Member).await?;

    let (workspace, members, projects) = {
        let store = state.store.lock().await;
        let workspace = store
            .workspace_by_id(&workspace_id)?
            .ok_or_else(|| ApiError::not_found("Workspace"))?;
        let members = store.workspace_members(&workspace_id)?;
        let projects = store.projects_for_workspace(&workspace_id, Page::new(1, 100))?;
        (workspace, members, projects)
    };

    let detail = WorkspaceDetail {
        workspace,
        members: members
            .into_iter()
            .map(|m| MemberView {
                user: m.user,
                role: m.role,
                joined_at: m.joined_at,
            })
            .collect(),
        projects: projects.into_iter().map(|p| p.project).collect(),
        user_role: role,
    };
    Ok(Json(json!({ "workspace": detail })).into_response())
}

pub(crate) async fn update_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(workspace_id): Path<WorkspaceId>,
    Json(body): Json<WorkspaceBody>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    require_role(&state, &workspace_id, &user.id, Role::Admin).await?;
    body.validate()?;

    let workspace = {
        let mut store = state.store.lock().await;
        store.update_workspace(
            &workspace_id,
            body.name.trim(),
            body.description.as_deref().map(str::trim),
            now_ms(),
        )?
    };
    log_activity(
        &state,
        &user,
        &workspace_id,
        None,
        None,
        "workspace_updated",
        json!({ "workspace_name": workspace.name }),
    )
    .await;

    Ok(Json(json!({
        "message": "Workspace updated successfully",
        "workspace": workspace,
    }))
    .into_response())
}
