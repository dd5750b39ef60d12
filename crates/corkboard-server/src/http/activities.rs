// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use corkboard_api::PageParams;
use corkboard_core::{Role, WorkspaceId};
use corkboard_store::Page;

use crate::auth::authenticate;
use crate::http::{require_role, HttpResult};
use crate::state::AppState;

pub(crate) async fn list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(workspace_id): Path<WorkspaceId>,
    Query(query): Query<HashMap<String, String>>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    require_role(&state, &workspace_id, &user.id, Role::Member).await?;

    let page = PageParams::parse(&query, 50)?;
    let activities = {
        let store = state.store.lock().await;
        store.activities_for_workspace(
            &workspace_id,
            query.get("action").map(String::as_str),
            Page::new(page.page, page.limit),
        )?
    };
    Ok(Json(json!({ "activities": activities })).into_response())
}
