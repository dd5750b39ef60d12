// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use corkboard_api::{params, PageParams};
use corkboard_core::{now_ms, NotificationId};
use corkboard_store::Page;

use crate::auth::authenticate;
use crate::http::HttpResult;
use crate::state::AppState;

pub(crate) async fn list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    let page = PageParams::parse(&query, 20)?;
    let unread_only = params::bool_flag(&query, "unread_only");

    let notifications = {
        let store = state.store.lock().await;
        store.notifications_for_user(&user.id, unread_only, Page::new(page.page, page.limit))?
    };
    Ok(Json(json!({ "notifications": notifications })).into_response())
}

pub(crate) async fn read_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(notification_id): Path<NotificationId>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;

    let notification = {
        let mut store = state.store.lock().await;
        store.mark_notification_read(&notification_id, &user.id, now_ms())?
    };
    Ok(Json(json!({
        "message": "Notification marked as read",
        "notification": notification,
    }))
    .into_response())
}

pub(crate) async fn read_all_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;

    let updated = {
        let mut store = state.store.lock().await;
        store.mark_all_notifications_read(&user.id, now_ms())?
    };
    Ok(Json(json!({
        "message": "All notifications marked as read",
        "updated": updated,
    }))
    .into_response())
}

pub(crate) async fn counts_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;

    let counts = {
        let store = state.store.lock().await;
        store.notification_counts(&user.id)?
    };
    Ok(Json(json!({
        "total": counts.total,
        "unread": counts.unread,
    }))
    .into_response())
}
