// SPDX-License-Identifier: Apache-2.0

//! Attachment metadata plus local blob storage.
//!
//! The blob itself is plumbing: bytes land under the configured upload
//! directory keyed by attachment id, and the row records the locator. The
//! size gate runs before anything is written.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::warn;

use corkboard_api::ApiError;
use corkboard_core::{now_ms, AttachmentId, Role, TaskId};
use corkboard_model::{Attachment, PresenceUser, ServerEvent};

use crate::auth::authenticate;
use crate::http::{require_role, HttpResult};
use crate::realtime::RoomId;
use crate::services::log_activity;
use crate::state::AppState;

fn sanitize_filename(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

pub(crate) async fn upload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<TaskId>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    let workspace_id = {
        let store = state.store.lock().await;
        store.task_workspace(&task_id)?.1
    };
    require_role(&state, &workspace_id, &user.id, Role::Member).await?;

    if body.is_empty() {
        return Err(ApiError::validation("Empty upload").into());
    }
    if body.len() as u64 > state.config.upload_max_bytes {
        return Err(ApiError::payload_too_large(state.config.upload_max_bytes).into());
    }

    let filename = sanitize_filename(
        query
            .get("filename")
            .map(String::as_str)
            .unwrap_or("file"),
    );
    let mime_type = query
        .get("mime_type")
        .cloned()
        .or_else(|| {
            headers
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        })
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let attachment_id = AttachmentId::mint();
    let storage_key = format!("{attachment_id}_{filename}");
    let path = state.config.upload_dir.join(&storage_key);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| state.internal_error("upload dir create failed", &e))?;
    }
    tokio::fs::write(&path, &body)
        .await
        .map_err(|e| state.internal_error("upload write failed", &e))?;

    let attachment = Attachment {
        id: attachment_id,
        task_id: task_id.clone(),
        filename,
        storage_key,
        size_bytes: body.len() as i64,
        mime_type,
        uploaded_by: user.id.clone(),
        created_at: now_ms(),
    };
    {
        let mut store = state.store.lock().await;
        store.create_attachment(&attachment)?;
    }
    log_activity(
        &state,
        &user,
        &workspace_id,
        None,
        Some(task_id.clone()),
        "attachment_uploaded",
        json!({ "filename": attachment.filename, "size_bytes": attachment.size_bytes }),
    )
    .await;
    state
        .broadcaster
        .publish(
            &RoomId::Task(task_id),
            &ServerEvent::AttachmentUploaded {
                attachment: attachment.clone(),
                uploaded_by: PresenceUser::from(&user),
            },
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "File uploaded successfully",
            "attachment": attachment,
        })),
    )
        .into_response())
}

pub(crate) async fn delete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(attachment_id): Path<AttachmentId>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;

    let (attachment, workspace_id) = {
        let store = state.store.lock().await;
        let attachment = store
            .attachment_by_id(&attachment_id)?
            .ok_or_else(|| ApiError::not_found("Attachment"))?;
        let (_, workspace_id) = store.task_workspace(&attachment.task_id)?;
        (attachment, workspace_id)
    };
    let role = require_role(&state, &workspace_id, &user.id, Role::Member).await?;
    // Uploader may remove their own file; anyone else needs admin rank.
    if attachment.uploaded_by != user.id && role < Role::Admin {
        return Err(ApiError::unauthorized("Insufficient permissions").into());
    }

    {
        let mut store = state.store.lock().await;
        store.delete_attachment(&attachment_id)?;
    }
    let path = state.config.upload_dir.join(&attachment.storage_key);
    if let Err(err) = tokio::fs::remove_file(&path).await {
        warn!(storage_key = %attachment.storage_key, error = %err, "blob removal failed");
    }
    state
        .broadcaster
        .publish(
            &RoomId::Task(attachment.task_id.clone()),
            &ServerEvent::AttachmentDeleted {
                attachment_id,
                task_id: attachment.task_id.clone(),
                deleted_by: PresenceUser::from(&user),
            },
        )
        .await;

    Ok(Json(json!({ "message": "Attachment deleted successfully" })).into_response())
}
