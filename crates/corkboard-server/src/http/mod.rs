// SPDX-License-Identifier: Apache-2.0

//! HTTP surface.
//!
//! Thin handlers, one module per resource, all following the same shape:
//! authenticate, resolve the owning workspace through the parent chain,
//! authorize against the freshly-read membership, mutate, then best-effort
//! side effects (activity, notifications) and room broadcast. The
//! authorizing read always precedes the mutating write.

mod activities;
mod comments;
mod members;
mod notifications;
mod projects;
mod tasks;
mod uploads;
mod workspaces;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde_json::json;

use corkboard_api::{ApiError, ApiErrorCode};
use corkboard_core::{authorize, Denied, Role, UserId, WorkspaceId};
use corkboard_store::StoreError;

use crate::middleware::{cors_middleware, rate_limit_middleware, request_tracing_middleware};
use crate::realtime::ws_handler;
use crate::state::AppState;

pub(crate) fn api_error_response(err: &ApiError) -> Response {
    let status =
        StatusCode::from_u16(err.code.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(err.body())).into_response()
}

/// Local error wrapper so `?` works in handlers across the store,
/// authority and API error types.
pub(crate) struct HttpError(pub ApiError);

pub(crate) type HttpResult = Result<Response, HttpError>;

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        api_error_response(&self.0)
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<Denied> for HttpError {
    fn from(denied: Denied) -> Self {
        Self(denied.into())
    }
}

impl From<StoreError> for HttpError {
    fn from(err: StoreError) -> Self {
        let api = match &err {
            StoreError::NotFound(entity) => {
                let mut message = entity.to_string();
                if let Some(first) = message.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                ApiError::new(ApiErrorCode::NotFound, format!("{message} not found"))
            }
            StoreError::Conflict(message) => ApiError::conflict(message.clone()),
            StoreError::Invalid(_) | StoreError::Sqlite(_) => {
                tracing::error!(error = %err, "store failure");
                ApiError::internal()
            }
            _ => {
                tracing::error!(error = %err, "store failure");
                ApiError::internal()
            }
        };
        Self(api)
    }
}

/// Resolve the caller's freshly-read role in a workspace and require at
/// least `required`. The locked store is taken and released inside, so
/// callers never hold it across the check.
pub(crate) async fn require_role(
    state: &AppState,
    workspace: &WorkspaceId,
    user: &UserId,
    required: Role,
) -> Result<Role, HttpError> {
    let membership = {
        let store = state.store.lock().await;
        store.membership_role(workspace, user)?
    };
    Ok(authorize(membership, required)?)
}

async fn health_handler(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "OK",
            "timestamp": corkboard_core::now_ms(),
            "uptime_secs": state.started_at.elapsed().as_secs(),
        })),
    )
        .into_response()
}

async fn not_found_handler() -> Response {
    api_error_response(&ApiError::new(ApiErrorCode::NotFound, "Route not found"))
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = (state.config.upload_max_bytes as usize).saturating_add(64 * 1024);
    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .route(
            "/workspaces",
            get(workspaces::list_handler).post(workspaces::create_handler),
        )
        .route(
            "/workspaces/:workspaceId",
            get(workspaces::get_handler).put(workspaces::update_handler),
        )
        .route("/workspaces/:workspaceId/members", get(members::list_handler))
        .route(
            "/workspaces/:workspaceId/members/:userId",
            delete(members::remove_handler),
        )
        .route(
            "/workspaces/:workspaceId/invitations",
            get(members::list_invitations_handler).post(members::invite_handler),
        )
        .route("/invitations", get(members::my_invitations_handler))
        .route(
            "/invitations/:invitationId/accept",
            post(members::accept_invitation_handler),
        )
        .route(
            "/invitations/:invitationId/reject",
            post(members::reject_invitation_handler),
        )
        .route(
            "/invitations/:invitationId",
            delete(members::revoke_invitation_handler),
        )
        .route("/projects", post(projects::create_handler))
        .route(
            "/projects/workspace/:workspaceId",
            get(projects::list_handler),
        )
        .route("/projects/:projectId", get(projects::get_handler))
        .route("/tasks", post(tasks::create_handler))
        .route("/tasks/project/:projectId", get(tasks::list_handler))
        .route(
            "/tasks/:taskId",
            get(tasks::get_handler)
                .put(tasks::update_handler)
                .delete(tasks::delete_handler),
        )
        .route("/tasks/:taskId/status", patch(tasks::update_status_handler))
        .route(
            "/tasks/:taskId/position",
            patch(tasks::update_position_handler),
        )
        .route("/comments", post(comments::create_handler))
        .route("/comments/task/:taskId", get(comments::list_handler))
        .route("/uploads/task/:taskId", post(uploads::upload_handler))
        .route("/uploads/:attachmentId", delete(uploads::delete_handler))
        .route("/notifications", get(notifications::list_handler))
        .route(
            "/notifications/read-all",
            patch(notifications::read_all_handler),
        )
        .route("/notifications/counts", get(notifications::counts_handler))
        .route(
            "/notifications/:notificationId/read",
            patch(notifications::read_handler),
        )
        .route(
            "/activities/workspace/:workspaceId",
            get(activities::list_handler),
        )
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            cors_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            request_tracing_middleware,
        ))
        .with_state(state)
}
