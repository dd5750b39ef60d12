// SPDX-License-Identifier: Apache-2.0

//! Membership and invitation lifecycle.
//!
//! Invites are admin-gated; removal goes through the kick contract (admin
//! rank, never on yourself); accepting converts the invitation into a
//! membership with the proposed role and deletes it atomically.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use corkboard_api::dto::{CreateInvitationBody, InvitationView, MemberView};
use corkboard_api::ApiError;
use corkboard_core::{authorize_kick, now_ms, InvitationId, Role, UserId, WorkspaceId};
use corkboard_model::{NotificationKind, WorkspaceInvitation};

use crate::auth::authenticate;
use crate::http::{require_role, HttpError, HttpResult};
use crate::services::{log_activity, notify};
use crate::state::AppState;

pub(crate) async fn list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(workspace_id): Path<WorkspaceId>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    require_role(&state, &workspace_id, &user.id, Role::Member).await?;

    let members = {
        let store = state.store.lock().await;
        store.workspace_members(&workspace_id)?
    };
    let members: Vec<MemberView> = members
        .into_iter()
        .map(|m| MemberView {
            user: m.user,
            role: m.role,
            joined_at: m.joined_at,
        })
        .collect();
    Ok(Json(json!({ "members": members })).into_response())
}

pub(crate) async fn remove_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((workspace_id, target_id)): Path<(WorkspaceId, UserId)>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    let membership = {
        let store = state.store.lock().await;
        store.membership_role(&workspace_id, &user.id)?
    };
    authorize_kick(&user.id, membership, &target_id).map_err(HttpError::from)?;

    {
        let mut store = state.store.lock().await;
        store.remove_member(&workspace_id, &target_id)?;
    }
    log_activity(
        &state,
        &user,
        &workspace_id,
        None,
        None,
        "member_removed",
        json!({ "removed_user_id": target_id }),
    )
    .await;

    Ok(Json(json!({ "message": "Member removed successfully" })).into_response())
}

pub(crate) async fn invite_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(workspace_id): Path<WorkspaceId>,
    Json(body): Json<CreateInvitationBody>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    require_role(&state, &workspace_id, &user.id, Role::Admin).await?;
    body.validate()?;

    let invitation = WorkspaceInvitation {
        id: InvitationId::mint(),
        workspace_id: workspace_id.clone(),
        email: body.email.clone(),
        role: body.proposed_role(),
        invited_by: user.id.clone(),
        created_at: now_ms(),
    };
    let (invitee, workspace_name) = {
        let mut store = state.store.lock().await;
        store.create_invitation(&invitation)?;
        let invitee = store.user_by_email(&invitation.email)?;
        let workspace_name = store
            .workspace_by_id(&workspace_id)?
            .map(|w| w.name)
            .unwrap_or_default();
        (invitee, workspace_name)
    };

    // The invitee may not have an account yet; notification is only for
    // known users, the invitation row itself is keyed by email.
    if let Some(invitee) = invitee {
        notify(
            &state,
            &invitee.id,
            &workspace_id,
            None,
            NotificationKind::WorkspaceInvitation,
            "Workspace invitation",
            &format!(
                "You have been invited to join workspace \"{workspace_name}\" as a {}",
                invitation.role
            ),
            json!({ "invitation_id": invitation.id, "role": invitation.role }),
        )
        .await;
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Invitation sent successfully",
            "invitation": invitation,
        })),
    )
        .into_response())
}

pub(crate) async fn list_invitations_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(workspace_id): Path<WorkspaceId>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;
    require_role(&state, &workspace_id, &user.id, Role::Admin).await?;

    let invitations = {
        let store = state.store.lock().await;
        let invitations = store.invitations_for_workspace(&workspace_id)?;
        invitations
            .into_iter()
            .map(|invitation| {
                let invited_by_user = store.user_by_id(&invitation.invited_by)?;
                Ok(InvitationView {
                    invitation,
                    invited_by_user,
                })
            })
            .collect::<Result<Vec<_>, corkboard_store::StoreError>>()?
    };
    Ok(Json(json!({ "invitations": invitations })).into_response())
}

/// Invitations pending against the caller's own email.
pub(crate) async fn my_invitations_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;

    let invitations = {
        let store = state.store.lock().await;
        let invitations = store.invitations_for_email(&user.email)?;
        invitations
            .into_iter()
            .map(|invitation| {
                let invited_by_user = store.user_by_id(&invitation.invited_by)?;
                Ok(InvitationView {
                    invitation,
                    invited_by_user,
                })
            })
            .collect::<Result<Vec<_>, corkboard_store::StoreError>>()?
    };
    Ok(Json(json!({ "invitations": invitations })).into_response())
}

pub(crate) async fn accept_invitation_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(invitation_id): Path<InvitationId>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;

    let invitation = {
        let mut store = state.store.lock().await;
        store.accept_invitation(&invitation_id, &user, now_ms())?
    };
    log_activity(
        &state,
        &user,
        &invitation.workspace_id,
        None,
        None,
        "member_joined",
        json!({ "role": invitation.role }),
    )
    .await;

    Ok(Json(json!({
        "message": "Invitation accepted",
        "workspace_id": invitation.workspace_id,
        "role": invitation.role,
    }))
    .into_response())
}

pub(crate) async fn reject_invitation_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(invitation_id): Path<InvitationId>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;

    let mut store = state.store.lock().await;
    let invitation = store
        .invitation_by_id(&invitation_id)?
        .ok_or_else(|| ApiError::not_found("Invitation"))?;
    // Only the addressee can reject.
    if !invitation.email.eq_ignore_ascii_case(&user.email) {
        return Err(ApiError::not_found("Invitation").into());
    }
    store.delete_invitation(&invitation_id)?;
    Ok(Json(json!({ "message": "Invitation rejected" })).into_response())
}

pub(crate) async fn revoke_invitation_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(invitation_id): Path<InvitationId>,
) -> HttpResult {
    let user = authenticate(&state, &headers).await?;

    let invitation = {
        let store = state.store.lock().await;
        store
            .invitation_by_id(&invitation_id)?
            .ok_or_else(|| ApiError::not_found("Invitation"))?
    };
    require_role(&state, &invitation.workspace_id, &user.id, Role::Admin).await?;

    {
        let mut store = state.store.lock().await;
        store.delete_invitation(&invitation_id)?;
    }
    Ok(Json(json!({ "message": "Invitation revoked" })).into_response())
}
