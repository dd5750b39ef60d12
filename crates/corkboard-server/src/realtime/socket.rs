// SPDX-License-Identifier: Apache-2.0

//! WebSocket endpoint: handshake, room membership, inbound frames.
//!
//! The connection lifecycle mirrors the authorization model: the token is
//! verified *before* the upgrade (refusal is an HTTP 401, no socket ever
//! exists), the connection then carries its identity and is auto-joined to
//! its per-user room, and every subsequent room join re-reads membership
//! from the store. A denied join is silent — the client simply never
//! receives that room's events, and learns nothing about whether the
//! resource exists.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use corkboard_api::{ApiError, ClientFrame};
use corkboard_core::{authorize, now_ms, Role, UserId, WorkspaceId};
use corkboard_model::{PresenceUser, ServerEvent, User};

use crate::auth::{authenticate_token, bearer_token};
use crate::http::api_error_response;
use crate::realtime::RoomId;
use crate::state::AppState;

const OUTBOUND_BUFFER: usize = 64;

pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let token = params
        .get("token")
        .cloned()
        .or_else(|| bearer_token(&headers));
    let Some(token) = token else {
        return api_error_response(&ApiError::unauthenticated("Access token required"));
    };
    match authenticate_token(&state, &token).await {
        // Authenticated: attach the identity and enter the connected state.
        Ok(user) => ws.on_upgrade(move |socket| connection_loop(state, user, socket)),
        // Terminal failure; the client may reconnect with a fresh token.
        Err(err) => api_error_response(&err),
    }
}

struct Subscriptions {
    forwarders: HashMap<String, JoinHandle<()>>,
}

impl Subscriptions {
    fn new() -> Self {
        Self {
            forwarders: HashMap::new(),
        }
    }

    fn join(&mut self, state: &AppState, out: &mpsc::Sender<Arc<str>>, room: String) {
        if self.forwarders.contains_key(&room) {
            return;
        }
        let mut rx = state.rooms.subscribe(&room);
        let out = out.clone();
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(frame) => {
                        if out.send(frame).await.is_err() {
                            break;
                        }
                    }
                    // Fell behind the room buffer: frames are gone and stay
                    // gone. The client's refetch-on-load covers it.
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        self.forwarders.insert(room, handle);
    }

    fn leave(&mut self, room: &str) {
        if let Some(handle) = self.forwarders.remove(room) {
            handle.abort();
        }
    }

    fn clear(&mut self) {
        for (_, handle) in self.forwarders.drain() {
            handle.abort();
        }
    }
}

async fn connection_loop(state: AppState, user: User, socket: WebSocket) {
    let presence = PresenceUser::from(&user);
    info!(user_id = %user.id, "socket connected");

    let (mut sink, mut inbound) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<Arc<str>>(OUTBOUND_BUFFER);
    let mut subscriptions = Subscriptions::new();

    // Connected: the per-user room needs no authorization beyond identity,
    // as does the presence scope.
    subscriptions.join(&state, &out_tx, RoomId::User(user.id.clone()).channel());
    subscriptions.join(&state, &out_tx, RoomId::Presence.channel());

    loop {
        tokio::select! {
            outbound = out_rx.recv() => {
                match outbound {
                    Some(frame) => {
                        if sink.send(Message::Text(frame.to_string())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = inbound.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(&state, &user, &presence, &mut subscriptions, &out_tx, &text)
                            .await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!(user_id = %user.id, error = %err, "socket receive error");
                        break;
                    }
                }
            }
        }
    }

    subscriptions.clear();
    state
        .broadcaster
        .publish(
            &RoomId::Presence,
            &ServerEvent::UserOffline {
                user: presence,
                timestamp: now_ms(),
            },
        )
        .await;
    info!(user_id = %user.id, "socket disconnected");
}

/// Membership re-read for a join request; any failure (absent chain link
/// included) denies.
async fn may_join(state: &AppState, workspace: &WorkspaceId, user: &UserId) -> bool {
    let store = state.store.lock().await;
    match store.membership_role(workspace, user) {
        Ok(role) => authorize(role, Role::Guest).is_ok(),
        Err(_) => false,
    }
}

async fn handle_frame(
    state: &AppState,
    user: &User,
    presence: &PresenceUser,
    subscriptions: &mut Subscriptions,
    out: &mpsc::Sender<Arc<str>>,
    text: &str,
) {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(err) => {
            debug!(user_id = %user.id, error = %err, "unparseable client frame");
            return;
        }
    };

    match frame {
        ClientFrame::JoinWorkspace { id } => {
            if may_join(state, &id, &user.id).await {
                subscriptions.join(state, out, RoomId::Workspace(id).channel());
            } else {
                debug!(user_id = %user.id, "workspace join denied");
            }
        }
        ClientFrame::JoinProject { id } => {
            let workspace = {
                let store = state.store.lock().await;
                store.project_workspace(&id).ok()
            };
            match workspace {
                Some(workspace) if may_join(state, &workspace, &user.id).await => {
                    subscriptions.join(state, out, RoomId::Project(id).channel());
                }
                _ => debug!(user_id = %user.id, "project join denied"),
            }
        }
        ClientFrame::JoinTask { id } => {
            let chain = {
                let store = state.store.lock().await;
                store.task_workspace(&id).ok()
            };
            match chain {
                Some((_, workspace)) if may_join(state, &workspace, &user.id).await => {
                    subscriptions.join(state, out, RoomId::Task(id).channel());
                }
                _ => debug!(user_id = %user.id, "task join denied"),
            }
        }
        ClientFrame::LeaveWorkspace { id } => {
            subscriptions.leave(&RoomId::Workspace(id).channel());
        }
        ClientFrame::LeaveProject { id } => {
            subscriptions.leave(&RoomId::Project(id).channel());
        }
        ClientFrame::LeaveTask { id } => {
            subscriptions.leave(&RoomId::Task(id).channel());
        }
        ClientFrame::TaskMoved {
            task_id,
            project_id,
            status,
            position,
        } => {
            // Peer relay for latency hiding; the durable write arrives
            // separately over HTTP. Still membership-gated.
            let workspace = {
                let store = state.store.lock().await;
                store.project_workspace(&project_id).ok()
            };
            let Some(workspace) = workspace else {
                return;
            };
            if !may_join(state, &workspace, &user.id).await {
                return;
            }
            state
                .broadcaster
                .publish(
                    &RoomId::Project(project_id.clone()),
                    &ServerEvent::TaskMoved {
                        task_id,
                        project_id,
                        status,
                        position,
                        moved_by: presence.clone(),
                    },
                )
                .await;
        }
        ClientFrame::TypingStart { task_id } => {
            state
                .broadcaster
                .publish(
                    &RoomId::Task(task_id.clone()),
                    &ServerEvent::UserTyping {
                        user: presence.clone(),
                        task_id,
                    },
                )
                .await;
        }
        ClientFrame::TypingStop { task_id } => {
            state
                .broadcaster
                .publish(
                    &RoomId::Task(task_id.clone()),
                    &ServerEvent::UserStoppedTyping {
                        user: presence.clone(),
                        task_id,
                    },
                )
                .await;
        }
        ClientFrame::UserActive => {
            state
                .broadcaster
                .publish(
                    &RoomId::Presence,
                    &ServerEvent::UserOnline {
                        user: presence.clone(),
                        timestamp: now_ms(),
                    },
                )
                .await;
        }
    }
}
