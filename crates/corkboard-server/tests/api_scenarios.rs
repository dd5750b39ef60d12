// SPDX-License-Identifier: Apache-2.0

//! End-to-end scenarios through the router: authorization gates, the
//! invitation lifecycle, mention fan-out, board moves and their broadcast.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use corkboard_core::{now_ms, UserId};
use corkboard_server::auth::{sign_token, TokenClaims};
use corkboard_server::{build_router, AppState, ServerConfig};
use corkboard_store::Store;

const SECRET: &str = "scenario-secret";

struct Persona {
    id: UserId,
    email: String,
    token: String,
}

fn persona(email: &str, name: &str) -> Persona {
    let id = UserId::mint();
    let now = now_ms();
    let claims = TokenClaims {
        sub: id.clone(),
        email: email.to_string(),
        name: name.to_string(),
        avatar_url: None,
        issued_at: now,
        expires_at: now + 60 * 60 * 1000,
    };
    let token = sign_token(&claims, SECRET.as_bytes()).expect("sign token");
    Persona {
        id,
        email: email.to_string(),
        token,
    }
}

fn expired_token() -> String {
    let now = now_ms();
    let claims = TokenClaims {
        sub: UserId::mint(),
        email: "old@example.com".to_string(),
        name: "old".to_string(),
        avatar_url: None,
        issued_at: now - 120_000,
        expires_at: now - 60_000,
    };
    sign_token(&claims, SECRET.as_bytes()).expect("sign token")
}

fn test_config(upload_dir: &std::path::Path) -> ServerConfig {
    ServerConfig {
        token_secret: SECRET.to_string(),
        upload_max_bytes: 1024,
        upload_dir: upload_dir.to_path_buf(),
        token_ttl: Duration::from_secs(3600),
        ..ServerConfig::default()
    }
}

fn harness() -> (Router, AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::open_in_memory().expect("store");
    let state = AppState::new(store, test_config(dir.path()));
    (build_router(state.clone()), state, dir)
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Create a workspace as `owner` and return its id.
async fn create_workspace(router: &Router, owner: &Persona, name: &str) -> String {
    let (status, body) = send(
        router,
        "POST",
        "/workspaces",
        Some(&owner.token),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["workspace"]["id"].as_str().expect("workspace id").to_string()
}

/// Invite and accept in one step, returning the invitation id used.
async fn add_member(router: &Router, admin: &Persona, member: &Persona, ws: &str, role: &str) {
    let (status, body) = send(
        router,
        "POST",
        &format!("/workspaces/{ws}/invitations"),
        Some(&admin.token),
        Some(json!({ "email": member.email, "role": role })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let invitation_id = body["invitation"]["id"].as_str().expect("invitation id");

    let (status, _) = send(
        router,
        "POST",
        &format!("/invitations/{invitation_id}/accept"),
        Some(&member.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn workspace_creation_yields_exactly_one_owner_membership() {
    let (router, _, _dir) = harness();
    let ada = persona("ada@example.com", "ada");

    let ws = create_workspace(&router, &ada, "Research").await;

    let (status, body) = send(&router, "GET", "/workspaces", Some(&ada.token), None).await;
    assert_eq!(status, StatusCode::OK);
    let workspaces = body["workspaces"].as_array().expect("list");
    assert_eq!(workspaces.len(), 1);
    assert_eq!(workspaces[0]["id"], ws.as_str());
    assert_eq!(workspaces[0]["user_role"], "owner");

    let (status, body) = send(
        &router,
        "GET",
        &format!("/workspaces/{ws}/members"),
        Some(&ada.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members"].as_array().expect("members").len(), 1);
}

#[tokio::test]
async fn invitation_lifecycle_with_idempotent_second_accept() {
    let (router, _, _dir) = harness();
    let ada = persona("ada@example.com", "ada");
    let bob = persona("bob@example.com", "bob");
    let ws = create_workspace(&router, &ada, "Research").await;

    let (status, body) = send(
        &router,
        "POST",
        &format!("/workspaces/{ws}/invitations"),
        Some(&ada.token),
        Some(json!({ "email": bob.email, "role": "member" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let invitation_id = body["invitation"]["id"].as_str().expect("id").to_string();

    let (status, body) = send(
        &router,
        "POST",
        &format!("/invitations/{invitation_id}/accept"),
        Some(&bob.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "member");

    // The invitation row is gone: a second accept is a 404 and no second
    // membership appears.
    let (status, _) = send(
        &router,
        "POST",
        &format!("/invitations/{invitation_id}/accept"),
        Some(&bob.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(
        &router,
        "GET",
        &format!("/workspaces/{ws}/members"),
        Some(&ada.token),
        None,
    )
    .await;
    assert_eq!(body["members"].as_array().expect("members").len(), 2);

    // Re-inviting an existing member conflicts.
    let (status, _) = send(
        &router,
        "POST",
        &format!("/workspaces/{ws}/invitations"),
        Some(&ada.token),
        Some(json!({ "email": bob.email })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn role_hierarchy_gates_workspace_updates() {
    let (router, _, _dir) = harness();
    let ada = persona("ada@example.com", "ada");
    let carol = persona("carol@example.com", "carol");
    let ws = create_workspace(&router, &ada, "Research").await;
    add_member(&router, &ada, &carol, &ws, "member").await;

    // member < admin: denied without side effects.
    let (status, body) = send(
        &router,
        "PUT",
        &format!("/workspaces/{ws}"),
        Some(&carol.token),
        Some(json!({ "name": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Insufficient permissions");

    // owner ≥ admin: allowed, and the audit trail records it.
    let (status, body) = send(
        &router,
        "PUT",
        &format!("/workspaces/{ws}"),
        Some(&ada.token),
        Some(json!({ "name": "Research v2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["workspace"]["name"], "Research v2");

    let (status, body) = send(
        &router,
        "GET",
        &format!("/activities/workspace/{ws}"),
        Some(&ada.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = body["activities"]
        .as_array()
        .expect("activities")
        .iter()
        .filter_map(|a| a["action"].as_str())
        .collect();
    assert!(actions.contains(&"workspace_updated"));
}

#[tokio::test]
async fn non_members_cannot_see_or_touch_a_workspace() {
    let (router, _, _dir) = harness();
    let ada = persona("ada@example.com", "ada");
    let eve = persona("eve@example.com", "eve");
    let ws = create_workspace(&router, &ada, "Research").await;

    let (status, _) = send(
        &router,
        "GET",
        &format!("/workspaces/{ws}"),
        Some(&eve.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &router,
        "PUT",
        &format!("/workspaces/{ws}"),
        Some(&eve.token),
        Some(json!({ "name": "Mine now" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn kick_requires_admin_and_never_removes_yourself() {
    let (router, _, _dir) = harness();
    let ada = persona("ada@example.com", "ada");
    let bob = persona("bob@example.com", "bob");
    let ws = create_workspace(&router, &ada, "Research").await;
    add_member(&router, &ada, &bob, &ws, "member").await;

    // A member cannot kick.
    let (status, _) = send(
        &router,
        "DELETE",
        &format!("/workspaces/{ws}/members/{}", ada.id),
        Some(&bob.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The owner cannot kick themselves through this path.
    let (status, _) = send(
        &router,
        "DELETE",
        &format!("/workspaces/{ws}/members/{}", ada.id),
        Some(&ada.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The owner can kick the member.
    let (status, _) = send(
        &router,
        "DELETE",
        &format!("/workspaces/{ws}/members/{}", bob.id),
        Some(&ada.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn mention_creates_exactly_one_mention_and_notification() {
    let (router, _, _dir) = harness();
    let ada = persona("ada@example.com", "ada");
    let bob = persona("bob@example.com", "bob");
    let ws = create_workspace(&router, &ada, "Research").await;
    add_member(&router, &ada, &bob, &ws, "member").await;

    let (_, body) = send(
        &router,
        "POST",
        "/projects",
        Some(&ada.token),
        Some(json!({ "name": "Launch", "workspace_id": ws })),
    )
    .await;
    let project_id = body["project"]["id"].as_str().expect("project id").to_string();

    let (_, body) = send(
        &router,
        "POST",
        "/tasks",
        Some(&ada.token),
        Some(json!({ "title": "Ship it", "project_id": project_id })),
    )
    .await;
    let task_id = body["task"]["id"].as_str().expect("task id").to_string();

    // One resolvable mention, one that matches nobody, one non-member.
    let (status, body) = send(
        &router,
        "POST",
        "/comments",
        Some(&ada.token),
        Some(json!({
            "content": "ping @bob and @nobody about this",
            "task_id": task_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let mentions = body["comment"]["mentions"].as_array().expect("mentions");
    assert_eq!(mentions.len(), 1);
    assert_eq!(mentions[0]["display_name"], "bob");

    let (_, body) = send(&router, "GET", "/notifications", Some(&bob.token), None).await;
    let notifications = body["notifications"].as_array().expect("notifications");
    let mentioned: Vec<_> = notifications
        .iter()
        .filter(|n| n["kind"] == "mentioned")
        .collect();
    assert_eq!(mentioned.len(), 1);
    assert_eq!(mentioned[0]["task_id"], task_id.as_str());

    let (_, body) = send(&router, "GET", "/notifications/counts", Some(&bob.token), None).await;
    assert!(body["unread"].as_u64().expect("unread") >= 1);
}

#[tokio::test]
async fn board_move_fans_out_to_project_room_subscribers_in_order() {
    let (router, state, _dir) = harness();
    let ada = persona("ada@example.com", "ada");
    let ws = create_workspace(&router, &ada, "Research").await;

    let (_, body) = send(
        &router,
        "POST",
        "/projects",
        Some(&ada.token),
        Some(json!({ "name": "Launch", "workspace_id": ws })),
    )
    .await;
    let project_id = body["project"]["id"].as_str().expect("project id").to_string();

    let (_, body) = send(
        &router,
        "POST",
        "/tasks",
        Some(&ada.token),
        Some(json!({ "title": "Ship it", "project_id": project_id })),
    )
    .await;
    let task_id = body["task"]["id"].as_str().expect("task id").to_string();

    // Two clients subscribed to the project room.
    let mut client_one = state.rooms.subscribe(&format!("project_{project_id}"));
    let mut client_two = state.rooms.subscribe(&format!("project_{project_id}"));

    let (status, body) = send(
        &router,
        "PATCH",
        &format!("/tasks/{task_id}/position"),
        Some(&ada.token),
        Some(json!({ "status": "done", "position": 9000.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["status"], "done");
    assert_eq!(body["task"]["position"], 9000.5);

    // A later unrelated event for the same task.
    let (status, _) = send(
        &router,
        "PATCH",
        &format!("/tasks/{task_id}/status"),
        Some(&ada.token),
        Some(json!({ "status": "review" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for client in [&mut client_one, &mut client_two] {
        let first: Value =
            serde_json::from_str(&client.recv().await.expect("first frame")).expect("json");
        assert_eq!(first["event"], "task_moved");
        assert_eq!(first["data"]["status"], "done");
        assert_eq!(first["data"]["task_id"], task_id.as_str());

        let second: Value =
            serde_json::from_str(&client.recv().await.expect("second frame")).expect("json");
        assert_eq!(second["event"], "task_updated");
        assert_eq!(second["data"]["task"]["status"], "review");
    }
}

#[tokio::test]
async fn guests_read_but_do_not_write() {
    let (router, _, _dir) = harness();
    let ada = persona("ada@example.com", "ada");
    let gus = persona("gus@example.com", "gus");
    let ws = create_workspace(&router, &ada, "Research").await;
    add_member(&router, &ada, &gus, &ws, "guest").await;

    let (_, body) = send(
        &router,
        "POST",
        "/projects",
        Some(&ada.token),
        Some(json!({ "name": "Launch", "workspace_id": ws })),
    )
    .await;
    let project_id = body["project"]["id"].as_str().expect("project id").to_string();

    // Guests can read the board shell.
    let (status, _) = send(
        &router,
        "GET",
        &format!("/projects/{project_id}"),
        Some(&gus.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // But cannot create tasks or projects.
    let (status, _) = send(
        &router,
        "POST",
        "/tasks",
        Some(&gus.token),
        Some(json!({ "title": "Sneak", "project_id": project_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &router,
        "POST",
        "/projects",
        Some(&gus.token),
        Some(json!({ "name": "Side", "workspace_id": ws })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_and_expired_tokens_are_unauthenticated() {
    let (router, _, _dir) = harness();

    let (status, body) = send(&router, "GET", "/workspaces", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Access token required");

    let stale = expired_token();
    let (status, body) = send(&router, "GET", "/workspaces", Some(&stale), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().expect("error").contains("token"));
}

#[tokio::test]
async fn oversized_uploads_are_rejected_with_413() {
    let (router, _, _dir) = harness();
    let ada = persona("ada@example.com", "ada");
    let ws = create_workspace(&router, &ada, "Research").await;

    let (_, body) = send(
        &router,
        "POST",
        "/projects",
        Some(&ada.token),
        Some(json!({ "name": "Launch", "workspace_id": ws })),
    )
    .await;
    let project_id = body["project"]["id"].as_str().expect("project id").to_string();
    let (_, body) = send(
        &router,
        "POST",
        "/tasks",
        Some(&ada.token),
        Some(json!({ "title": "Ship it", "project_id": project_id })),
    )
    .await;
    let task_id = body["task"]["id"].as_str().expect("task id").to_string();

    // Config caps uploads at 1024 bytes.
    let oversized = vec![b'x'; 2048];
    let request = Request::builder()
        .method("POST")
        .uri(format!("/uploads/task/{task_id}?filename=big.bin"))
        .header("authorization", format!("Bearer {}", ada.token))
        .header("content-type", "application/octet-stream")
        .body(Body::from(oversized))
        .expect("request");
    let response = router.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    // A small upload still lands.
    let request = Request::builder()
        .method("POST")
        .uri(format!("/uploads/task/{task_id}?filename=ok.txt"))
        .header("authorization", format!("Bearer {}", ada.token))
        .header("content-type", "text/plain")
        .body(Body::from("fits"))
        .expect("request");
    let response = router.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn validation_errors_use_the_envelope() {
    let (router, _, _dir) = harness();
    let ada = persona("ada@example.com", "ada");

    let (status, body) = send(
        &router,
        "POST",
        "/workspaces",
        Some(&ada.token),
        Some(json!({ "name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert!(body["details"].is_array());

    let (status, body) = send(&router, "GET", "/workspaces?limit=500", Some(&ada.token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Limit must be 1-100");
}

#[tokio::test]
async fn unknown_routes_are_404() {
    let (router, _, _dir) = harness();
    let (status, body) = send(&router, "GET", "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");
}

// The drag write path: status and position land together, siblings stay
// untouched (observed through a board refetch, the client's backstop).
#[tokio::test]
async fn reorder_leaves_sibling_positions_alone() {
    let (router, _, _dir) = harness();
    let ada = persona("ada@example.com", "ada");
    let ws = create_workspace(&router, &ada, "Research").await;
    let (_, body) = send(
        &router,
        "POST",
        "/projects",
        Some(&ada.token),
        Some(json!({ "name": "Launch", "workspace_id": ws })),
    )
    .await;
    let project_id = body["project"]["id"].as_str().expect("project id").to_string();

    let mut task_ids = Vec::new();
    for title in ["first", "second", "third"] {
        let (_, body) = send(
            &router,
            "POST",
            "/tasks",
            Some(&ada.token),
            Some(json!({ "title": title, "project_id": project_id })),
        )
        .await;
        task_ids.push(body["task"]["id"].as_str().expect("task id").to_string());
        // Appended positions are clock-derived; space the creations so the
        // three tasks land on distinct scalars.
        tokio::time::sleep(Duration::from_millis(3)).await;
    }

    let (_, before) = send(
        &router,
        "GET",
        &format!("/tasks/project/{project_id}"),
        Some(&ada.token),
        None,
    )
    .await;
    let positions_before: Vec<(String, f64)> = before["tasks"]
        .as_array()
        .expect("tasks")
        .iter()
        .map(|t| {
            (
                t["id"].as_str().expect("id").to_string(),
                t["position"].as_f64().expect("position"),
            )
        })
        .collect();

    // Move the third task between the first and second.
    let (first_pos, second_pos) = (positions_before[0].1, positions_before[1].1);
    let midpoint = first_pos + (second_pos - first_pos) / 2.0;
    let (status, _) = send(
        &router,
        "PATCH",
        &format!("/tasks/{}/position", task_ids[2]),
        Some(&ada.token),
        Some(json!({ "status": "todo", "position": midpoint })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, after) = send(
        &router,
        "GET",
        &format!("/tasks/project/{project_id}"),
        Some(&ada.token),
        None,
    )
    .await;
    let order_after: Vec<String> = after["tasks"]
        .as_array()
        .expect("tasks")
        .iter()
        .map(|t| t["id"].as_str().expect("id").to_string())
        .collect();
    assert_eq!(
        order_after,
        vec![task_ids[0].clone(), task_ids[2].clone(), task_ids[1].clone()]
    );

    for task in after["tasks"].as_array().expect("tasks") {
        let id = task["id"].as_str().expect("id");
        if id != task_ids[2] {
            let original = positions_before
                .iter()
                .find(|(tid, _)| tid == id)
                .expect("known task");
            assert_eq!(task["position"].as_f64().expect("position"), original.1);
        }
    }
}
