//! Integration tests running the client against a fake Slack API
//! served by a local axum listener.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use slack_mcp_client::{ClientError, SlackClient, MAX_PAGES};

/// Bind a router on an ephemeral port and return its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn channel(id: &str, name: &str) -> Value {
    json!({"id": id, "name": name, "is_private": false})
}

/// conversations.list handler paging through fixed pages; the cursor
/// is the index of the next page.
async fn paged_channels(
    State(pages): State<Arc<Vec<Vec<Value>>>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let page = params
        .get("cursor")
        .and_then(|c| c.parse::<usize>().ok())
        .unwrap_or(0);
    let next = if page + 1 < pages.len() {
        (page + 1).to_string()
    } else {
        String::new()
    };
    Json(json!({
        "ok": true,
        "channels": pages[page],
        "response_metadata": {"next_cursor": next}
    }))
}

#[tokio::test]
async fn test_list_channels_flattens_all_pages_in_arrival_order() {
    let pages = Arc::new(vec![
        vec![channel("C1", "general"), channel("C2", "random")],
        vec![channel("C3", "dev"), channel("C4", "ops")],
        vec![channel("C5", "design")],
    ]);
    let router = Router::new()
        .route("/conversations.list", get(paged_channels))
        .with_state(pages);
    let base = serve(router).await;

    let client = SlackClient::with_base_url("xoxb-test", &base);
    let channels = client.list_channels(2, true).await.unwrap();

    let ids: Vec<&str> = channels.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["C1", "C2", "C3", "C4", "C5"]);
}

#[tokio::test]
async fn test_pagination_cap_trips_on_endless_cursor() {
    async fn endless(Query(_): Query<HashMap<String, String>>) -> Json<Value> {
        Json(json!({
            "ok": true,
            "channels": [],
            "response_metadata": {"next_cursor": "again"}
        }))
    }
    let router = Router::new().route("/conversations.list", get(endless));
    let base = serve(router).await;

    let client = SlackClient::with_base_url("xoxb-test", &base);
    let err = client.list_channels(100, true).await.unwrap_err();
    match err {
        ClientError::PaginationLimit { method, pages } => {
            assert_eq!(method, "conversations.list");
            assert_eq!(pages, MAX_PAGES);
        }
        other => panic!("expected PaginationLimit, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_users_filters_deleted_members() {
    async fn members(Query(_): Query<HashMap<String, String>>) -> Json<Value> {
        Json(json!({
            "ok": true,
            "members": [
                {"id": "U1", "name": "ana"},
                {"id": "U2", "name": "gone", "deleted": true},
                {"id": "U3", "name": "bot", "is_bot": true}
            ],
            "response_metadata": {"next_cursor": ""}
        }))
    }
    let router = Router::new().route("/users.list", get(members));
    let base = serve(router).await;

    let client = SlackClient::with_base_url("xoxb-test", &base);
    let users = client.list_users(100).await.unwrap();

    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.id != "U2"));
    assert!(users[1].is_bot);
}

#[tokio::test]
async fn test_not_ok_envelope_classified_with_upstream_code() {
    async fn denied() -> Json<Value> {
        Json(json!({"ok": false, "error": "invalid_auth"}))
    }
    let router = Router::new().route("/auth.test", get(denied));
    let base = serve(router).await;

    let client = SlackClient::with_base_url("xoxb-bad", &base);
    let err = client.test_auth().await.unwrap_err();
    match err {
        ClientError::Api { method, code } => {
            assert_eq!(method, "auth.test");
            assert_eq!(code, "invalid_auth");
        }
        other => panic!("expected Api, got {other:?}"),
    }
}

#[tokio::test]
async fn test_http_failure_classified_with_status() {
    async fn broken() -> (axum::http::StatusCode, &'static str) {
        (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom")
    }
    let router = Router::new().route("/team.info", get(broken));
    let base = serve(router).await;

    let client = SlackClient::with_base_url("xoxb-test", &base);
    let err = client.get_workspace_info().await.unwrap_err();
    match err {
        ClientError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn test_post_message_sends_payload_and_projects_reply() {
    type Seen = Arc<Mutex<Option<Value>>>;
    async fn post_handler(State(seen): State<Seen>, Json(payload): Json<Value>) -> Json<Value> {
        *seen.lock().unwrap() = Some(payload);
        Json(json!({
            "ok": true,
            "message": {"ts": "1700000001.000200", "user": "UBOT", "text": "deploy done"}
        }))
    }
    let seen: Seen = Arc::new(Mutex::new(None));
    let router = Router::new()
        .route("/chat.postMessage", post(post_handler))
        .with_state(seen.clone());
    let base = serve(router).await;

    let client = SlackClient::with_base_url("xoxb-test", &base);
    let msg = client
        .post_message("C1", "deploy done", Some("1700000000.000100"))
        .await
        .unwrap();

    assert_eq!(msg.ts, "1700000001.000200");
    assert_eq!(msg.channel, "C1");

    let sent = seen.lock().unwrap().take().unwrap();
    assert_eq!(sent["channel"], "C1");
    assert_eq!(sent["text"], "deploy done");
    assert_eq!(sent["thread_ts"], "1700000000.000100");
}

#[tokio::test]
async fn test_channel_history_forwards_time_range() {
    async fn history(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        assert_eq!(params.get("channel").map(String::as_str), Some("C1"));
        assert_eq!(params.get("oldest").map(String::as_str), Some("1.0"));
        assert_eq!(params.get("latest").map(String::as_str), Some("2.0"));
        Json(json!({
            "ok": true,
            "messages": [
                {"ts": "1.5", "user": "U1", "text": "within range"}
            ]
        }))
    }
    let router = Router::new().route("/conversations.history", get(history));
    let base = serve(router).await;

    let client = SlackClient::with_base_url("xoxb-test", &base);
    let messages = client
        .get_channel_history("C1", 50, Some("1.0"), Some("2.0"))
        .await
        .unwrap();

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].ts, "1.5");
    assert_eq!(messages[0].channel, "C1");
}

#[tokio::test]
async fn test_auth_test_reports_identity() {
    async fn whoami() -> Json<Value> {
        Json(json!({
            "ok": true,
            "user": "deploybot",
            "team": "Acme",
            "user_id": "UBOT",
            "team_id": "T1"
        }))
    }
    let router = Router::new().route("/auth.test", get(whoami));
    let base = serve(router).await;

    let client = SlackClient::with_base_url("xoxb-test", &base);
    let auth = client.test_auth().await.unwrap();
    assert_eq!(auth.user.as_deref(), Some("deploybot"));
    assert_eq!(auth.team.as_deref(), Some("Acme"));
}
