use std::{collections::HashMap, sync::Arc};

use super::*;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode as HttpStatus},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use shared::{domain::NameFilter, error::ErrorCode};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct RecordingState {
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    tokens: Arc<Mutex<Vec<Option<String>>>>,
    unbind_bodies: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    removed: Arc<Mutex<Vec<String>>>,
    unbound_all: Arc<Mutex<Vec<String>>>,
    saved: Arc<Mutex<Vec<Value>>>,
    remove_status: Arc<Mutex<u16>>,
}

async fn handle_query(
    State(state): State<RecordingState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.tokens.lock().await.push(
        headers
            .get(ACCESS_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
    state.queries.lock().await.push(params);
    Json(json!({
        "status": 200,
        "result": {
            "data": [
                {
                    "id": "g1",
                    "name": "Lobby",
                    "devices": [
                        {"id": "d5", "name": "Lamp", "state": {"text": "在线", "value": "online"}},
                        {"id": "d9", "name": "Fan", "state": {"text": "离线", "value": "offline"}}
                    ]
                },
                {"id": "g2", "name": "Garage", "devices": []}
            ],
            "pageIndex": 0,
            "pageSize": 8,
            "total": 2
        }
    }))
}

async fn handle_save(State(state): State<RecordingState>, Json(body): Json<Value>) -> Json<Value> {
    state.saved.lock().await.push(body);
    Json(json!({"status": 200, "result": 1}))
}

async fn handle_remove(State(state): State<RecordingState>, Path(id): Path<String>) -> Json<Value> {
    state.removed.lock().await.push(id);
    let status = *state.remove_status.lock().await;
    if status == 200 {
        Json(json!({"status": 200}))
    } else {
        Json(json!({"status": status, "message": "group is referenced"}))
    }
}

async fn handle_unbind(
    State(state): State<RecordingState>,
    Path(id): Path<String>,
    Json(body): Json<Vec<String>>,
) -> Json<Value> {
    state.unbind_bodies.lock().await.push((id, body));
    Json(json!({"status": 200, "result": 1}))
}

async fn handle_unbind_all(
    State(state): State<RecordingState>,
    Path(id): Path<String>,
) -> Json<Value> {
    state.unbound_all.lock().await.push(id);
    Json(json!({"status": 200}))
}

async fn handle_gateway_failure() -> (HttpStatus, &'static str) {
    (HttpStatus::BAD_GATEWAY, "upstream unavailable")
}

async fn spawn_group_server() -> anyhow::Result<(String, RecordingState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = RecordingState::default();
    *state.remove_status.lock().await = 200;
    let app = Router::new()
        .route("/jetlinks/device/group/_query", get(handle_query))
        .route("/jetlinks/device/group", axum::routing::patch(handle_save))
        .route("/jetlinks/device/group/:id", delete(handle_remove))
        .route("/jetlinks/device/group/:id/_unbind", post(handle_unbind))
        .route("/jetlinks/device/group/:id/_unbind/all", post(handle_unbind_all))
        .route("/broken/device/group/_query", get(handle_gateway_failure))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

#[test]
fn base_url_gets_trailing_slash_so_paths_nest() {
    let api = HttpGroupApi::new("http://example.test/jetlinks").expect("api");
    assert_eq!(
        api.endpoint("device/group").expect("url").as_str(),
        "http://example.test/jetlinks/device/group"
    );
}

#[test]
fn group_id_is_escaped_as_one_path_segment() {
    let api = HttpGroupApi::new("http://example.test/jetlinks").expect("api");
    let url = api
        .group_endpoint(&GroupId::from("a/b?c#d"), &["_unbind", "all"])
        .expect("url");
    assert_eq!(
        url.as_str(),
        "http://example.test/jetlinks/device/group/a%2Fb%3Fc%23d/_unbind/all"
    );
}

#[test]
fn dot_segment_group_ids_are_refused() {
    let api = HttpGroupApi::new("http://example.test/jetlinks").expect("api");
    for id in ["", ".", ".."] {
        assert!(matches!(
            api.group_endpoint(&GroupId::from(id), &[]),
            Err(ClientError::InvalidGroupId(rejected)) if rejected == id
        ));
    }
}

#[test]
fn opaque_base_url_is_refused() {
    assert!(matches!(
        HttpGroupApi::new("mailto:ops@example.test"),
        Err(ClientError::OpaqueBaseUrl(_))
    ));
}

#[test]
fn rejects_unparseable_base_url() {
    assert!(matches!(
        HttpGroupApi::new("not a url"),
        Err(ClientError::InvalidUrl(_))
    ));
}

#[tokio::test]
async fn list_sends_encoded_descriptor_and_decodes_page() {
    let (server, state) = spawn_group_server().await.expect("server");
    let api = HttpGroupApi::new(&format!("{server}/jetlinks"))
        .expect("api")
        .with_access_token(Some("secret".into()));

    let descriptor = SearchDescriptor {
        page_index: 1,
        page_size: 16,
        terms: Some(NameFilter::new("lob")),
    };
    let page = api.list(&descriptor).await.expect("page");

    assert_eq!(page.total, 2);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0].devices[0].id, DeviceId::from("d5"));

    let queries = state.queries.lock().await;
    assert_eq!(queries[0].get("pageIndex").map(String::as_str), Some("1"));
    assert_eq!(queries[0].get("pageSize").map(String::as_str), Some("16"));
    assert_eq!(
        queries[0].get("terms[0].column").map(String::as_str),
        Some("name$LIKE")
    );
    assert_eq!(
        queries[0].get("terms[0].value").map(String::as_str),
        Some("%lob%")
    );
    assert_eq!(state.tokens.lock().await[0].as_deref(), Some("secret"));
}

#[tokio::test]
async fn unbind_posts_single_device_list() {
    let (server, state) = spawn_group_server().await.expect("server");
    let api = HttpGroupApi::new(&format!("{server}/jetlinks")).expect("api");

    api.unbind(&GroupId::from("g1"), &[DeviceId::from("d5")])
        .await
        .expect("unbind");

    let bodies = state.unbind_bodies.lock().await;
    assert_eq!(bodies.as_slice(), &[("g1".to_string(), vec!["d5".to_string()])]);
}

#[tokio::test]
async fn unbind_all_and_save_hit_their_endpoints() {
    let (server, state) = spawn_group_server().await.expect("server");
    let api = HttpGroupApi::new(&format!("{server}/jetlinks/")).expect("api");

    api.unbind_all(&GroupId::from("g2")).await.expect("unbind all");
    api.save(&GroupDraft {
        id: None,
        name: "Kitchen".into(),
        description: None,
        avatar: None,
    })
    .await
    .expect("save");

    assert_eq!(state.unbound_all.lock().await.as_slice(), &["g2".to_string()]);
    let saved = state.saved.lock().await;
    assert_eq!(saved[0]["name"], "Kitchen");
    assert!(saved[0].get("id").is_none());
}

#[tokio::test]
async fn non_success_envelope_is_reported_as_rejection() {
    let (server, state) = spawn_group_server().await.expect("server");
    *state.remove_status.lock().await = 500;
    let api = HttpGroupApi::new(&format!("{server}/jetlinks")).expect("api");

    let err = api
        .remove(&GroupId::from("g1"))
        .await
        .expect_err("should reject");

    assert!(err.is_rejection());
    match err {
        ClientError::Rejected(rejection) => {
            assert_eq!(rejection.status, 500);
            assert_eq!(rejection.code, ErrorCode::Internal);
            assert_eq!(rejection.message, "group is referenced");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(state.removed.lock().await.as_slice(), &["g1".to_string()]);
}

#[tokio::test]
async fn gateway_error_without_envelope_is_transport_failure() {
    let (server, _state) = spawn_group_server().await.expect("server");
    let api = HttpGroupApi::new(&format!("{server}/broken")).expect("api");

    let err = api
        .list(&SearchDescriptor::default())
        .await
        .expect_err("should fail");

    assert!(!err.is_rejection());
    assert!(matches!(err, ClientError::Http(status) if status == StatusCode::BAD_GATEWAY));
}

#[tokio::test]
async fn unreachable_server_is_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let api = HttpGroupApi::new(&format!("http://{addr}/jetlinks")).expect("api");
    let err = api
        .unbind_all(&GroupId::from("g1"))
        .await
        .expect_err("should fail");
    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn reserved_characters_in_group_id_reach_the_same_group() {
    let (server, state) = spawn_group_server().await.expect("server");
    let api = HttpGroupApi::new(&format!("{server}/jetlinks")).expect("api");

    api.remove(&GroupId::from("x#y/z")).await.expect("remove");
    api.unbind(&GroupId::from("50%?off"), &[DeviceId::from("d5")])
        .await
        .expect("unbind");

    assert_eq!(state.removed.lock().await.as_slice(), &["x#y/z".to_string()]);
    let bodies = state.unbind_bodies.lock().await;
    assert_eq!(
        bodies.as_slice(),
        &[("50%?off".to_string(), vec!["d5".to_string()])]
    );
}

#[tokio::test]
async fn parent_segment_group_id_never_leaves_the_wire() {
    let (server, state) = spawn_group_server().await.expect("server");
    let api = HttpGroupApi::new(&format!("{server}/jetlinks")).expect("api");

    let err = api
        .unbind_all(&GroupId::from(".."))
        .await
        .expect_err("should refuse");

    assert!(matches!(err, ClientError::InvalidGroupId(_)));
    assert!(!err.is_rejection());
    assert!(state.unbound_all.lock().await.is_empty());
}
