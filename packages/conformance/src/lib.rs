//! Shared helpers for the nanagogo end-to-end test suite.
//!
//! Provides [`spawn_mock_api`], which binds an ephemeral port on `127.0.0.1`
//! and serves an in-process imitation of the 7gogo API and its public talk
//! pages from a [`Fixtures`] set. The client under test is blocking, so the
//! mock runs on its own thread with its own `tokio` runtime rather than
//! inside the test's.
//!
//! # Routes
//!
//! | Method | Path | Behaviour |
//! |--------|------|-----------|
//! | GET | `/api/talks/{id}` | `{"data": <talk info>}` or 404 JSON error |
//! | GET | `/api/talks/{id}/posts` | posts around `targetId`, honouring `limit`/`direction` |
//! | GET | `/api/talk/info` | `{"data": [<talk>…]}` for the known ids in `talkIds` |
//! | GET | `/api/users/{id}` | `{"data": <user>}` or 404 JSON error |
//! | GET | `/api/users/{id}/followTalks` | `{"data": {"talk": […], "nextExisted": […]}}` |
//! | GET | `/api/broken` | 200 with an HTML body |
//! | GET | `/lp/{id}` | the fixture page, or a 404 HTML error page |

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{mpsc, Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

/// Data served by the mock.
#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    /// Talk info records (`{"talk": {…}, "user": {…}}`) keyed by `talkId`.
    pub talks: HashMap<String, Value>,
    /// Post ids per `talkId`.
    pub posts: HashMap<String, Vec<i64>>,
    /// User records keyed by `userId`.
    pub users: HashMap<String, Value>,
    /// Followed talk records per `userId`.
    pub following: HashMap<String, Vec<Value>>,
    /// Public page HTML keyed by public id.
    pub pages: HashMap<String, String>,
}

impl Fixtures {
    /// Add a talk owned by `user_id` whose posts are `post_ids`.
    pub fn with_talk(mut self, talk_id: &str, user_id: &str, post_ids: Vec<i64>) -> Self {
        let last = post_ids.iter().max().copied().unwrap_or(0);
        self.talks.insert(
            talk_id.to_string(),
            json!({
                "talk": { "talkId": talk_id, "name": format!("talk {talk_id}"), "lastPostId": last },
                "user": { "userId": user_id },
            }),
        );
        self.posts.insert(talk_id.to_string(), post_ids);
        self
    }

    /// Add a public page whose `setting` block points at `talk_id`.
    pub fn with_page(mut self, public_id: &str, talk_id: &str) -> Self {
        self.pages.insert(public_id.to_string(), talk_page(talk_id));
        self
    }

    /// Add a public page with arbitrary HTML.
    pub fn with_raw_page(mut self, public_id: &str, html: &str) -> Self {
        self.pages.insert(public_id.to_string(), html.to_string());
        self
    }

    pub fn with_user(mut self, user_id: &str, following: Vec<Value>) -> Self {
        self.users.insert(
            user_id.to_string(),
            json!({ "userId": user_id, "name": format!("user {user_id}") }),
        );
        self.following.insert(user_id.to_string(), following);
        self
    }
}

/// HTML shaped like a real public talk page.
pub fn talk_page(talk_id: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><title>7gogo</title></head><body>\n\
         <div id=\"app\"></div>\n\
         <script>\n  var setting = {{\n    talkId: '{talk_id}',\n    lang: 'ja',\n    isPc: true\n  }};\n</script>\n\
         </body></html>\n"
    )
}

struct MockState {
    fixtures: Fixtures,
    log: Arc<Mutex<Vec<String>>>,
}

impl MockState {
    fn record(&self, uri: &Uri) {
        if let Ok(mut log) = self.log.lock() {
            log.push(uri.to_string());
        }
    }
}

/// A running mock server.
pub struct MockApi {
    /// Scheme and authority, e.g. `http://127.0.0.1:51234`.
    pub base_url: String,
    log: Arc<Mutex<Vec<String>>>,
}

impl MockApi {
    /// Every request received so far, as `path?query`, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Requests whose path starts with `prefix`.
    pub fn requests_to(&self, prefix: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.starts_with(prefix))
            .collect()
    }
}

/// Start the mock on an ephemeral port and return once it is accepting
/// connections.
///
/// # Panics
///
/// Panics if the runtime cannot be built or the listener cannot be bound.
pub fn spawn_mock_api(fixtures: Fixtures) -> MockApi {
    let log = Arc::new(Mutex::new(Vec::new()));
    let state = Arc::new(MockState {
        fixtures,
        log: Arc::clone(&log),
    });
    let router = build_router(state);

    let (tx, rx) = mpsc::channel::<SocketAddr>();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("build mock runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind ephemeral port");
            let addr = listener.local_addr().expect("get local addr");
            tx.send(addr).expect("report mock address");
            axum::serve(listener, router).await.expect("mock server error");
        });
    });

    let addr = rx.recv().expect("mock server failed to start");
    MockApi {
        base_url: format!("http://{addr}"),
        log,
    }
}

fn build_router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/api/talks/{id}", get(talk_info))
        .route("/api/talks/{id}/posts", get(talk_posts))
        .route("/api/talk/info", get(talk_info_batch))
        .route("/api/users/{id}", get(user_info))
        .route("/api/users/{id}/followTalks", get(user_following))
        .route("/api/broken", get(broken))
        .route("/lp/{id}", get(public_page))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": { "code": 40401, "message": message } })),
    )
        .into_response()
}

async fn talk_info(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    uri: Uri,
) -> Response {
    state.record(&uri);
    match state.fixtures.talks.get(&id) {
        Some(info) => Json(json!({ "data": info })).into_response(),
        None => not_found("トークが見つかりません"),
    }
}

async fn talk_posts(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    uri: Uri,
) -> Response {
    state.record(&uri);
    let Some(ids) = state.fixtures.posts.get(&id) else {
        return not_found("トークが見つかりません");
    };

    let limit = params
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(30);
    let target = params
        .get("targetId")
        .and_then(|t| t.parse::<i64>().ok());
    let forward = params.get("direction").map(String::as_str) == Some("NEXT");

    let mut selected: Vec<i64> = if forward {
        let from = target.unwrap_or(i64::MIN);
        let mut ids: Vec<i64> = ids.iter().copied().filter(|&p| p >= from).collect();
        ids.sort_unstable();
        ids
    } else {
        let upto = target.unwrap_or(i64::MAX);
        let mut ids: Vec<i64> = ids.iter().copied().filter(|&p| p <= upto).collect();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        ids
    };
    selected.truncate(limit);

    let posts: Vec<Value> = selected
        .into_iter()
        .map(|post_id| json!({ "post": { "postId": post_id, "talkId": id, "body": [] } }))
        .collect();
    Json(json!({ "data": posts })).into_response()
}

async fn talk_info_batch(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
    uri: Uri,
) -> Response {
    state.record(&uri);
    let requested = params.get("talkIds").cloned().unwrap_or_default();
    if requested.split(',').count() > 5 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": 400, "error": "too many talkIds" })),
        )
            .into_response();
    }

    let talks: Vec<Value> = requested
        .split(',')
        .filter_map(|id| state.fixtures.talks.get(id))
        .filter_map(|info| info.get("talk").cloned())
        .collect();
    Json(json!({ "data": talks })).into_response()
}

async fn user_info(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    uri: Uri,
) -> Response {
    state.record(&uri);
    match state.fixtures.users.get(&id) {
        Some(user) => Json(json!({ "data": user })).into_response(),
        None => not_found("ユーザーが見つかりません"),
    }
}

async fn user_following(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    uri: Uri,
) -> Response {
    state.record(&uri);
    match state.fixtures.following.get(&id) {
        Some(talks) => {
            Json(json!({ "data": { "talk": talks, "nextExisted": [] } })).into_response()
        }
        None => not_found("ユーザーが見つかりません"),
    }
}

async fn broken(State(state): State<Arc<MockState>>, uri: Uri) -> Response {
    state.record(&uri);
    Html("<html><body>maintenance</body></html>").into_response()
}

async fn public_page(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    uri: Uri,
) -> Response {
    state.record(&uri);
    match state.fixtures.pages.get(&id) {
        Some(html) => Html(html.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html(
                "<html><body><div class=\"error\">\n\
                 <p class=\"errorMessage\">ページが見つかりません</p>\n\
                 </div></body></html>",
            ),
        )
            .into_response(),
    }
}
