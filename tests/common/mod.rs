//! In-process stand-in for the Firestore REST API and the OAuth token endpoint.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use firestore_purge::services::{auth::Authenticator, firestore::FirestoreClient};
use serde_json::{json, Value};
use std::{
    collections::{BTreeMap, HashSet},
    net::SocketAddr,
    sync::{Arc, Mutex},
};

pub const PROJECT_ID: &str = "demo";
pub const DATABASE_ID: &str = "(default)";
pub const ACCESS_TOKEN: &str = "test-access-token";

#[derive(Default)]
struct FakeState {
    collections: BTreeMap<String, Vec<String>>,
    commits: Vec<Vec<String>>,
    queries: Vec<String>,
    denied_collections: HashSet<String>,
    interrupted_collections: HashSet<String>,
    fail_commits: bool,
    token_requests: usize,
    token_forms: Vec<(String, String)>,
    authorizations: Vec<String>,
}

type Shared = Arc<Mutex<FakeState>>;

pub struct FakeFirestore {
    pub addr: SocketAddr,
    state: Shared,
}

impl FakeFirestore {
    pub async fn spawn() -> Self {
        let state: Shared = Arc::default();
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn token_uri(&self) -> String {
        format!("http://{}/token", self.addr)
    }

    pub fn client(&self) -> FirestoreClient {
        FirestoreClient::new(
            reqwest::Client::new(),
            self.base_url(),
            PROJECT_ID,
            DATABASE_ID,
            Authenticator::Emulator,
        )
    }

    pub fn seed(&self, collection: &str, count: usize) {
        let ids = (0..count).map(|i| format!("{}-doc-{}", collection, i)).collect();
        self.state
            .lock()
            .unwrap()
            .collections
            .insert(collection.to_string(), ids);
    }

    pub fn deny(&self, collection: &str) {
        self.state
            .lock()
            .unwrap()
            .denied_collections
            .insert(collection.to_string());
    }

    /// Query streams one document, then an error element, under a 200 status.
    pub fn interrupt(&self, collection: &str) {
        self.state
            .lock()
            .unwrap()
            .interrupted_collections
            .insert(collection.to_string());
    }

    pub fn fail_commits(&self) {
        self.state.lock().unwrap().fail_commits = true;
    }

    pub fn remaining(&self, collection: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Document names sent in each commit, in arrival order.
    pub fn commits(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().commits.clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.state.lock().unwrap().queries.clone()
    }

    pub fn token_requests(&self) -> usize {
        self.state.lock().unwrap().token_requests
    }

    /// Content type and body of each token request.
    pub fn token_forms(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().token_forms.clone()
    }

    pub fn authorizations(&self) -> Vec<String> {
        self.state.lock().unwrap().authorizations.clone()
    }
}

fn api_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "error": { "code": status.as_u16(), "message": message } })),
    )
        .into_response()
}

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let mut state = state.lock().unwrap();

    if method != Method::POST {
        return api_error(StatusCode::METHOD_NOT_ALLOWED, "POST only");
    }

    if path == "/token" {
        state.token_requests += 1;
        let content_type = headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        state
            .token_forms
            .push((content_type, String::from_utf8_lossy(&body).into_owned()));
        return Json(json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 3599,
            "token_type": "Bearer"
        }))
        .into_response();
    }

    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        state.authorizations.push(auth.to_string());
    }

    let request: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(_) => return api_error(StatusCode::BAD_REQUEST, "Invalid JSON payload"),
    };

    if let Some(database_path) = path
        .strip_prefix("/v1/")
        .and_then(|p| p.strip_suffix("/documents:runQuery"))
    {
        let collection = request["structuredQuery"]["from"][0]["collectionId"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        state.queries.push(collection.clone());

        // Streaming methods wrap error bodies in an array.
        if state.denied_collections.contains(&collection) {
            return (
                StatusCode::FORBIDDEN,
                Json(json!([{
                    "error": {
                        "code": 403,
                        "message": "Missing or insufficient permissions.",
                        "status": "PERMISSION_DENIED"
                    }
                }])),
            )
                .into_response();
        }

        let ids = state.collections.get(&collection).cloned().unwrap_or_default();
        if ids.is_empty() {
            return Json(json!([{ "readTime": "2024-03-01T10:00:00.000000Z" }])).into_response();
        }

        let interrupted = state.interrupted_collections.contains(&collection);
        let streamed = if interrupted { &ids[..1] } else { &ids[..] };

        let mut items: Vec<Value> = streamed
            .iter()
            .map(|id| {
                json!({
                    "document": {
                        "name": format!("{}/documents/{}/{}", database_path, collection, id),
                        "fields": { "event_name": { "stringValue": id } },
                        "createTime": "2024-02-01T10:00:00.000000Z",
                        "updateTime": "2024-02-02T10:00:00.000000Z"
                    },
                    "readTime": "2024-03-01T10:00:00.000000Z"
                })
            })
            .collect();
        if interrupted {
            items.push(json!({
                "error": { "code": 4, "message": "Deadline exceeded", "status": "DEADLINE_EXCEEDED" }
            }));
        }
        return Json(Value::Array(items)).into_response();
    }

    if path.ends_with("/documents:commit") {
        if state.fail_commits {
            return api_error(StatusCode::SERVICE_UNAVAILABLE, "The service is currently unavailable.");
        }

        let names: Vec<String> = request["writes"]
            .as_array()
            .map(|writes| {
                writes
                    .iter()
                    .filter_map(|w| w["delete"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        for name in &names {
            let mut parts = name.rsplitn(3, '/');
            let (Some(id), Some(collection)) = (parts.next(), parts.next()) else {
                continue;
            };
            if let Some(docs) = state.collections.get_mut(collection) {
                docs.retain(|d| d != id);
            }
        }

        let results: Vec<Value> = names
            .iter()
            .map(|_| json!({ "updateTime": "2024-03-01T10:00:01.000000Z" }))
            .collect();
        state.commits.push(names);

        return Json(json!({
            "writeResults": results,
            "commitTime": "2024-03-01T10:00:01.000000Z"
        }))
        .into_response();
    }

    api_error(StatusCode::NOT_FOUND, "Not found")
}
