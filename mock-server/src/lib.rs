use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_TOKEN: &str = "test-token";

/// The subset of a CRPT document the server checks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: Uuid,
    pub doc_id: String,
    pub doc_type: String,
    pub signature: String,
    pub body: Value,
}

#[derive(Deserialize)]
struct CreateDocument {
    doc_id: String,
    doc_type: String,
}

pub type Db = Arc<RwLock<HashMap<Uuid, StoredDocument>>>;

#[derive(Clone)]
pub struct AppState {
    token: Arc<str>,
    documents: Db,
}

impl AppState {
    pub fn new(token: &str) -> Self {
        Self {
            token: Arc::from(token),
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn documents(&self) -> Db {
        Arc::clone(&self.documents)
    }
}

pub fn app() -> Router {
    app_with_state(AppState::new(DEFAULT_TOKEN))
}

pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/delay/{ms}", get(delay))
        .route("/api/v3/lk/documents/create", post(create_document))
        .route("/api/v3/lk/documents", get(list_documents))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_state(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

/// Reply with the request body and content type, whatever the method.
async fn echo(headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}

async fn status(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, Json(json!({ "status": code }))).into_response(),
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn delay(Path(ms): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(json!({ "delayed_ms": ms }))
}

async fn create_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == &*state.token);
    if !authorized {
        tracing::warn!("rejected document: bad or missing token");
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" })));
    }

    let Some(signature) = headers.get("signature").and_then(|v| v.to_str().ok()) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "missing signature" })));
    };

    let raw: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })));
        }
    };
    let input: CreateDocument = match serde_json::from_value(raw.clone()) {
        Ok(input) => input,
        Err(e) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": e.to_string() })),
            );
        }
    };

    let document = StoredDocument {
        id: Uuid::new_v4(),
        doc_id: input.doc_id,
        doc_type: input.doc_type,
        signature: signature.to_string(),
        body: raw,
    };
    tracing::info!(id = %document.id, doc_id = %document.doc_id, "document created");
    let id = document.id;
    state.documents.write().await.insert(id, document);
    (StatusCode::OK, Json(json!({ "value": id })))
}

async fn list_documents(State(state): State<AppState>) -> Json<Vec<StoredDocument>> {
    let documents = state.documents.read().await;
    Json(documents.values().cloned().collect())
}
