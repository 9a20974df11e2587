//! In-process Bot API stand-in for tests.
//!
//! Serves `/bot<token>/<method>` on an ephemeral loopback port, records every
//! call in order and answers with a canned response per method.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
pub struct StubProvider {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
    responses: Arc<Mutex<HashMap<String, (u16, Value)>>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method` with `status` and `body` from now on.
    pub fn respond(&self, method: &str, status: u16, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(method.to_string(), (status, body));
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|(m, _)| m).collect()
    }

    /// Start serving and return the API base, e.g. `http://127.0.0.1:41234`.
    pub async fn serve(&self) -> String {
        let app = Router::new()
            .route("/:bot/:method", post(handle))
            .with_state(self.clone());
        serve_router(app).await
    }
}

async fn handle(
    State(stub): State<StubProvider>,
    Path((_bot, method)): Path<(String, String)>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let payload = serde_json::from_slice(&body).unwrap_or(Value::Null);
    stub.calls.lock().unwrap().push((method.clone(), payload));

    let (status, body) = stub
        .responses
        .lock()
        .unwrap()
        .get(&method)
        .cloned()
        .unwrap_or((200, json!({ "ok": true, "result": true })));

    (StatusCode::from_u16(status).unwrap(), Json(body))
}

/// Bind `app` on an ephemeral loopback port and return its origin.
pub async fn serve_router(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
