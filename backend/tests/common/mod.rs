//! Fake generation endpoint for integration tests.

#![allow(dead_code)]

use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::future::Future;
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral port and return its base URL
pub async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Base URL nothing listens on
pub async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// `/api/generate` answering with whatever `reply` makes of the request body
pub fn generate_route<F, Fut>(reply: F) -> Router
where
    F: Fn(Value) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = (axum::http::StatusCode, String)> + Send + 'static,
{
    Router::new().route("/api/generate", post(move |Json(body): Json<Value>| reply(body)))
}

/// Standard non-streaming envelope around `text`
pub fn envelope(text: &str) -> String {
    json!({
        "model": "mistral",
        "created_at": "2026-01-01T00:00:00Z",
        "response": text,
        "done": true
    })
    .to_string()
}
