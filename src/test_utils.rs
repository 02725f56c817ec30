//! Helpers for driving the router against an in-process store.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use std::sync::Arc;
use tower::util::ServiceExt;

use async_trait::async_trait;

use crate::{
    config::{Config, StoreBackend},
    dispatcher::Dispatcher,
    errors::StoreError,
    models::Namespace,
    store::{DocumentStore, MemoryStore, Session},
    AppState,
};

/// A store whose server can never be reached.
pub struct UnreachableStore;

#[async_trait]
impl DocumentStore for UnreachableStore {
    async fn session(&self, namespace: &Namespace) -> Result<Box<dyn Session>, StoreError> {
        Err(StoreError::Connection {
            message: format!("no server selected for {}", namespace),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Connection {
            message: "no server selected".to_string(),
        })
    }
}

pub fn create_app_with_store(store: Arc<dyn DocumentStore>) -> Router {
    let config = Config {
        server_address: "127.0.0.1:0".to_string(),
        store_backend: StoreBackend::Memory,
        ..Config::default()
    };
    let dispatcher = Dispatcher::new(
        store,
        config.find_namespace.clone(),
        config.bulk_namespace.clone(),
    );
    let state = Arc::new(AppState { config, dispatcher });
    crate::create_router(state)
}

pub fn create_test_app() -> (Router, MemoryStore) {
    let store = MemoryStore::new();
    (create_app_with_store(Arc::new(store.clone())), store)
}

pub async fn send(app: &Router, method: &str, uri: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn send_form(app: &Router, uri: &str, form: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn send_json(app: &Router, uri: &str, json: serde_json::Value) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Parses a find response into JSON and drops generated `_id`s.
pub async fn found_documents(response: Response) -> Vec<serde_json::Value> {
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    let mut documents: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
    for document in &mut documents {
        document.as_object_mut().unwrap().remove("_id");
    }
    documents
}
