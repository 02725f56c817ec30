use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    routing::{delete, get, post},
    Form, Json, Router,
};
use std::sync::Arc;
use tracing::info;

use super::pages::{INSERT_HTML, QUERY_HTML};
use crate::{
    errors::ApiError,
    models::Document,
    normalize::{normalize, normalize_first},
    AppState,
};

/// Each path registers only the methods it serves; anything else gets a
/// 405 without reaching a handler.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/find/all", get(find_all))
        .route("/find", get(query_form).post(find_by_form))
        .route("/findargs", get(find_by_args))
        .route("/insertargs", get(insert_by_args))
        .route("/insert", get(insert_form).post(insert_by_form))
        .route("/insertmany", post(insert_many))
        .route("/update", get(update_placeholder).post(update_placeholder))
        .route("/delete", delete(delete_documents))
}

#[utoipa::path(
    get,
    path = "/api/v1/mongo/find/all",
    tag = "mongo",
    responses(
        (status = 200, description = "Every document in the collection as a JSON array", body = String, content_type = "text/plain"),
        (status = 503, description = "Database unavailable")
    )
)]
pub async fn find_all(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    Ok(state.dispatcher.find(Document::new()).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/mongo/find",
    tag = "mongo",
    responses(
        (status = 200, description = "Query form", body = String, content_type = "text/html")
    )
)]
pub async fn query_form() -> Html<&'static str> {
    Html(QUERY_HTML)
}

#[utoipa::path(
    post,
    path = "/api/v1/mongo/find",
    tag = "mongo",
    request_body(content = String, content_type = "application/x-www-form-urlencoded",
        description = "Form fields; repeated fields become lists"),
    responses(
        (status = 200, description = "Matching documents as a JSON array", body = String, content_type = "text/plain"),
        (status = 415, description = "Body is not form encoded")
    )
)]
pub async fn find_by_form(
    State(state): State<Arc<AppState>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<String, ApiError> {
    Ok(state.dispatcher.find(normalize(pairs)).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/mongo/findargs",
    tag = "mongo",
    responses(
        (status = 200, description = "Documents matching the query parameters as a JSON array", body = String, content_type = "text/plain")
    )
)]
pub async fn find_by_args(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<String, ApiError> {
    Ok(state.dispatcher.find(normalize_first(pairs)).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/mongo/insertargs",
    tag = "mongo",
    responses(
        (status = 200, description = "Query parameters stored as a document", body = String, content_type = "text/plain")
    )
)]
pub async fn insert_by_args(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<&'static str, ApiError> {
    state.dispatcher.insert_one(normalize(pairs)).await?;
    Ok("data inserted")
}

#[utoipa::path(
    get,
    path = "/api/v1/mongo/insert",
    tag = "mongo",
    responses(
        (status = 200, description = "Insert form", body = String, content_type = "text/html")
    )
)]
pub async fn insert_form() -> Html<&'static str> {
    Html(INSERT_HTML)
}

#[utoipa::path(
    post,
    path = "/api/v1/mongo/insert",
    tag = "mongo",
    request_body(content = String, content_type = "application/x-www-form-urlencoded",
        description = "Form fields; repeated fields become lists"),
    responses(
        (status = 303, description = "Stored; redirects to /api/v1"),
        (status = 415, description = "Body is not form encoded")
    )
)]
pub async fn insert_by_form(
    State(state): State<Arc<AppState>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect, ApiError> {
    state.dispatcher.insert_one(normalize(pairs)).await?;
    Ok(Redirect::to("/api/v1"))
}

#[utoipa::path(
    post,
    path = "/api/v1/mongo/insertmany",
    tag = "mongo",
    request_body(content = Vec<serde_json::Value>, description = "Array of JSON documents"),
    responses(
        (status = 200, description = "Documents stored in the bulk collection", body = String, content_type = "text/plain"),
        (status = 400, description = "A document could not be converted")
    )
)]
pub async fn insert_many(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Vec<serde_json::Value>>,
) -> Result<&'static str, ApiError> {
    let documents = payload
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            Document::try_from(value)
                .map_err(|e| ApiError::bad_request(format!("document {}: {}", index, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let count = documents.len();
    state.dispatcher.insert_many(documents).await?;
    info!("Stored {} documents in {}", count, state.dispatcher.bulk_target());
    Ok("data inserted")
}

#[utoipa::path(
    get,
    path = "/api/v1/mongo/update",
    tag = "mongo",
    responses(
        (status = 200, description = "Placeholder page", body = String, content_type = "text/html")
    )
)]
pub async fn update_placeholder() -> Html<&'static str> {
    Html("<h1>mongo update</h1>")
}

#[utoipa::path(
    delete,
    path = "/api/v1/mongo/delete",
    tag = "mongo",
    responses(
        (status = 501, description = "Deleting documents is not implemented")
    )
)]
pub async fn delete_documents(State(state): State<Arc<AppState>>) -> Result<&'static str, ApiError> {
    state.dispatcher.delete().await?;
    Ok("data deleted")
}
