use axum::{response::Html, routing::get, Router};
use std::sync::Arc;

use crate::AppState;

const INDEX_HTML: &str = include_str!("../../templates/index.html");
const DOCS_HTML: &str = include_str!("../../templates/docs.html");
pub(crate) const QUERY_HTML: &str = include_str!("../../templates/query.html");
pub(crate) const INSERT_HTML: &str = include_str!("../../templates/mongoinsert.html");

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home_page))
        .route("/api/v1", get(api_docs))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "pages",
    responses(
        (status = 200, description = "Landing page", body = String, content_type = "text/html")
    )
)]
pub async fn home_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[utoipa::path(
    get,
    path = "/api/v1",
    tag = "pages",
    responses(
        (status = 200, description = "API documentation page", body = String, content_type = "text/html")
    )
)]
pub async fn api_docs() -> Html<&'static str> {
    Html(DOCS_HTML)
}
