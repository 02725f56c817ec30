use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use axum::Router;
use std::sync::Arc;

use crate::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        crate::health_check,
        // Static pages
        crate::routes::pages::home_page,
        crate::routes::pages::api_docs,
        // Mongo endpoints
        crate::routes::mongo::find_all,
        crate::routes::mongo::query_form,
        crate::routes::mongo::find_by_form,
        crate::routes::mongo::find_by_args,
        crate::routes::mongo::insert_by_args,
        crate::routes::mongo::insert_form,
        crate::routes::mongo::insert_by_form,
        crate::routes::mongo::insert_many,
        crate::routes::mongo::update_placeholder,
        crate::routes::mongo::delete_documents,
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "pages", description = "Static HTML pages"),
        (name = "mongo", description = "Document read and write endpoints"),
    ),
    info(
        title = "Mongo API",
        version = "0.1.0",
        description = "Create and read documents in MongoDB over HTTP"
    )
)]
pub struct ApiDoc;

pub fn create_swagger_router() -> Router<Arc<AppState>> {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
