use axum::http::StatusCode;
use thiserror::Error;

/// Common trait for all custom error types in the application
pub trait AppError: std::error::Error + Send + Sync + 'static {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get the error code for log correlation
    fn error_code(&self) -> &'static str;
}

/// Implements IntoResponse for an AppError type. Errors render as a bare
/// HTML page carrying the status and message. Submodules declared below see
/// the macro by textual scope.
macro_rules! impl_into_response {
    ($error_type:ty) => {
        impl axum::response::IntoResponse for $error_type {
            fn into_response(self) -> axum::response::Response {
                let status = crate::errors::AppError::status_code(&self);
                let code = crate::errors::AppError::error_code(&self);
                if status.is_server_error() {
                    tracing::error!(code, "{}", self);
                } else {
                    tracing::warn!(code, "{}", self);
                }

                let body = axum::response::Html(format!(
                    "<html><head><title>{status}</title></head><body><h1>{status}</h1><p>{message}</p></body></html>",
                    status = status,
                    message = crate::errors::escape_html(&crate::errors::AppError::user_message(&self)),
                ));

                axum::response::IntoResponse::into_response((status, body))
            }
        }
    };
}

pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Errors surfaced by route handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Store(e) => e.status_code(),
        }
    }

    fn user_message(&self) -> String {
        match self {
            ApiError::BadRequest { message } => message.clone(),
            ApiError::Store(e) => e.user_message(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::Store(e) => e.error_code(),
        }
    }
}

impl_into_response!(ApiError);

impl ApiError {
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest { message: message.into() }
    }
}

pub mod store;

pub use store::StoreError;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn store_errors_map_to_statuses() {
        let cases = [
            (StoreError::Connection { message: "refused".into() }, StatusCode::SERVICE_UNAVAILABLE),
            (StoreError::Rejected { message: "bad doc".into() }, StatusCode::BAD_REQUEST),
            (StoreError::Query { message: "boom".into() }, StatusCode::INTERNAL_SERVER_ERROR),
            (StoreError::Unrepresentable { reason: "binary".into() }, StatusCode::INTERNAL_SERVER_ERROR),
            (StoreError::NotImplemented { operation: "delete" }, StatusCode::NOT_IMPLEMENTED),
        ];

        for (error, expected) in cases {
            let api: ApiError = error.into();
            assert_eq!(api.status_code(), expected);
            assert_eq!(api.into_response().status(), expected);
        }
    }

    #[test]
    fn internal_details_are_not_shown_to_users() {
        let error = ApiError::from(StoreError::Query { message: "secret topology".into() });
        assert!(!error.user_message().contains("secret"));
    }

    #[test]
    fn user_messages_are_escaped() {
        assert_eq!(escape_html("<b>\"x\" & y</b>"), "&lt;b&gt;&quot;x&quot; &amp; y&lt;/b&gt;");
    }
}
