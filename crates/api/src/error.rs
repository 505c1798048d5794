use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use sobremesa_core::mutation::MutationError;
use sobremesa_core::qr::QrError;
use sobremesa_core::{ContentError, StoreError};

use crate::render::layout;

/// API error type that maps to Sanity-compatible JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_type, message) = match &self {
            ApiError::NotFound(msg) => ("notFound", msg.clone()),
            ApiError::BadRequest(msg) => ("badRequest", msg.clone()),
            ApiError::Unauthorized => ("unauthorized", "Authentication required".to_string()),
            ApiError::Conflict(msg) => ("conflict", msg.clone()),
            ApiError::PayloadTooLarge(msg) => ("payloadTooLarge", msg.clone()),
            ApiError::UnsupportedMediaType(msg) => ("unsupportedMediaType", msg.clone()),
            ApiError::Unavailable(msg) => ("unavailable", msg.clone()),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                ("internalError", "An internal error occurred".to_string())
            }
            ApiError::Database(err) => {
                tracing::error!("Database error: {err}");
                ("internalError", "An internal error occurred".to_string())
            }
        };

        let body = json!({
            "error": {
                "type": error_type,
                "message": message,
                "statusCode": status.as_u16(),
            }
        });

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(_) | StoreError::RevisionMismatch { .. } => ApiError::Conflict(err.to_string()),
            StoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            StoreError::Database(db) => ApiError::Database(db),
        }
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Store(store) => store.into(),
            ContentError::Query(q) => ApiError::BadRequest(q.to_string()),
            ContentError::Validation(v) => ApiError::BadRequest(v.to_string()),
            ContentError::Decode(d) => ApiError::Internal(d.to_string()),
        }
    }
}

impl From<MutationError> for ApiError {
    fn from(err: MutationError) -> Self {
        match err {
            MutationError::Store(store) => store.into(),
            MutationError::Validation(v) => ApiError::BadRequest(v.to_string()),
            MutationError::Patch(p) => ApiError::BadRequest(p.to_string()),
            MutationError::Query(q) => ApiError::BadRequest(q.to_string()),
        }
    }
}

impl From<QrError> for ApiError {
    fn from(err: QrError) -> Self {
        match err {
            QrError::Encode(_) => ApiError::BadRequest(err.to_string()),
            QrError::Image(_) => ApiError::Internal(err.to_string()),
        }
    }
}

/// Convenience type alias for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of a public HTML page.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("page not found")]
    NotFound,
    #[error(transparent)]
    Content(#[from] ContentError),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::NotFound => (StatusCode::NOT_FOUND, Html(layout::error_page(StatusCode::NOT_FOUND))).into_response(),
            PageError::Content(err) => {
                tracing::error!(error = %err, "page render failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(layout::error_page(StatusCode::INTERNAL_SERVER_ERROR)),
                )
                    .into_response()
            }
        }
    }
}

pub type PageResult<T> = Result<T, PageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn api_errors_render_sanity_shape() {
        let response = ApiError::Conflict("stale".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"]["type"], "conflict");
        assert_eq!(value["error"]["statusCode"], 409);
    }

    #[tokio::test]
    async fn internal_details_are_masked() {
        let response = ApiError::Internal("disk on fire".into()).into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("disk on fire"));
    }

    #[test]
    fn revision_mismatch_is_a_conflict() {
        let err: ApiError = StoreError::RevisionMismatch {
            id: "v1".into(),
            expected: "a".into(),
            found: "b".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
