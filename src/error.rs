use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// ApiError
///
/// The full error taxonomy surfaced by the HTTP layer. Every handler returns
/// `Result<_, ApiError>`, and this type owns the mapping to status codes and
/// the `{ "error": ... }` JSON body shape consumed by the frontend.
///
/// Unexpected storage/runtime failures are collapsed into `Internal` at the
/// handler boundary: the underlying error is logged, never leaked to the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No session, or an invalid/expired token. 401.
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated, but the role or department scope forbids the action. 403.
    #[error("forbidden")]
    Forbidden,

    /// Malformed input, reported with a field-level message. 400.
    #[error("{field} {message}")]
    Validation { field: &'static str, message: &'static str },

    /// Referenced record missing, or outside the caller's visibility scope. 404.
    #[error("not found")]
    NotFound,

    /// Illegal status transition on a terminal record, or a lost write race. 409.
    #[error("{0}")]
    Conflict(&'static str),

    /// Anything unexpected from the storage collaborator. 500, detail withheld.
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn validation(field: &'static str, message: &'static str) -> Self {
        ApiError::Validation { field, message }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::Validation { field, message } => json!({
                "error": format!("{field} {message}"),
                "field": field,
            }),
            other => json!({ "error": other.to_string() }),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            other => {
                tracing::error!("database error: {:?}", other);
                ApiError::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::validation("title", "must not be empty").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Conflict("request already resolved").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_error_body_leaks_no_detail() {
        let err: ApiError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, ApiError::Internal));
        assert_eq!(err.to_string(), "internal server error");
    }
}
