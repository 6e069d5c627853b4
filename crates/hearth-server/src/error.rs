//! API error classification.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hearth_storage::DbError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_id() -> Self {
        ApiError::BadRequest("Invalid id".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::Core(core) if core.is_validation() => ApiError::BadRequest(core.to_string()),
            DbError::Core(hearth_core::Error::NotFound { entity, id }) => {
                ApiError::NotFound(format!("{} not found: {}", entity, id))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<hearth_core::Error> for ApiError {
    fn from(err: hearth_core::Error) -> Self {
        ApiError::from(DbError::Core(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Internal(detail) => {
                error!("Request failed: {}", detail);
                json!({ "message": "Internal server error" })
            }
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
