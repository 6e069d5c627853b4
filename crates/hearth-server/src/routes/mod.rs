//! Route handlers.

pub mod edit;
pub mod shopping;
pub mod tasks;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use hearth_core::TaskId;
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};

/// JSON request body whose rejections answer with the JSON error contract
/// (400 `{"error": ...}`) instead of axum's plain-text 415/422.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(JsonBody(value))
    }
}

/// Parse a task id from a path segment.
pub(crate) fn parse_task_id(raw: &str) -> ApiResult<TaskId> {
    TaskId::parse(raw).map_err(|_| ApiError::invalid_id())
}
