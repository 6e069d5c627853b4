//! Shared-secret authentication.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::error::ApiError;
use crate::server::SharedState;

/// Header naming the acting user.
pub const USER_HEADER: &str = "x-hearth-user";

/// User assumed when a request does not name one.
pub const ANONYMOUS: &str = "anonymous";

/// An authenticated caller. Extracting it rejects requests without the secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user: String,
}

#[async_trait]
impl FromRequestParts<SharedState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        if !is_authorized(&parts.headers, &state.secret) {
            debug!(path = %parts.uri.path(), "Rejected request without valid secret");
            return Err(ApiError::Unauthorized);
        }

        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .unwrap_or(ANONYMOUS)
            .to_string();
        Ok(Caller { user })
    }
}

/// Accepts `Bearer <secret>` or the bare secret.
pub fn is_authorized(headers: &HeaderMap, secret: &str) -> bool {
    let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let token = value.strip_prefix("Bearer ").unwrap_or(value);
    !secret.is_empty() && token == secret
}
