//! Caller extraction
//!
//! Identity is verified upstream and forwarded in the `x-user-id` header;
//! the user row supplies role and hospital.

use super::error::ApiError;
use crate::app::AppState;
use crate::services::Caller;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor resolving the request's [`Caller`]
pub struct CurrentCaller(pub Caller);

#[async_trait]
impl FromRequestParts<AppState> for CurrentCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", USER_ID_HEADER)))?;

        let caller = state.tenant.caller(user_id).await?;
        Ok(CurrentCaller(caller))
    }
}
