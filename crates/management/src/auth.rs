//! Requesting-user extraction.
//!
//! Session handling lives in the CRM's auth layer in front of this service;
//! it forwards the authenticated user id in the `x-user-id` header.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;

use crate::models::{ApiError, ErrorResponse};

pub const USER_HEADER: &str = "x-user-id";

/// The authenticated user a request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestingUser(pub String);

impl RequestingUser {
    pub fn id(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestingUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| RequestingUser(v.to_string()))
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse {
                        error: "missing_auth".to_string(),
                        message: format!("{USER_HEADER} header required"),
                    }),
                )
            })
    }
}
