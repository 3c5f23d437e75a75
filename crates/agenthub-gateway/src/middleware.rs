use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;

use crate::state::AppState;

/// Extractor enforcing the optional gateway API token.
///
/// With no token configured every request passes. With a token set,
/// requests must carry `Authorization: Bearer <token>`; the health
/// probe and any handler that omits this extractor stay open.
pub struct Authenticated;

impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = StatusCode;

    fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let authorized = match &state.config.token {
            None => true,
            Some(expected) => parts
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(|presented| presented == expected)
                .unwrap_or(false),
        };

        async move {
            if authorized {
                Ok(Authenticated)
            } else {
                Err(StatusCode::UNAUTHORIZED)
            }
        }
    }
}
