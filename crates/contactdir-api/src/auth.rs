use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{digest_token, ApiError, AppState};

/// Bearer-token guard for the `/api` routes.
///
/// Passes every request through when no token is configured. Otherwise the
/// `Authorization: Bearer <token>` header must hash to the configured digest.
pub async fn require_bearer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.token_digest() else {
        return Ok(next.run(req).await);
    };

    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(digest_token);

    match presented {
        Some(digest) if digest == expected => Ok(next.run(req).await),
        Some(_) => {
            warn!(path = %req.uri().path(), "Rejected request with invalid token");
            Err(ApiError::Unauthorized("Invalid token".into()))
        }
        None => Err(ApiError::Unauthorized(
            "Missing or malformed Authorization header".into(),
        )),
    }
}
