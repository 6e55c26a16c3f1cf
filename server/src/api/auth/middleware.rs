//! Optional bearer-JWT auth middleware. Disabled entirely when no secret is
//! configured (spec §6).

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::jwt::validate_token;

#[derive(Clone)]
pub struct AuthState {
    pub jwt_secret: Option<String>,
}

/// Request-scoped user id bound from the token's `sub` claim.
#[derive(Debug, Clone)]
pub struct UserId(pub String);

pub async fn require_auth(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(secret) = state.jwt_secret.as_ref() else {
        return next.run(request).await;
    };

    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(token) = token else {
        return unauthorized("missing bearer token");
    };

    match validate_token(token, secret.as_bytes()) {
        Ok(claims) => {
            request.extensions_mut().insert(UserId(claims.sub));
            next.run(request).await
        }
        Err(e) => unauthorized(&e.to_string()),
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
}
