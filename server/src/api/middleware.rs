//! HTTP middleware: a permissive CORS layer and a 404 handler (spec §6).

use axum::http::{Method, StatusCode, header};
use axum::response::IntoResponse;
use tower_http::cors::{Any, CorsLayer};

/// Permits any origin; methods and headers limited to what the admission
/// API actually uses (spec §6).
pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub async fn handle_404() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}
