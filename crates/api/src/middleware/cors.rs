use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// CORS for the public query API and asset URLs. Dashboard calls are
/// same-origin and authenticate with a cookie or bearer token.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}
