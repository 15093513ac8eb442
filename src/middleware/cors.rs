//! CORS middleware

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;

use super::actor::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};

/// Permissive CORS when no origin is configured (development), otherwise
/// restricted to the configured origins.
pub fn cors_middleware(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("authorization"),
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
            HeaderName::from_static(ACTOR_ID_HEADER),
            HeaderName::from_static(ACTOR_ROLE_HEADER),
        ])
        .max_age(std::time::Duration::from_secs(3600))
}
