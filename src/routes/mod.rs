//! HTTP routes
//!
//! `/api/*` requires an actor (see `middleware::actor`); `/health` does not.

pub mod extract;
pub mod maintenance_routes;
pub mod trip_routes;

use axum::{middleware, routing::get, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::middleware::{actor_middleware, cors_middleware};
use crate::state::AppState;

/// Build the full application router
pub fn create_router(state: AppState) -> Router {
    let cors = cors_middleware(&state.config.cors_origins);

    let api = Router::new()
        .nest("/trips", trip_routes::create_trip_router())
        .nest("/maintenance", maintenance_routes::create_maintenance_router())
        .layer(middleware::from_fn(actor_middleware));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "fleet_ops",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
