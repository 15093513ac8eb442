//! HTTP middleware
//!
//! Actor extraction, permission checks and CORS.

pub mod actor;
pub mod cors;

pub use actor::{actor_middleware, require_permission, Permission};
pub use cors::cors_middleware;
