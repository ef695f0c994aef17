use axum::{Router, routing::get};

pub mod auth;
pub mod sweets;
pub mod system;

/// Router for all endpoints behind the bearer-token middleware.
pub fn protected_router() -> Router {
    Router::new()
        .route("/api/whoami", get(system::whoami))
        .nest("/api/sweets", sweets::router())
}
