//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, signer, notifier, issuer and dispatcher
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and numeric field parsing
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// When `cors_origin` is given, browsers on that origin may call the API
/// with credentials.
pub fn build_app(services: AppServices, cors_origin: Option<HeaderValue>) -> Router {
    let guard = services.guard.clone();
    let services = Arc::new(services);

    // Protected routes: require a valid session token.
    let protected = routes::protected_router().route_layer(axum::middleware::from_fn_with_state(
        guard,
        middleware::auth_middleware,
    ));

    let app = Router::new()
        .route("/", get(routes::system::root))
        .route("/health", get(routes::system::health))
        .nest("/api/auth", routes::auth::router())
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(services)),
        );

    match cors_origin {
        Some(origin) => app.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_credentials(true)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        ),
        None => app,
    }
}
