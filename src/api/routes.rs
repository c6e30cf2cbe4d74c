//! API Routes
//!
//! Configures the Axum router with all aggregation endpoints.

use axum::{
    http::Method,
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{health_handler, posts_handler, users_handler, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /users` - Top five users by post count
/// - `GET /posts` - Popular or latest posts
/// - `GET /test` - Liveness check
///
/// # Middleware
/// - CORS: Any origin; GET, POST, PUT and DELETE
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/users", get(users_handler))
        .route("/posts", get(posts_handler))
        .route("/test", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
