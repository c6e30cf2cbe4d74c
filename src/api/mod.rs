//! API Module
//!
//! HTTP handlers and routing for the aggregation REST API.
//!
//! # Endpoints
//! - `GET /users` - Top five users by post count (cached, stale fallback)
//! - `GET /posts` - Popular or latest posts
//! - `GET /test` - Liveness check

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
