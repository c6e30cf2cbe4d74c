//! Domain and transfer models for the aggregation API
//!
//! This module defines the upstream-facing domain types and the DTOs used for
//! deserializing query strings and serializing HTTP response bodies.

pub mod domain;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use domain::{Post, UserRef, UserSummary};
pub use requests::{PostKind, PostsQuery, UsersQuery, INVALID_TYPE};
pub use responses::{ErrorResponse, PostsResponse, Source, UsersResponse};
