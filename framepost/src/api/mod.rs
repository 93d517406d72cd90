//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for every endpoint
//! - **[`models`]**: Request/response data structures for the API contract
//!
//! The surface is deliberately flat: media upload and listing, the
//! create-and-post operation, the post ledger, lead capture, and the embedded
//! site pages. All endpoints are documented with `utoipa` annotations and
//! served at `/docs`.

pub mod handlers;
pub mod models;
