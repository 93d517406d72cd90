//! API request and response models.
//!
//! These are distinct from the database models so the wire contract can
//! evolve independently of storage. Everything here carries `utoipa`
//! annotations for the generated OpenAPI document.

pub mod leads;
pub mod media;
pub mod posts;
