//! Database layer for data persistence and access.
//!
//! SQLx over SQLite, following the repository pattern: API handlers talk to
//! repositories ([`handlers`]), repositories run queries and return record
//! models ([`models`]). Migrations live in `migrations/` and are applied at
//! startup via [`crate::migrator`], which is all the schema management this
//! service needs: the store is a single local file created on first run.
//!
//! # Modules
//!
//! - [`handlers`]: repository implementations (posts, leads)
//! - [`models`]: database record structures matching table schemas
//! - [`errors`]: database-specific error types

pub mod errors;
pub mod handlers;
pub mod models;
