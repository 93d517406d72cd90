//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection, opens an explicit transaction for
//! every mutation (committed before returning; dropped-and-rolled-back on any
//! error path), and returns domain models from [`crate::db::models`].
//!
//! ```ignore
//! use framepost::db::handlers::{Posts, Repository};
//!
//! async fn example(pool: &sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut conn = pool.acquire().await?;
//!     let mut posts = Posts::new(&mut conn);
//!     let recent = posts.recent(200).await?;
//!     Ok(())
//! }
//! ```

pub mod leads;
pub mod posts;
pub mod repository;

pub use leads::Leads;
pub use posts::Posts;
pub use repository::Repository;
