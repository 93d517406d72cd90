//! Base repository trait for database operations.

use crate::db::errors::Result;

/// Base repository trait providing the operations the ledgers share.
///
/// A repository is a data access layer for one table, generic over its create
/// request and response types. Both ledgers here are append-only with
/// newest-first listing, so the shared surface is deliberately small;
/// entity-specific transitions (e.g. marking a post published) live on the
/// concrete repositories.
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating entities
    type CreateRequest;

    /// The response/DTO type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// Create a new entity
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get an entity by ID
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// List the most recent entities, newest first
    async fn recent(&mut self, limit: i64) -> Result<Vec<Self::Response>>;
}
