//! Common type definitions.
//!
//! Entity IDs are SQLite rowids wrapped in type aliases for readability:
//!
//! - [`PostId`]: publish-ledger row identifier
//! - [`LeadId`]: lead-ledger row identifier

/// Publish ledger row identifier (monotonic, assigned at insert)
pub type PostId = i64;

/// Lead ledger row identifier (monotonic, assigned at insert)
pub type LeadId = i64;
