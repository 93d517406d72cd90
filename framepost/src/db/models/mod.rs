//! Database record models matching table schemas.
//!
//! Each struct here corresponds one-to-one to a table row and derives
//! `sqlx::FromRow`. The ledger rows double as their own API representation
//! (the listing endpoints serialize them directly), so there is no separate
//! response type for them.

pub mod leads;
pub mod posts;
