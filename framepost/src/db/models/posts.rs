//! Row models for the publish ledger.

use crate::types::PostId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Lifecycle state of a publish attempt.
///
/// Rows are created with their state already decided: `scheduled` when a
/// valid schedule time was supplied, `posting` otherwise. Only
/// `posting -> posted` and `posting -> error` transitions happen afterwards;
/// nothing in-process promotes `scheduled` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Persisted intent for a future time
    Scheduled,
    /// Immediate publish in flight, outcome not yet recorded
    Posting,
    /// Publish succeeded
    Posted,
    /// Publish failed; the `error` column carries the detail
    Error,
}

/// One publish attempt against one platform.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Post {
    /// Unique identifier for the attempt
    pub id: PostId,
    /// Target platform name, lowercased
    pub platform: String,
    /// Caption sent (or to be sent) with the media
    pub caption: String,
    /// Current lifecycle state
    pub status: PostStatus,
    /// Requested publish time, when the caller scheduled the post
    pub scheduled_time: Option<DateTime<Utc>>,
    /// When the publish succeeded
    pub posted_at: Option<DateTime<Utc>>,
    /// Remote identifier assigned by the platform, set only on success
    pub platform_post_id: Option<String>,
    /// Failure detail, set only when status is `error`
    pub error: Option<String>,
    /// Original media, relative to the media root
    pub media_path: Option<String>,
    /// Branded derivative actually published
    pub branded_path: Option<String>,
}

/// Insert request for a new ledger row.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub platform: String,
    pub caption: String,
    pub status: PostStatus,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub media_path: String,
    pub branded_path: String,
}
