//! Wire models for the create-and-post operation and the post ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::posts::{Post, PostStatus};
use crate::types::PostId;

/// Form submitted by the dashboard to publish or schedule content.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAndPostForm {
    /// Caption text; blank falls back to the configured default
    pub prompt: String,
    /// Comma-separated platform names; entries are trimmed and lowercased,
    /// empties dropped
    pub platforms: String,
    /// Optional ISO-8601 publish time; unparsable values mean "post now"
    pub scheduled_time: Option<String>,
}

/// One ledger entry as shown on the dashboard.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostSummary {
    pub id: PostId,
    pub platform: String,
    pub caption: String,
    pub status: PostStatus,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub posted_at: Option<DateTime<Utc>>,
    pub platform_post_id: Option<String>,
    pub error: Option<String>,
}

impl From<Post> for PostSummary {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            platform: post.platform,
            caption: post.caption,
            status: post.status,
            scheduled_time: post.scheduled_time,
            posted_at: post.posted_at,
            platform_post_id: post.platform_post_id,
            error: post.error,
        }
    }
}

/// Post history, newest first.
///
/// The dashboard polls this endpoint, so a storage failure degrades to an
/// empty list with `error` set instead of a 5xx.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostsResponse {
    pub posts: Vec<PostSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
