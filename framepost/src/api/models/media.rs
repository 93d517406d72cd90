//! Wire models for media upload and listing.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Confirmation returned after an upload is stored.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Always `"ok"`
    pub status: String,
    /// Name the file was stored under
    pub filename: String,
    /// Store-relative path; resolves under the public base URL
    pub path: String,
}

/// Flat listing of the upload directory.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MediaListResponse {
    pub files: Vec<String>,
}
