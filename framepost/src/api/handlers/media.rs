//! Handlers for media upload and listing.

use axum::{
    Json,
    extract::{Multipart, State},
};
use tracing::{info, instrument};

use crate::AppState;
use crate::api::models::media::{MediaListResponse, UploadResponse};
use crate::errors::{Error, Result};

#[utoipa::path(
    post,
    path = "/upload",
    tag = "media",
    summary = "Upload media",
    description = "Store an image in the media library. The newest upload is the one picked up by create_and_post.",
    request_body(content_type = "multipart/form-data", description = "A `file` part with a filename"),
    responses(
        (status = 200, description = "Upload stored", body = UploadResponse),
        (status = 400, description = "Missing `file` part or unusable filename"),
        (status = 500, description = "Internal server error")
    )
)]
#[instrument(skip_all)]
pub async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(ToString::to_string)
            .ok_or_else(|| Error::BadRequest {
                message: "Upload is missing a filename".to_string(),
            })?;
        let bytes = field.bytes().await.map_err(|e| Error::BadRequest {
            message: format!("Failed to read upload: {e}"),
        })?;

        let saved = state.store.save_upload(&filename, &bytes).await?;
        info!(filename = %saved.filename, size = bytes.len(), "Stored upload");
        return Ok(Json(UploadResponse {
            status: "ok".to_string(),
            filename: saved.filename,
            path: saved.path,
        }));
    }

    Err(Error::BadRequest {
        message: "Multipart field 'file' is required".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/media/list",
    tag = "media",
    summary = "List media",
    responses(
        (status = 200, description = "File names in the media library", body = MediaListResponse),
        (status = 500, description = "Internal server error")
    )
)]
#[instrument(skip_all)]
pub async fn list_media(State(state): State<AppState>) -> Result<Json<MediaListResponse>> {
    let files = state.store.list_uploads().await?;
    Ok(Json(MediaListResponse { files }))
}
