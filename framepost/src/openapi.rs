//! OpenAPI documentation configuration.
//!
//! One document covers the whole HTTP surface: media library, the
//! create-and-post operation, the post ledger, and lead capture. Served
//! interactively at `/docs`.

use utoipa::OpenApi;

use crate::api;
use crate::db::models::{leads::Lead, posts::PostStatus};
use crate::publish::orchestrator::{PostOutcome, PublishReport};

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::media::upload_media,
        api::handlers::media::list_media,
        api::handlers::posts::create_and_post,
        api::handlers::posts::list_posts,
        api::handlers::leads::save_lead,
        api::handlers::leads::list_leads,
    ),
    components(
        schemas(
            api::models::media::UploadResponse,
            api::models::media::MediaListResponse,
            api::models::posts::CreateAndPostForm,
            api::models::posts::PostSummary,
            api::models::posts::PostsResponse,
            api::models::leads::LeadPayload,
            api::models::leads::LeadResponse,
            api::models::leads::LeadsResponse,
            PublishReport,
            PostOutcome,
            PostStatus,
            Lead,
        )
    ),
    tags(
        (name = "media", description = "Upload images into the media library and list what is stored.

The newest upload is the one `create_and_post` brands and publishes."),
        (name = "posts", description = "Publish the newest upload to social platforms and inspect the ledger.

Each requested platform gets its own ledger row and its own outcome; one platform failing never
blocks the others."),
        (name = "leads", description = "Capture contact-form submissions and list them for follow-up."),
    ),
    info(
        title = "Framepost API",
        version = "1.0.0",
        description = "Media branding and social publishing service.

## Workflow

1. `POST /upload` an image into the media library.
2. `POST /create_and_post` with a caption and a comma-separated platform list. The newest
   upload is stamped with the brand overlay and published to each platform (or recorded
   as scheduled when `scheduled_time` is set).
3. `GET /posts` to see per-platform results.

## Errors

Error responses carry a JSON body with a single `error` field:

```json
{
  \"error\": \"No media found. Please upload an image first.\"
}
```

Per-platform publish failures are not HTTP errors: `create_and_post` returns 200 with the
failure recorded in that platform's outcome.",
    ),
)]
pub struct ApiDoc;
