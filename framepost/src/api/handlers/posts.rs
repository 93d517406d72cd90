//! Handlers for the create-and-post operation and the post ledger.

use axum::{
    Form, Json,
    extract::State,
};
use tracing::{error, instrument};

use crate::AppState;
use crate::api::models::posts::{CreateAndPostForm, PostSummary, PostsResponse};
use crate::db::errors::DbError;
use crate::db::handlers::{Posts, Repository};
use crate::errors::Result;
use crate::publish::Platform;
use crate::publish::orchestrator::PublishReport;

/// How much history the dashboard sees.
const POST_HISTORY_LIMIT: i64 = 200;

#[utoipa::path(
    post,
    path = "/create_and_post",
    tag = "posts",
    summary = "Create and post content",
    description = "Brand the newest upload and publish it to each requested platform, or record \
                   scheduled posts for later. Per-platform failures are reported in the body, not \
                   as an HTTP error.",
    request_body(content = CreateAndPostForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Cycle ran; see per-platform outcomes", body = PublishReport),
        (status = 412, description = "No media has been uploaded yet"),
        (status = 500, description = "Internal server error")
    )
)]
#[instrument(skip_all)]
pub async fn create_and_post(
    State(state): State<AppState>,
    Form(form): Form<CreateAndPostForm>,
) -> Result<Json<PublishReport>> {
    let platforms = Platform::parse_list(&form.platforms);
    let report = state
        .orchestrator
        .create_and_post(&form.prompt, &platforms, form.scheduled_time.as_deref())
        .await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/posts",
    tag = "posts",
    summary = "Post history",
    description = "The latest 200 posts, newest first. A storage failure degrades to an empty \
                   list with `error` set so the dashboard keeps rendering.",
    responses(
        (status = 200, description = "Post history", body = PostsResponse)
    )
)]
#[instrument(skip_all)]
pub async fn list_posts(State(state): State<AppState>) -> Json<PostsResponse> {
    match recent_posts(&state).await {
        Ok(posts) => Json(PostsResponse { posts, error: None }),
        Err(e) => {
            error!("Failed to load post history: {e:#}");
            Json(PostsResponse {
                posts: Vec::new(),
                error: Some(format!("Internal Server Error: {e}")),
            })
        }
    }
}

async fn recent_posts(state: &AppState) -> Result<Vec<PostSummary>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let posts = Posts::new(&mut conn).recent(POST_HISTORY_LIMIT).await?;
    Ok(posts.into_iter().map(PostSummary::from).collect())
}
