//! One create-and-post cycle: pick the newest upload, brand it once, then
//! record and publish a post per requested platform.
//!
//! Platform outcomes are independent. A platform that fails to publish gets
//! its row moved to `error` and the loop continues; only storage problems
//! abort the cycle.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::config::{PostingConfig, UnsupportedPlatformPolicy};
use crate::db::errors::DbError;
use crate::db::handlers::{Posts, Repository};
use crate::db::models::posts::{NewPost, PostStatus};
use crate::errors::{Error, Result};
use crate::media::{BrandOverlay, MediaStore};
use crate::publish::platform::Platform;
use crate::publish::publisher::{PublishFailure, PublishSuccess, Publisher};
use crate::types::PostId;

/// Outcome of one platform within a cycle.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PostOutcome {
    pub post_id: PostId,
    pub platform: String,
    pub status: PostStatus,
    /// Effective schedule. Null when the post went out immediately,
    /// including when the submitted schedule could not be parsed.
    pub scheduled_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate returned to the caller of a create-and-post cycle.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublishReport {
    /// Store-relative path of the source upload
    pub media: String,
    /// Store-relative path of the branded copy shared by all platforms
    pub branded: String,
    pub posts: Vec<PostOutcome>,
}

/// Runs create-and-post cycles. Cheap to clone; all components are shared
/// handles.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    db: SqlitePool,
    store: MediaStore,
    overlay: BrandOverlay,
    publisher: Publisher,
    posting: PostingConfig,
}

impl Orchestrator {
    pub fn new(
        db: SqlitePool,
        store: MediaStore,
        overlay: BrandOverlay,
        publisher: Publisher,
        posting: PostingConfig,
    ) -> Self {
        Self {
            db,
            store,
            overlay,
            publisher,
            posting,
        }
    }

    /// Runs one cycle and reports every platform's outcome.
    ///
    /// With no media uploaded yet this fails the precondition before any row
    /// is written. An unparsable `scheduled_time` downgrades to immediate
    /// publishing rather than rejecting the request.
    #[instrument(skip(self, prompt), fields(platforms = platforms.len()), err)]
    pub async fn create_and_post(
        &self,
        prompt: &str,
        platforms: &[Platform],
        scheduled_time: Option<&str>,
    ) -> Result<PublishReport> {
        let media = self
            .store
            .latest_upload()
            .await?
            .ok_or_else(|| Error::Precondition {
                message: "No media found. Please upload an image first.".to_string(),
            })?;

        let overlay = self.overlay.clone();
        let source = media.clone();
        let branded = tokio::task::spawn_blocking(move || overlay.apply(&source))
            .await
            .map_err(|e| Error::Internal {
                operation: format!("spawn brand overlay task: {e}"),
            })??;

        let caption = match prompt.trim() {
            "" => self.posting.default_caption.clone(),
            trimmed => trimmed.to_string(),
        };
        let schedule = scheduled_time.and_then(parse_schedule);
        if scheduled_time.is_some() && schedule.is_none() {
            warn!(
                submitted = scheduled_time,
                "Ignoring unparsable schedule, publishing immediately"
            );
        }

        let mut outcomes = Vec::with_capacity(platforms.len());
        for platform in platforms {
            let outcome = self
                .run_platform(platform, &media, &branded, &caption, schedule)
                .await?;
            outcomes.push(outcome);
        }
        info!(
            media,
            branded,
            posts = outcomes.len(),
            "Create-and-post cycle finished"
        );

        Ok(PublishReport {
            media,
            branded,
            posts: outcomes,
        })
    }

    /// Creates the ledger row for one platform and, for immediate posts,
    /// publishes and records the outcome on it.
    async fn run_platform(
        &self,
        platform: &Platform,
        media: &str,
        branded: &str,
        caption: &str,
        schedule: Option<DateTime<Utc>>,
    ) -> Result<PostOutcome> {
        let status = if schedule.is_some() {
            PostStatus::Scheduled
        } else {
            PostStatus::Posting
        };
        let request = NewPost {
            platform: platform.as_str().to_string(),
            caption: caption.to_string(),
            status,
            scheduled_time: schedule,
            media_path: media.to_string(),
            branded_path: branded.to_string(),
        };

        let mut conn = self.db.acquire().await.map_err(DbError::from)?;
        let post = Posts::new(&mut conn).create(&request).await?;

        if schedule.is_some() {
            info!(post_id = post.id, platform = %platform, "Post scheduled");
            return Ok(PostOutcome {
                post_id: post.id,
                platform: post.platform,
                status: PostStatus::Scheduled,
                scheduled_time: schedule,
                error: None,
            });
        }

        let result = match platform {
            Platform::Unsupported(name) => match self.posting.unsupported_platforms {
                UnsupportedPlatformPolicy::Error => Err(PublishFailure::new(format!(
                    "Unsupported platform '{name}'"
                ))),
                UnsupportedPlatformPolicy::Skip => Ok(PublishSuccess {
                    platform_post_id: None,
                }),
            },
            supported => self.publisher.publish(supported, branded, caption).await,
        };

        match result {
            Ok(success) => {
                let post = Posts::new(&mut conn)
                    .mark_posted(post.id, Utc::now(), success.platform_post_id.as_deref())
                    .await?;
                Ok(PostOutcome {
                    post_id: post.id,
                    platform: post.platform,
                    status: PostStatus::Posted,
                    scheduled_time: None,
                    error: None,
                })
            }
            Err(failure) => {
                warn!(post_id = post.id, platform = %platform, error = %failure, "Publish failed");
                let post = Posts::new(&mut conn)
                    .mark_error(post.id, &failure.message)
                    .await?;
                Ok(PostOutcome {
                    post_id: post.id,
                    platform: post.platform,
                    status: PostStatus::Error,
                    scheduled_time: None,
                    error: Some(failure.message),
                })
            }
        }
    }
}

/// Parses a submitted schedule. Accepts RFC 3339, or a naive
/// `YYYY-MM-DD[THH:MM[:SS[.ffffff]]]` (space separator also accepted)
/// taken as UTC. Anything else reads as "not scheduled".
fn parse_schedule(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BrandingConfig, Config};
    use chrono::TimeZone;
    use std::io::Cursor;
    use std::path::Path;
    use tempfile::TempDir;
    use url::Url;
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_schedule_accepts_iso_variants() {
        let utc = Utc.with_ymd_and_hms(2030, 1, 2, 10, 30, 0).unwrap();
        assert_eq!(parse_schedule("2030-01-02T10:30:00Z"), Some(utc));
        assert_eq!(parse_schedule("2030-01-02T12:30:00+02:00"), Some(utc));
        assert_eq!(parse_schedule("2030-01-02T10:30:00"), Some(utc));
        assert_eq!(parse_schedule("2030-01-02T10:30"), Some(utc));
        assert_eq!(parse_schedule("2030-01-02 10:30"), Some(utc));
        assert_eq!(
            parse_schedule("2030-01-02"),
            Some(Utc.with_ymd_and_hms(2030, 1, 2, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_schedule_rejects_garbage() {
        assert_eq!(parse_schedule(""), None);
        assert_eq!(parse_schedule("  "), None);
        assert_eq!(parse_schedule("tomorrow"), None);
        assert_eq!(parse_schedule("2030-13-40T99:99"), None);
    }

    /// Writes a small PNG into the store so there is something to publish.
    async fn seed_upload(store: &MediaStore) {
        let img = image::RgbImage::from_fn(64, 48, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        store.save_upload("photo.png", &bytes).await.unwrap();
    }

    fn test_orchestrator(
        pool: SqlitePool,
        root: &Path,
        graph_url: &str,
        policy: UnsupportedPlatformPolicy,
    ) -> Orchestrator {
        crate::test_utils::install_test_crypto_provider();
        let mut config = Config::default();
        config.meta.page_access_token = Some("token".to_string());
        config.meta.page_id = Some("789".to_string());
        config.meta.ig_user_id = Some("456".to_string());
        config.meta.graph_base_url = Url::parse(graph_url).unwrap();
        config.posting.unsupported_platforms = policy;

        let store = MediaStore::new(root.join("uploads"));
        let overlay = BrandOverlay::new(
            &BrandingConfig {
                text: "Framepost".to_string(),
                font_path: root.join("missing.ttf"),
            },
            root.to_path_buf(),
        );
        let publisher = Publisher::new(&config).unwrap();
        Orchestrator::new(pool, store, overlay, publisher, config.posting)
    }

    async fn stored_posts(pool: &SqlitePool) -> Vec<crate::db::models::posts::Post> {
        let mut conn = pool.acquire().await.unwrap();
        Posts::new(&mut conn).recent(50).await.unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_no_media_fails_precondition_with_no_rows(pool: SqlitePool) {
        let dir = TempDir::new().unwrap();
        let orchestrator = test_orchestrator(
            pool.clone(),
            dir.path(),
            "http://127.0.0.1:9",
            UnsupportedPlatformPolicy::Error,
        );

        let err = orchestrator
            .create_and_post("hi", &[Platform::Twitter], None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Precondition { .. }));
        assert!(stored_posts(&pool).await.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_platform_outcomes_are_independent(pool: SqlitePool) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(url_path("/789/photos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "987"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(url_path("/456/media"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .expect(1)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let orchestrator = test_orchestrator(
            pool.clone(),
            dir.path(),
            &server.uri(),
            UnsupportedPlatformPolicy::Error,
        );
        seed_upload(&orchestrator.store).await;

        let report = orchestrator
            .create_and_post("big launch", &[Platform::Facebook, Platform::Instagram], None)
            .await
            .unwrap();

        assert_eq!(report.media, "uploads/photo.png");
        assert_eq!(report.branded, "uploads/photo_branded.png");
        assert_eq!(report.posts.len(), 2);
        assert_eq!(report.posts[0].platform, "facebook");
        assert_eq!(report.posts[0].status, PostStatus::Posted);
        assert_eq!(report.posts[1].platform, "instagram");
        assert_eq!(report.posts[1].status, PostStatus::Error);
        assert!(
            report.posts[1]
                .error
                .as_deref()
                .unwrap()
                .starts_with("Instagram create media error: 500")
        );

        let rows = stored_posts(&pool).await;
        assert_eq!(rows.len(), 2);
        let facebook = rows.iter().find(|p| p.platform == "facebook").unwrap();
        assert_eq!(facebook.status, PostStatus::Posted);
        assert_eq!(facebook.platform_post_id.as_deref(), Some("987"));
        assert!(facebook.posted_at.is_some());
        assert_eq!(facebook.caption, "big launch");
        let instagram = rows.iter().find(|p| p.platform == "instagram").unwrap();
        assert_eq!(instagram.status, PostStatus::Error);
        assert!(instagram.error.is_some());
        assert!(instagram.posted_at.is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_scheduled_posts_never_hit_the_network(pool: SqlitePool) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let orchestrator = test_orchestrator(
            pool.clone(),
            dir.path(),
            &server.uri(),
            UnsupportedPlatformPolicy::Error,
        );
        seed_upload(&orchestrator.store).await;

        let report = orchestrator
            .create_and_post(
                "later",
                &[Platform::Facebook, Platform::Instagram],
                Some("2030-01-02T10:30:00"),
            )
            .await
            .unwrap();

        let expected = Utc.with_ymd_and_hms(2030, 1, 2, 10, 30, 0).unwrap();
        for outcome in &report.posts {
            assert_eq!(outcome.status, PostStatus::Scheduled);
            assert_eq!(outcome.scheduled_time, Some(expected));
            assert!(outcome.error.is_none());
        }
        for row in stored_posts(&pool).await {
            assert_eq!(row.status, PostStatus::Scheduled);
            assert_eq!(row.scheduled_time, Some(expected));
            assert!(row.posted_at.is_none());
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_unparsable_schedule_publishes_immediately(pool: SqlitePool) {
        let dir = TempDir::new().unwrap();
        let orchestrator = test_orchestrator(
            pool.clone(),
            dir.path(),
            "http://127.0.0.1:9",
            UnsupportedPlatformPolicy::Error,
        );
        seed_upload(&orchestrator.store).await;

        let report = orchestrator
            .create_and_post("now-ish", &[Platform::Twitter], Some("not-a-date"))
            .await
            .unwrap();

        assert_eq!(report.posts[0].status, PostStatus::Posted);
        assert_eq!(report.posts[0].scheduled_time, None);
        let rows = stored_posts(&pool).await;
        assert_eq!(rows[0].scheduled_time, None);
        assert!(rows[0].posted_at.is_some());
        // Simulated publish carries no remote id.
        assert_eq!(rows[0].platform_post_id, None);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_blank_prompt_uses_default_caption(pool: SqlitePool) {
        let dir = TempDir::new().unwrap();
        let orchestrator = test_orchestrator(
            pool.clone(),
            dir.path(),
            "http://127.0.0.1:9",
            UnsupportedPlatformPolicy::Error,
        );
        seed_upload(&orchestrator.store).await;
        let default_caption = orchestrator.posting.default_caption.clone();

        orchestrator
            .create_and_post("   ", &[Platform::Twitter], None)
            .await
            .unwrap();

        let rows = stored_posts(&pool).await;
        assert_eq!(rows[0].caption, default_caption);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_unsupported_platform_error_policy(pool: SqlitePool) {
        let dir = TempDir::new().unwrap();
        let orchestrator = test_orchestrator(
            pool.clone(),
            dir.path(),
            "http://127.0.0.1:9",
            UnsupportedPlatformPolicy::Error,
        );
        seed_upload(&orchestrator.store).await;

        let report = orchestrator
            .create_and_post(
                "hi",
                &[Platform::Unsupported("tiktok".to_string())],
                None,
            )
            .await
            .unwrap();

        assert_eq!(report.posts[0].status, PostStatus::Error);
        assert_eq!(
            report.posts[0].error.as_deref(),
            Some("Unsupported platform 'tiktok'")
        );
        let rows = stored_posts(&pool).await;
        assert_eq!(rows[0].platform, "tiktok");
        assert_eq!(rows[0].status, PostStatus::Error);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_unsupported_platform_skip_policy(pool: SqlitePool) {
        let dir = TempDir::new().unwrap();
        let orchestrator = test_orchestrator(
            pool.clone(),
            dir.path(),
            "http://127.0.0.1:9",
            UnsupportedPlatformPolicy::Skip,
        );
        seed_upload(&orchestrator.store).await;

        let report = orchestrator
            .create_and_post(
                "hi",
                &[Platform::Unsupported("tiktok".to_string())],
                None,
            )
            .await
            .unwrap();

        assert_eq!(report.posts[0].status, PostStatus::Posted);
        assert!(report.posts[0].error.is_none());
        let rows = stored_posts(&pool).await;
        assert_eq!(rows[0].status, PostStatus::Posted);
        assert_eq!(rows[0].platform_post_id, None);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_empty_platform_list_creates_no_rows(pool: SqlitePool) {
        let dir = TempDir::new().unwrap();
        let orchestrator = test_orchestrator(
            pool.clone(),
            dir.path(),
            "http://127.0.0.1:9",
            UnsupportedPlatformPolicy::Error,
        );
        seed_upload(&orchestrator.store).await;

        let report = orchestrator.create_and_post("hi", &[], None).await.unwrap();

        assert!(report.posts.is_empty());
        assert_eq!(report.branded, "uploads/photo_branded.png");
        assert!(stored_posts(&pool).await.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_branded_path_is_shared_across_platforms(pool: SqlitePool) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(url_path("/789/photos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "1"})))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let orchestrator = test_orchestrator(
            pool.clone(),
            dir.path(),
            &server.uri(),
            UnsupportedPlatformPolicy::Error,
        );
        seed_upload(&orchestrator.store).await;

        let report = orchestrator
            .create_and_post("hi", &[Platform::Facebook, Platform::Twitter], None)
            .await
            .unwrap();

        for row in stored_posts(&pool).await {
            assert_eq!(row.media_path.as_deref(), Some("uploads/photo.png"));
            assert_eq!(row.branded_path.as_deref(), Some(report.branded.as_str()));
        }
    }
}
