//! End-to-end tests driving the full application over HTTP: router, handlers,
//! media store, brand overlay, publisher, and database together.

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use sqlx::SqlitePool;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::api::models::posts::PostsResponse;
use crate::db::models::posts::PostStatus;
use crate::test_utils::{
    create_test_app, create_test_app_with_config, create_test_config, test_png_bytes,
};

async fn upload_image(server: &TestServer, filename: &str) {
    let part = Part::bytes(test_png_bytes(320, 240)).file_name(filename);
    let response = server
        .post("/upload")
        .multipart(MultipartForm::new().add_part("file", part))
        .await;
    response.assert_status_ok();
}

/// Full journey: upload an image, publish to Facebook (mocked Graph API) and
/// the simulated Twitter integration, then read the ledger back.
#[sqlx::test(migrations = "./migrations")]
#[test_log::test]
async fn test_e2e_upload_and_publish_flow(pool: SqlitePool) {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/789/photos"))
        .and(body_string_contains("access_token=token"))
        .and(body_string_contains("published=true"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"id": "987", "post_id": "789_987"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.meta.page_access_token = Some("token".to_string());
    config.meta.page_id = Some("789".to_string());
    config.meta.ig_user_id = Some("456".to_string());
    config.meta.graph_base_url = Url::parse(&mock_server.uri()).expect("mock server url");
    let server = create_test_app_with_config(config, pool).await;

    upload_image(&server, "photo.png").await;

    // Uploaded file is listed and served
    let list: Value = server.get("/media/list").await.json();
    assert_eq!(list["files"], serde_json::json!(["photo.png"]));
    server.get("/uploads/photo.png").await.assert_status_ok();

    let response = server
        .post("/create_and_post")
        .form(&[
            ("prompt", "Launch day"),
            ("platforms", "facebook, twitter"),
        ])
        .await;
    response.assert_status_ok();
    let report: Value = response.json();

    assert_eq!(report["media"], "uploads/photo.png");
    assert_eq!(report["branded"], "uploads/photo_branded.png");
    let outcomes = report["posts"].as_array().expect("posts array");
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0]["platform"], "facebook");
    assert_eq!(outcomes[0]["status"], "posted");
    assert_eq!(outcomes[1]["platform"], "twitter");
    assert_eq!(outcomes[1]["status"], "posted");

    // The branded copy is written next to the original and served
    server
        .get("/uploads/photo_branded.png")
        .await
        .assert_status_ok();

    // Ledger has both rows, newest first
    let history: PostsResponse = server.get("/posts").await.json();
    assert!(history.error.is_none());
    assert_eq!(history.posts.len(), 2);
    assert_eq!(history.posts[0].platform, "twitter");
    assert_eq!(history.posts[0].status, PostStatus::Posted);
    assert!(history.posts[0].platform_post_id.is_none());
    assert_eq!(history.posts[1].platform, "facebook");
    assert_eq!(history.posts[1].platform_post_id.as_deref(), Some("987"));
    assert_eq!(history.posts[1].caption, "Launch day");
}

/// A platform failure is reported in the body and on the ledger row, not as an
/// HTTP error.
#[sqlx::test(migrations = "./migrations")]
#[test_log::test]
async fn test_e2e_platform_failure_recorded_in_ledger(pool: SqlitePool) {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/789/photos"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad token"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.meta.page_access_token = Some("token".to_string());
    config.meta.page_id = Some("789".to_string());
    config.meta.graph_base_url = Url::parse(&mock_server.uri()).expect("mock server url");
    let server = create_test_app_with_config(config, pool).await;

    upload_image(&server, "photo.png").await;

    let response = server
        .post("/create_and_post")
        .form(&[("prompt", "Launch day"), ("platforms", "facebook")])
        .await;
    response.assert_status_ok();
    let report: Value = response.json();
    assert_eq!(report["posts"][0]["status"], "error");
    assert_eq!(report["posts"][0]["error"], "Facebook API error: 400, bad token");

    let history: PostsResponse = server.get("/posts").await.json();
    assert_eq!(history.posts.len(), 1);
    assert_eq!(history.posts[0].status, PostStatus::Error);
    assert_eq!(
        history.posts[0].error.as_deref(),
        Some("Facebook API error: 400, bad token")
    );
}

#[sqlx::test(migrations = "./migrations")]
#[test_log::test]
async fn test_e2e_create_and_post_without_media_fails_precondition(pool: SqlitePool) {
    let server = create_test_app(pool).await;

    let response = server
        .post("/create_and_post")
        .form(&[("prompt", "Launch day"), ("platforms", "facebook")])
        .await;
    response.assert_status(StatusCode::PRECONDITION_FAILED);
    let body: Value = response.json();
    assert_eq!(body["error"], "No media found. Please upload an image first.");

    // Nothing was recorded
    let history: PostsResponse = server.get("/posts").await.json();
    assert!(history.posts.is_empty());
}

/// A scheduled request records the rows and publishes nothing. The Graph API
/// base URL points at an unroutable address, so any publish attempt would
/// surface as an `error` row.
#[sqlx::test(migrations = "./migrations")]
#[test_log::test]
async fn test_e2e_scheduled_post_recorded_not_published(pool: SqlitePool) {
    let mut config = create_test_config();
    config.meta.page_access_token = Some("token".to_string());
    config.meta.page_id = Some("789".to_string());
    config.meta.graph_base_url = Url::parse("http://127.0.0.1:1").expect("unroutable url");
    let server = create_test_app_with_config(config, pool).await;

    upload_image(&server, "photo.png").await;

    let response = server
        .post("/create_and_post")
        .form(&[
            ("prompt", "Spring collection"),
            ("platforms", "facebook"),
            ("scheduled_time", "2030-01-02T10:30:00"),
        ])
        .await;
    response.assert_status_ok();
    let report: Value = response.json();
    assert_eq!(report["posts"][0]["status"], "scheduled");
    assert_eq!(report["posts"][0]["scheduled_time"], "2030-01-02T10:30:00Z");

    let history: PostsResponse = server.get("/posts").await.json();
    assert_eq!(history.posts.len(), 1);
    assert_eq!(history.posts[0].status, PostStatus::Scheduled);
    assert_eq!(
        history.posts[0].scheduled_time,
        Some(Utc.with_ymd_and_hms(2030, 1, 2, 10, 30, 0).unwrap())
    );
    assert!(history.posts[0].posted_at.is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[test_log::test]
async fn test_e2e_lead_capture_flow(pool: SqlitePool) {
    let server = create_test_app(pool).await;

    let response = server
        .post("/save_lead")
        .json(&serde_json::json!({
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "phone": "+44 20 7946 0000",
            "service": "Content production",
            "message": "Monthly retainer?"
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["lead"]["name"], "Ada Lovelace");
    assert!(body["lead"]["id"].as_i64().unwrap() >= 1);

    // Blank name rejected
    let response = server
        .post("/save_lead")
        .json(&serde_json::json!({"name": "  ", "email": "x@example.com"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Lead name and email are required");

    let leads: Value = server.get("/leads").await.json();
    let leads = leads["leads"].as_array().expect("leads array");
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0]["email"], "ada@example.com");
}

#[sqlx::test(migrations = "./migrations")]
#[test_log::test]
async fn test_e2e_site_and_docs_served(pool: SqlitePool) {
    let server = create_test_app(pool).await;

    let health = server.get("/healthz").await;
    health.assert_status_ok();
    assert_eq!(health.text(), "OK");

    let home = server.get("/").await;
    home.assert_status_ok();
    assert!(home.text().contains("Framepost"));

    let spec = server.get("/api-docs/openapi.json").await;
    spec.assert_status_ok();
    let content = spec.text();
    assert!(content.contains("\"openapi\""));
    assert!(content.contains("Framepost API"));
    assert!(content.contains("/create_and_post"));

    server.get("/docs").await.assert_status_ok();
}
