//! Test utilities for integration testing (available with `test-utils` feature).

use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};

use axum_test::TestServer;
use image::{ImageFormat, RgbImage};
use sqlx::SqlitePool;

use crate::config::Config;

static TEST_DIR_SEQ: AtomicU64 = AtomicU64::new(0);

/// Installs the process-wide rustls crypto provider that `main` installs for
/// the binary. reqwest is built with `rustls-no-provider`, so a provider must
/// be in place before any HTTP client is constructed. Safe to call repeatedly;
/// only the first call takes effect.
pub fn install_test_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// Build a config for tests: a fresh media directory per call, localhost bind,
/// short publish timeout. The Graph API base URL still points at the live API;
/// tests that publish override it with a mock server's URL.
pub fn create_test_config() -> Config {
    let seq = TEST_DIR_SEQ.fetch_add(1, Ordering::Relaxed);
    let media_root = std::env::temp_dir().join(format!(
        "framepost-test-media-{}-{seq}",
        std::process::id()
    ));

    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    };
    config.media.upload_dir = media_root.join("uploads");
    config.posting.http_timeout = std::time::Duration::from_secs(2);
    config
}

pub async fn create_test_app(pool: SqlitePool) -> TestServer {
    create_test_app_with_config(create_test_config(), pool).await
}

pub async fn create_test_app_with_config(config: Config, pool: SqlitePool) -> TestServer {
    install_test_crypto_provider();
    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");
    app.into_test_server()
}

/// A small PNG with a deterministic gradient, encoded in memory.
pub fn test_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode test image");
    bytes
}
