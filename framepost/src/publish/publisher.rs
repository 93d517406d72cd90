//! Platform connectors for the Meta Graph API and the simulated Twitter
//! integration.
//!
//! The publisher reports structured outcomes instead of bubbling transport
//! errors: every failure becomes a [`PublishFailure`] so the orchestrator can
//! record it on the post row and keep going with the next platform. There are
//! no retries; the client timeout is the only resilience affordance.

use anyhow::Context;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::{Config, MetaConfig};
use crate::publish::platform::Platform;

/// A completed publish. Platforms without a usable remote identifier (the
/// simulated Twitter connector, or a 2xx Graph response without an `id`)
/// report `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishSuccess {
    pub platform_post_id: Option<String>,
}

/// A failed publish attempt, in a form ready to store on the post row.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct PublishFailure {
    pub message: String,
}

impl PublishFailure {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type PublishResult = std::result::Result<PublishSuccess, PublishFailure>;

/// Sends branded media to the configured platforms.
#[derive(Debug, Clone)]
pub struct Publisher {
    client: reqwest::Client,
    public_base_url: Url,
    meta: MetaConfig,
}

impl Publisher {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.posting.http_timeout)
            .build()
            .context("Failed to create publishing HTTP client")?;
        Ok(Self {
            client,
            public_base_url: config.public_base_url.clone(),
            meta: config.meta.clone(),
        })
    }

    /// Publicly reachable URL for a store-relative media path. The Graph API
    /// fetches media from here rather than accepting uploads directly.
    pub fn public_url(&self, path: &str) -> String {
        let normalized = path.replace('\\', "/");
        format!(
            "{}/{}",
            self.public_base_url.as_str().trim_end_matches('/'),
            normalized.trim_start_matches('/')
        )
    }

    /// Publishes one image to one platform.
    #[instrument(skip(self, caption), fields(platform = %platform), err)]
    pub async fn publish(
        &self,
        platform: &Platform,
        branded_path: &str,
        caption: &str,
    ) -> PublishResult {
        match platform {
            Platform::Facebook => self.publish_facebook(branded_path, caption).await,
            Platform::Instagram => self.publish_instagram(branded_path, caption).await,
            Platform::Twitter => self.publish_twitter(caption),
            Platform::Unsupported(name) => {
                Err(PublishFailure::new(format!("Unsupported platform '{name}'")))
            }
        }
    }

    /// One form-encoded POST to `/{page_id}/photos`; the page fetches the
    /// image from our public URL.
    async fn publish_facebook(&self, branded_path: &str, caption: &str) -> PublishResult {
        let (token, page_id) = match (&self.meta.page_access_token, &self.meta.page_id) {
            (Some(token), Some(page_id)) => (token.as_str(), page_id.as_str()),
            _ => {
                return Err(PublishFailure::new(
                    "Facebook credentials are not configured: set meta.page_access_token and meta.page_id",
                ));
            }
        };
        let image_url = self.public_url(branded_path);
        let endpoint = format!("{}/{page_id}/photos", self.graph_base());
        let form = [
            ("url", image_url.as_str()),
            ("caption", caption),
            ("published", "true"),
            ("access_token", token),
        ];

        let (status, body) = self.post_form(&endpoint, &form, "Facebook API").await?;
        if !status.is_success() {
            return Err(PublishFailure::new(format!(
                "Facebook API error: {}, {body}",
                status.as_u16()
            )));
        }
        let value = parse_json("Facebook API", &body)?;
        info!(page_id, "Published photo to Facebook");
        Ok(PublishSuccess {
            platform_post_id: remote_id(&value),
        })
    }

    /// Two sequential Graph calls: create a media container, then publish it.
    /// A failed second step leaves the container behind; the Graph API
    /// garbage-collects unpublished containers on its own.
    async fn publish_instagram(&self, branded_path: &str, caption: &str) -> PublishResult {
        let (token, ig_user_id) = match (&self.meta.page_access_token, &self.meta.ig_user_id) {
            (Some(token), Some(ig_user_id)) => (token.as_str(), ig_user_id.as_str()),
            _ => {
                return Err(PublishFailure::new(
                    "Instagram credentials are not configured: set meta.page_access_token and meta.ig_user_id",
                ));
            }
        };
        let image_url = self.public_url(branded_path);
        let create_endpoint = format!("{}/{ig_user_id}/media", self.graph_base());
        let create_form = [
            ("image_url", image_url.as_str()),
            ("caption", caption),
            ("access_token", token),
        ];

        let (status, body) = self
            .post_form(&create_endpoint, &create_form, "Instagram create media")
            .await?;
        if !status.is_success() {
            return Err(PublishFailure::new(format!(
                "Instagram create media error: {}, {body}",
                status.as_u16()
            )));
        }
        let container = parse_json("Instagram create media", &body)?;
        let creation_id = remote_id(&container).ok_or_else(|| {
            PublishFailure::new(format!("Instagram media creation failed: {body}"))
        })?;

        let publish_endpoint = format!("{}/{ig_user_id}/media_publish", self.graph_base());
        let publish_form = [
            ("creation_id", creation_id.as_str()),
            ("access_token", token),
        ];

        let (status, body) = self
            .post_form(&publish_endpoint, &publish_form, "Instagram publish media")
            .await?;
        if !status.is_success() {
            return Err(PublishFailure::new(format!(
                "Instagram publish media error: {}, {body}",
                status.as_u16()
            )));
        }
        let published = parse_json("Instagram publish media", &body)?;
        info!(ig_user_id, "Published media to Instagram");
        Ok(PublishSuccess {
            platform_post_id: remote_id(&published),
        })
    }

    /// The X API v2 media flow needs an approved developer app, so this
    /// connector completes locally without network I/O or credentials.
    fn publish_twitter(&self, caption: &str) -> PublishResult {
        debug!(caption, "Simulating Twitter publish");
        Ok(PublishSuccess {
            platform_post_id: None,
        })
    }

    async fn post_form(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
        label: &str,
    ) -> std::result::Result<(StatusCode, String), PublishFailure> {
        let response = self
            .client
            .post(endpoint)
            .form(form)
            .send()
            .await
            .map_err(|e| PublishFailure::new(format!("{label} request failed: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PublishFailure::new(format!("{label} response could not be read: {e}")))?;
        Ok((status, body))
    }

    fn graph_base(&self) -> &str {
        self.meta.graph_base_url.as_str().trim_end_matches('/')
    }
}

fn parse_json(label: &str, body: &str) -> std::result::Result<Value, PublishFailure> {
    serde_json::from_str(body)
        .map_err(|e| PublishFailure::new(format!("{label} returned invalid JSON: {e}")))
}

fn remote_id(value: &Value) -> Option<String> {
    value
        .get("id")
        .and_then(|id| id.as_str())
        .map(ToString::to_string)
}
