//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `FRAMEPOST_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `FRAMEPOST_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `FRAMEPOST_META__PAGE_ID=123` sets the `meta.page_id` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use framepost::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! The whole struct is built once at startup and injected into the components
//! that need it; nothing reads environment state after this point.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "FRAMEPOST_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Base URL under which this instance is publicly reachable. Used to turn
    /// stored media paths into URLs the platforms can fetch.
    pub public_base_url: Url,
    /// Special case: captures a raw DATABASE_URL environment override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Media library configuration
    pub media: MediaConfig,
    /// Brand overlay configuration
    pub branding: BrandingConfig,
    /// Publishing workflow configuration
    pub posting: PostingConfig,
    /// Meta (Facebook / Instagram) Graph API credentials
    pub meta: MetaConfig,
    /// Twitter/X credentials, recognized for the stubbed integration
    pub twitter: TwitterConfig,
}

/// Database connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite connection string; the file is created if missing
    pub url: String,
}

/// Media library settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaConfig {
    /// Directory holding uploaded media, created at startup if absent.
    /// Stored paths are expressed relative to this directory's parent.
    pub upload_dir: PathBuf,
    /// Maximum accepted upload body size in bytes
    pub max_upload_bytes: usize,
}

/// Brand overlay settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrandingConfig {
    /// Text stamped onto every published image
    pub text: String,
    /// Preferred TrueType font resource. When it cannot be loaded the
    /// built-in glyph renderer is used instead; this is never fatal.
    pub font_path: PathBuf,
}

/// Publishing workflow settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostingConfig {
    /// Caption used when the submitted prompt is empty after trimming
    pub default_caption: String,
    /// What to do with platform names that have no real integration
    pub unsupported_platforms: UnsupportedPlatformPolicy,
    /// Timeout for outbound publish calls
    #[serde(with = "humantime_serde")]
    pub http_timeout: Duration,
}

/// Policy for platform names outside the supported set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedPlatformPolicy {
    /// Record the attempt as failed, naming the unknown platform
    Error,
    /// Record the attempt as posted without a remote call or remote id.
    /// This mirrors the tolerant behavior earlier deployments relied on.
    Skip,
}

/// Meta platform family (Facebook / Instagram) settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetaConfig {
    /// Page access token used for both Facebook and Instagram publishing
    pub page_access_token: Option<String>,
    /// Facebook Page identifier
    pub page_id: Option<String>,
    /// Instagram Business account identifier
    pub ig_user_id: Option<String>,
    /// Graph API base URL. Points at the live API by default; tests aim it at
    /// a local mock server.
    pub graph_base_url: Url,
}

/// Twitter/X credential set. The integration is simulated, but the keys are
/// recognized so a real integration can pick them up without config changes.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TwitterConfig {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub access_token: Option<String>,
    pub access_secret: Option<String>,
    pub bearer_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            public_base_url: Url::parse("http://localhost:8000").unwrap(),
            database_url: None,
            database: DatabaseConfig::default(),
            media: MediaConfig::default(),
            branding: BrandingConfig::default(),
            posting: PostingConfig::default(),
            meta: MetaConfig::default(),
            twitter: TwitterConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://framepost.db".to_string(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            text: "Framepost".to_string(),
            font_path: PathBuf::from("arial.ttf"),
        }
    }
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            default_caption: "New post from Framepost ✨".to_string(),
            unsupported_platforms: UnsupportedPlatformPolicy::Error,
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            page_access_token: None,
            page_id: None,
            ig_user_id: None,
            graph_base_url: Url::parse("https://graph.facebook.com/v20.0").unwrap(),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // if DATABASE_URL is set, it wins over the database section
        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.port == 0 {
            return Err(Error::Internal {
                operation: "Config validation: port must be non-zero".to_string(),
            });
        }

        if self.media.upload_dir.as_os_str().is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: media.upload_dir cannot be empty".to_string(),
            });
        }

        if self.branding.text.trim().is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: branding.text cannot be empty".to_string(),
            });
        }

        if self.posting.default_caption.trim().is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: posting.default_caption cannot be empty".to_string(),
            });
        }

        // Platform credentials are deliberately not validated here: a missing
        // token surfaces when that platform is actually attempted, recorded on
        // the post row rather than blocking startup.
        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("FRAMEPOST_").split("__"))
            // Common DATABASE_URL pattern
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
