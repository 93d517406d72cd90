//! HTTP request handlers.
//!
//! - [`media`]: upload storage and listing
//! - [`posts`]: the create-and-post operation and the post ledger
//! - [`leads`]: lead capture and history
//! - [`static_assets`]: embedded site pages served via the router fallback
//!
//! Handlers return [`crate::errors::Error`], which converts to an HTTP status
//! and a `{"error": …}` JSON body. The one deliberate exception is the post
//! history endpoint, which degrades in-band so the dashboard keeps rendering.

pub mod leads;
pub mod media;
pub mod posts;
pub mod static_assets;
