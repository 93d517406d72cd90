//! Media handling: the upload store and the brand overlay renderer.
//!
//! All paths handed to callers (and persisted alongside posts) are relative
//! to the parent of the upload directory and always use forward slashes, so
//! they can be appended directly to the public base URL.

pub mod branding;
mod glyphs;
pub mod store;

pub use branding::BrandOverlay;
pub use store::MediaStore;
