//! Brand overlay: stamps the configured text onto media before publishing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::{FontVec, PxScale};
use anyhow::Context;
use image::{DynamicImage, ImageReader, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::{instrument, warn};

use crate::config::BrandingConfig;
use crate::errors::{Error, Result};
use crate::media::glyphs;

/// Filename stem suffix marking already-branded media.
pub const BRANDED_SUFFIX: &str = "_branded";

/// Smallest overlay text size in pixels.
const MIN_TEXT_PX: u32 = 24;
/// Text size is the image width divided by this, floored at [`MIN_TEXT_PX`].
const TEXT_PX_DIVISOR: u32 = 30;
/// Distance of the text block from the bottom-right corner.
const MARGIN: u32 = 20;
/// Translucent white, flattened onto the image on save.
const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 200]);

enum FontKind {
    TrueType(FontVec),
    /// Built-in 5x7 bitmap glyphs, used when no font file can be loaded.
    Builtin,
}

/// Renders the brand text onto images. Cheap to clone; the parsed font is
/// shared.
#[derive(Clone)]
pub struct BrandOverlay {
    text: String,
    font: Arc<FontKind>,
    root: PathBuf,
}

impl std::fmt::Debug for BrandOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrandOverlay")
            .field("text", &self.text)
            .field(
                "font",
                match self.font.as_ref() {
                    FontKind::TrueType(_) => &"truetype",
                    FontKind::Builtin => &"builtin",
                },
            )
            .finish()
    }
}

impl BrandOverlay {
    /// Builds the overlay renderer. A font that cannot be read or parsed is
    /// downgraded to the built-in glyphs with a warning; it never fails.
    pub fn new(config: &BrandingConfig, media_root: PathBuf) -> Self {
        let font = match load_font(&config.font_path) {
            Ok(font) => FontKind::TrueType(font),
            Err(e) => {
                warn!(
                    font = %config.font_path.display(),
                    "Using built-in glyphs for the brand overlay: {e:#}"
                );
                FontKind::Builtin
            }
        };
        Self {
            text: config.text.clone(),
            font: Arc::new(font),
            root: media_root,
        }
    }

    /// Brands the image at a store-relative path and returns the branded
    /// file's store-relative path.
    ///
    /// Already-branded inputs (stem ending in `_branded`) are returned
    /// unchanged. The branded copy is written beside the original as
    /// `<stem>_branded<ext>`, flattened to opaque RGB.
    #[instrument(skip(self), err)]
    pub fn apply(&self, relative: &str) -> Result<String> {
        let src = self.root.join(relative);
        if !src.is_file() {
            return Err(Error::NotFound {
                resource: format!("Media file '{relative}'"),
            });
        }
        let stem = src
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::Internal {
                operation: format!("derive branded name for '{relative}'"),
            })?;
        if stem.ends_with(BRANDED_SUFFIX) {
            return Ok(relative.to_string());
        }
        let suffix = src
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let dest = src.with_file_name(format!("{stem}{BRANDED_SUFFIX}{suffix}"));

        let image = ImageReader::open(&src)
            .with_context(|| format!("Failed to open media file {}", src.display()))?
            .with_guessed_format()
            .with_context(|| format!("Failed to sniff media format of {}", src.display()))?
            .decode()
            .with_context(|| format!("Failed to decode media file {}", src.display()))?;
        let mut base = image.into_rgba8();
        let (width, height) = base.dimensions();

        let text_px = (width / TEXT_PX_DIVISOR).max(MIN_TEXT_PX);
        let (text_w, text_h) = self.measure(text_px);
        let x = (width as i64 - text_w as i64 - MARGIN as i64).max(0) as i32;
        let y = (height as i64 - text_h as i64 - MARGIN as i64).max(0) as i32;

        // Draw onto a transparent layer first so the text's alpha blends
        // with the photo instead of replacing pixels outright.
        let mut layer = RgbaImage::new(width, height);
        self.draw(&mut layer, x, y, text_px);
        image::imageops::overlay(&mut base, &layer, 0, 0);

        let flattened = DynamicImage::ImageRgba8(base).into_rgb8();
        flattened
            .save(&dest)
            .with_context(|| format!("Failed to save branded media {}", dest.display()))?;

        let rel = dest.strip_prefix(&self.root).unwrap_or(&dest);
        let parts: Vec<_> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        Ok(parts.join("/"))
    }

    fn measure(&self, text_px: u32) -> (u32, u32) {
        match self.font.as_ref() {
            FontKind::TrueType(font) => {
                text_size(PxScale::from(text_px as f32), font, &self.text)
            }
            FontKind::Builtin => glyphs::text_size(text_px, &self.text),
        }
    }

    fn draw(&self, layer: &mut RgbaImage, x: i32, y: i32, text_px: u32) {
        match self.font.as_ref() {
            FontKind::TrueType(font) => {
                draw_text_mut(
                    layer,
                    TEXT_COLOR,
                    x,
                    y,
                    PxScale::from(text_px as f32),
                    font,
                    &self.text,
                );
            }
            FontKind::Builtin => glyphs::draw_text(layer, TEXT_COLOR, x, y, text_px, &self.text),
        }
    }
}

fn load_font(path: &Path) -> anyhow::Result<FontVec> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read font file {}", path.display()))?;
    FontVec::try_from_vec(bytes)
        .with_context(|| format!("Failed to parse font file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use tempfile::TempDir;

    fn test_overlay(root: &Path) -> BrandOverlay {
        let config = BrandingConfig {
            text: "Framepost".to_string(),
            // Nothing at this path, which exercises the glyph fallback.
            font_path: root.join("missing.ttf"),
        };
        BrandOverlay::new(&config, root.to_path_buf())
    }

    fn create_test_png(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        img.save(path).unwrap();
    }

    #[test]
    fn test_apply_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let overlay = test_overlay(dir.path());

        let err = overlay.apply("uploads/nope.png").unwrap_err();

        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_apply_writes_branded_sibling() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("uploads")).unwrap();
        create_test_png(&dir.path().join("uploads/photo.png"), 320, 240);
        let overlay = test_overlay(dir.path());

        let branded = overlay.apply("uploads/photo.png").unwrap();

        assert_eq!(branded, "uploads/photo_branded.png");
        let out = image::open(dir.path().join("uploads/photo_branded.png"))
            .unwrap()
            .into_rgb8();
        assert_eq!(out.dimensions(), (320, 240));
        // Untouched corner survives the round trip exactly (PNG is lossless).
        assert_eq!(out.get_pixel(0, 0), &image::Rgb([0, 0, 128]));
        // The bottom-right quadrant carries near-white text pixels.
        let stamped = out
            .enumerate_pixels()
            .filter(|(x, y, _)| *x >= 160 && *y >= 120)
            .any(|(_, _, p)| p.0.iter().all(|&c| c > 180));
        assert!(stamped, "expected overlay pixels near the bottom-right");
    }

    #[test]
    fn test_apply_branded_input_short_circuits() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("uploads")).unwrap();
        create_test_png(&dir.path().join("uploads/photo_branded.png"), 64, 64);
        let overlay = test_overlay(dir.path());

        let branded = overlay.apply("uploads/photo_branded.png").unwrap();

        assert_eq!(branded, "uploads/photo_branded.png");
        assert!(!dir.path().join("uploads/photo_branded_branded.png").exists());
    }

    #[test]
    fn test_apply_twice_reuses_branded_name() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("uploads")).unwrap();
        create_test_png(&dir.path().join("uploads/photo.png"), 96, 96);
        let overlay = test_overlay(dir.path());

        let first = overlay.apply("uploads/photo.png").unwrap();
        let second = overlay.apply("uploads/photo.png").unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_tiny_image_clamps_text_origin() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("uploads")).unwrap();
        create_test_png(&dir.path().join("uploads/tiny.png"), 16, 12);
        let overlay = test_overlay(dir.path());

        // Text block is larger than the image; must clip, not panic.
        let branded = overlay.apply("uploads/tiny.png").unwrap();

        assert_eq!(branded, "uploads/tiny_branded.png");
    }
}
