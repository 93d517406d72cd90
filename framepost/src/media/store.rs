//! Filesystem-backed store for uploaded media.
//!
//! Files live flat inside the configured upload directory. Relative paths
//! returned by the store keep the directory name as their first component
//! (`uploads/photo.jpg`) so they double as URL paths under the static mount.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Context;
use tracing::instrument;

use crate::errors::{Error, Result};

/// Outcome of [`MediaStore::save_upload`]: the stored name and the relative
/// path the rest of the system refers to it by.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedUpload {
    pub filename: String,
    pub path: String,
}

/// Handle to the upload directory.
#[derive(Debug, Clone)]
pub struct MediaStore {
    upload_dir: PathBuf,
}

impl MediaStore {
    pub fn new(upload_dir: PathBuf) -> Self {
        Self { upload_dir }
    }

    /// Directory uploads are written to.
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Root that relative media paths are resolved against (the parent of the
    /// upload directory).
    pub fn media_root(&self) -> &Path {
        self.upload_dir.parent().unwrap_or(Path::new(""))
    }

    /// Creates the upload directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create upload directory {}",
                    self.upload_dir.display()
                )
            })?;
        Ok(())
    }

    /// Writes an uploaded file under its client-provided name, reduced to its
    /// final path component. An existing file with the same name is
    /// overwritten.
    #[instrument(skip(self, bytes), fields(size = bytes.len()), err)]
    pub async fn save_upload(&self, filename: &str, bytes: &[u8]) -> Result<SavedUpload> {
        let name = sanitize_filename(filename).ok_or_else(|| Error::BadRequest {
            message: format!("Invalid upload filename: {filename:?}"),
        })?;
        self.ensure_dir().await?;
        let dest = self.upload_dir.join(&name);
        tokio::fs::write(&dest, bytes)
            .await
            .with_context(|| format!("Failed to write upload {}", dest.display()))?;
        Ok(SavedUpload {
            path: self.to_relative(&dest),
            filename: name,
        })
    }

    /// Plain-file names currently in the upload directory, non-recursive.
    /// A missing directory reads as empty.
    #[instrument(skip(self), err)]
    pub async fn list_uploads(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.upload_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => {
                return Err(Error::Internal {
                    operation: format!(
                        "read upload directory {}: {e}",
                        self.upload_dir.display()
                    ),
                });
            }
        };
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| "Failed to read upload directory entry")?
        {
            let meta = entry
                .metadata()
                .await
                .with_context(|| format!("Failed to stat {}", entry.path().display()))?;
            if meta.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Relative path of the most recently modified file in the upload
    /// directory, or `None` when there is nothing to publish.
    #[instrument(skip(self), err)]
    pub async fn latest_upload(&self) -> Result<Option<String>> {
        let mut entries = match tokio::fs::read_dir(&self.upload_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Internal {
                    operation: format!(
                        "read upload directory {}: {e}",
                        self.upload_dir.display()
                    ),
                });
            }
        };
        let mut latest: Option<(SystemTime, PathBuf)> = None;
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| "Failed to read upload directory entry")?
        {
            let meta = entry
                .metadata()
                .await
                .with_context(|| format!("Failed to stat {}", entry.path().display()))?;
            if !meta.is_file() {
                continue;
            }
            let modified = meta
                .modified()
                .with_context(|| format!("Failed to read mtime of {}", entry.path().display()))?;
            let newer = match &latest {
                Some((best, _)) => modified > *best,
                None => true,
            };
            if newer {
                latest = Some((modified, entry.path()));
            }
        }
        Ok(latest.map(|(_, path)| self.to_relative(&path)))
    }

    /// Resolves a store-relative path back to a filesystem path.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.media_root().join(relative)
    }

    /// Expresses `path` relative to the media root, with forward slashes on
    /// every platform so the result is also a valid URL path.
    pub fn to_relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(self.media_root()).unwrap_or(path);
        let parts: Vec<_> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        parts.join("/")
    }
}

/// Reduces a client-supplied filename to its final path component, treating
/// both slash styles as separators. Returns `None` for names that would
/// escape the upload directory or name no file at all.
fn sanitize_filename(filename: &str) -> Option<String> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}
