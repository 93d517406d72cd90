//! The closed set of publishing targets.

use std::fmt;

/// A publishing target. Names outside the supported set are preserved in
/// [`Platform::Unsupported`] so policy decisions and error messages can name
/// what was actually asked for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Platform {
    Facebook,
    Instagram,
    Twitter,
    Unsupported(String),
}

impl Platform {
    /// Parses a platform name, case-insensitively and ignoring surrounding
    /// whitespace.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "facebook" => Self::Facebook,
            "instagram" => Self::Instagram,
            "twitter" => Self::Twitter,
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// Parses a comma-separated platform list, dropping empty entries.
    pub fn parse_list(csv: &str) -> Vec<Self> {
        csv.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::parse)
            .collect()
    }

    /// Canonical lowercase name, as stored on post rows.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Twitter => "twitter",
            Self::Unsupported(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
