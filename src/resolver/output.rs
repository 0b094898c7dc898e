use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::methods::Metadata;
use crate::upload::HostedImage;

/// Shape of the result handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMode {
    /// Just the canonical URL.
    #[serde(rename = "url")]
    DirectUrl,
    /// Method metadata plus the canonical URL.
    #[serde(rename = "json")]
    StructuredMetadata,
    /// `data:image/jpeg;base64,...` of the fetched bytes.
    #[serde(rename = "base64")]
    EncodedInline,
    /// Bytes written to a directory.
    #[serde(rename = "file")]
    PersistedFile,
}

impl OutputMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectUrl => "url",
            Self::StructuredMetadata => "json",
            Self::EncodedInline => "base64",
            Self::PersistedFile => "file",
        }
    }

    /// Modes that hand out a URL and therefore want the picture re-hosted.
    #[must_use]
    pub fn wants_hosting(self) -> bool {
        !matches!(self, Self::EncodedInline)
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "url" => Ok(Self::DirectUrl),
            "json" => Ok(Self::StructuredMetadata),
            "base64" => Ok(Self::EncodedInline),
            "file" => Ok(Self::PersistedFile),
            other => Err(format!(
                "invalid format '{other}': use \"url\", \"json\", \"base64\" or \"file\""
            )),
        }
    }
}

/// Everything known about a resolved picture.
///
/// This is the `json` output and also what the cache stores next to each image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileMetadata {
    /// Normalized account id; `None` for direct URL conversions.
    pub username: Option<String>,
    pub canonical_url: String,
    pub source_url: String,
    pub method: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub hosted: Option<HostedImage>,
    pub file_path: Option<PathBuf>,
    pub fetched_at: DateTime<Utc>,
}

/// Result of `Resolver::resolve` / `Resolver::convert`, one variant per output mode.
#[derive(Debug, Clone)]
pub enum ResolveOutput {
    DirectUrl(String),
    StructuredMetadata(ProfileMetadata),
    EncodedInline(String),
    PersistedFile(ProfileMetadata),
}

impl ResolveOutput {
    #[must_use]
    pub fn mode(&self) -> OutputMode {
        match self {
            Self::DirectUrl(_) => OutputMode::DirectUrl,
            Self::StructuredMetadata(_) => OutputMode::StructuredMetadata,
            Self::EncodedInline(_) => OutputMode::EncodedInline,
            Self::PersistedFile(_) => OutputMode::PersistedFile,
        }
    }

    /// The metadata record, for the two modes that carry one.
    #[must_use]
    pub fn into_metadata(self) -> Option<ProfileMetadata> {
        match self {
            Self::StructuredMetadata(meta) | Self::PersistedFile(meta) => Some(meta),
            Self::DirectUrl(_) | Self::EncodedInline(_) => None,
        }
    }
}
