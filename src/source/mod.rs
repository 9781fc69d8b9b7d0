//! Content references.
//!
//! A content reference is the URI handed to a tool that identifies the video
//! to analyse. Its scheme decides which operations are legal: only
//! platform-native files can be looked up inside a collection, and web video
//! hosts cannot be shot-segmented.

mod web;

pub use web::{detect_web_video, WebHost};

use crate::error::{GlimtError, Result};
use serde::Serialize;
use url::Url;

/// URI scheme for files stored on the video platform.
pub const PLATFORM_SCHEME: &str = "cloudglue";

/// Third-party storage connectors the platform can pull media from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageConnector {
    S3,
    Gcs,
    Dropbox,
    GoogleDrive,
    Zoom,
}

impl StorageConnector {
    fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "s3" => Some(StorageConnector::S3),
            "gs" => Some(StorageConnector::Gcs),
            "dropbox" => Some(StorageConnector::Dropbox),
            "gdrive" => Some(StorageConnector::GoogleDrive),
            "zoom" => Some(StorageConnector::Zoom),
            _ => None,
        }
    }

    /// Check the connector-specific part of the URI.
    fn validate(&self, url: &Url) -> std::result::Result<(), &'static str> {
        let host = url.host_str().unwrap_or_default();
        let path = url.path().trim_start_matches('/');

        match self {
            StorageConnector::S3 | StorageConnector::Gcs => {
                if host.is_empty() || path.is_empty() {
                    return Err("expected <scheme>://<bucket>/<key>");
                }
            }
            StorageConnector::Dropbox => {
                if host.is_empty() && path.is_empty() {
                    return Err("expected dropbox://<path>");
                }
            }
            StorageConnector::GoogleDrive => {
                if host != "file" || path.is_empty() {
                    return Err("expected gdrive://file/<id>");
                }
            }
            StorageConnector::Zoom => {
                if !matches!(host, "uuid" | "id") || path.is_empty() {
                    return Err("expected zoom://uuid/<uuid> or zoom://id/<meeting_id>");
                }
            }
        }
        Ok(())
    }
}

/// Broad class of a reference, used to gate operations and pick defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    PlatformFile,
    WebVideo,
    DirectMedia,
    Storage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    PlatformFile { file_id: String },
    WebVideo { host: WebHost, video_id: String },
    DirectMedia,
    Storage { connector: StorageConnector },
}

/// A parsed content reference. The original URI is kept verbatim because the
/// remote service matches prior jobs on exact URL equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentReference {
    uri: String,
    target: Target,
}

impl ContentReference {
    /// Parse and classify a content reference.
    pub fn parse(input: &str) -> Result<Self> {
        let uri = input.trim().to_string();
        if uri.is_empty() {
            return Err(GlimtError::InvalidInput("url must not be empty".to_string()));
        }

        if let Some((host, video_id)) = detect_web_video(&uri) {
            return Ok(Self {
                uri,
                target: Target::WebVideo { host, video_id },
            });
        }

        let parsed = Url::parse(&uri)
            .map_err(|e| GlimtError::UnsupportedReference(format!("{}: {}", uri, e)))?;

        let target = match parsed.scheme() {
            PLATFORM_SCHEME => {
                let file_id = platform_file_id(&parsed).ok_or_else(|| {
                    GlimtError::UnsupportedReference(format!(
                        "{}: expected {}://files/<file_id>",
                        uri, PLATFORM_SCHEME
                    ))
                })?;
                Target::PlatformFile { file_id }
            }
            "http" | "https" => {
                if parsed.host_str().is_none() {
                    return Err(GlimtError::UnsupportedReference(format!(
                        "{}: missing host",
                        uri
                    )));
                }
                Target::DirectMedia
            }
            scheme => {
                let connector = StorageConnector::from_scheme(scheme).ok_or_else(|| {
                    GlimtError::UnsupportedReference(format!(
                        "{}: unknown scheme '{}'",
                        uri, scheme
                    ))
                })?;
                connector
                    .validate(&parsed)
                    .map_err(|hint| GlimtError::UnsupportedReference(format!("{}: {}", uri, hint)))?;
                Target::Storage { connector }
            }
        };

        Ok(Self { uri, target })
    }

    /// Build the platform-native reference for a file ID.
    pub fn platform_file(file_id: &str) -> Self {
        Self {
            uri: format!("{}://files/{}", PLATFORM_SCHEME, file_id),
            target: Target::PlatformFile {
                file_id: file_id.to_string(),
            },
        }
    }

    /// The URI as supplied by the caller.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn kind(&self) -> ReferenceKind {
        match self.target {
            Target::PlatformFile { .. } => ReferenceKind::PlatformFile,
            Target::WebVideo { .. } => ReferenceKind::WebVideo,
            Target::DirectMedia => ReferenceKind::DirectMedia,
            Target::Storage { .. } => ReferenceKind::Storage,
        }
    }

    pub fn is_platform_native(&self) -> bool {
        self.kind() == ReferenceKind::PlatformFile
    }

    pub fn is_web_video(&self) -> bool {
        self.kind() == ReferenceKind::WebVideo
    }

    /// File ID for platform-native references.
    pub fn file_id(&self) -> Option<&str> {
        match &self.target {
            Target::PlatformFile { file_id } => Some(file_id.as_str()),
            _ => None,
        }
    }

    pub fn web_host(&self) -> Option<(WebHost, &str)> {
        match &self.target {
            Target::WebVideo { host, video_id } => Some((*host, video_id.as_str())),
            _ => None,
        }
    }

    pub fn storage_connector(&self) -> Option<StorageConnector> {
        match self.target {
            Target::Storage { connector } => Some(connector),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}

fn platform_file_id(url: &Url) -> Option<String> {
    if url.host_str() != Some("files") {
        return None;
    }
    let id = url.path().trim_matches('/');
    if id.is_empty() || id.contains('/') {
        return None;
    }
    Some(id.to_string())
}

/// Accept either a bare file ID or a platform-native URI and return the ID.
pub fn normalize_file_id(input: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(GlimtError::InvalidInput("file_id must not be empty".to_string()));
    }
    if input.contains("://") {
        let reference = ContentReference::parse(input)?;
        return reference.file_id().map(str::to_string).ok_or_else(|| {
            GlimtError::InvalidInput(format!(
                "{} is not a {}://files/<file_id> reference",
                input, PLATFORM_SCHEME
            ))
        });
    }
    Ok(input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_file() {
        let r = ContentReference::parse("cloudglue://files/abc-123").unwrap();
        assert_eq!(r.kind(), ReferenceKind::PlatformFile);
        assert_eq!(r.file_id(), Some("abc-123"));
        assert!(r.is_platform_native());
        assert_eq!(r.uri(), "cloudglue://files/abc-123");
    }

    #[test]
    fn test_platform_file_requires_id() {
        assert!(ContentReference::parse("cloudglue://files/").is_err());
        assert!(ContentReference::parse("cloudglue://collections/abc").is_err());
    }

    #[test]
    fn test_web_video() {
        let r = ContentReference::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(r.kind(), ReferenceKind::WebVideo);
        assert_eq!(r.web_host(), Some((WebHost::YouTube, "dQw4w9WgXcQ")));
        assert!(r.file_id().is_none());
    }

    #[test]
    fn test_direct_media() {
        let r = ContentReference::parse(" https://cdn.example.com/talk.mp4 ").unwrap();
        assert_eq!(r.kind(), ReferenceKind::DirectMedia);
        assert_eq!(r.uri(), "https://cdn.example.com/talk.mp4");
    }

    #[test]
    fn test_storage_connectors() {
        let ok = [
            ("s3://bucket/path/video.mp4", StorageConnector::S3),
            ("gs://bucket/video.mp4", StorageConnector::Gcs),
            ("dropbox://team/video.mp4", StorageConnector::Dropbox),
            ("gdrive://file/1AbCdEf", StorageConnector::GoogleDrive),
            ("zoom://uuid/abcd==", StorageConnector::Zoom),
            ("zoom://id/81234567890", StorageConnector::Zoom),
        ];
        for (uri, connector) in ok {
            let r = ContentReference::parse(uri).unwrap();
            assert_eq!(r.storage_connector(), Some(connector), "{uri}");
        }

        for bad in ["s3://bucket-only", "gdrive://folder/1", "zoom://meeting/1"] {
            assert!(ContentReference::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_unknown_scheme() {
        let err = ContentReference::parse("ftp://host/video.mp4").unwrap_err();
        assert!(matches!(err, GlimtError::UnsupportedReference(_)));
        assert!(ContentReference::parse("").is_err());
    }

    #[test]
    fn test_normalize_file_id() {
        assert_eq!(normalize_file_id("abc").unwrap(), "abc");
        assert_eq!(normalize_file_id("cloudglue://files/abc").unwrap(), "abc");
        assert!(normalize_file_id("https://example.com/a.mp4").is_err());
        assert!(normalize_file_id("  ").is_err());
    }

    #[test]
    fn test_platform_file_constructor() {
        let r = ContentReference::platform_file("f1");
        assert_eq!(r, ContentReference::parse("cloudglue://files/f1").unwrap());
    }
}
