//! `get_video_metadata`: file details with derived display fields.

use super::ToolContext;
use crate::api::{FileInfo, VideoInfo};
use crate::error::{GlimtError, Result};
use crate::normalize::{
    computed_metadata, file_fields, resolve_text, ComputedMetadata, TITLE_FIELDS,
};
use crate::source::normalize_file_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataArgs {
    /// Bare file ID or platform URI.
    pub file_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingInfo {
    pub title: String,
    pub filename: Option<String>,
    pub uri: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataEnvelope {
    pub file_id: String,
    pub status: String,
    pub metadata: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_info: Option<VideoInfo>,
    pub processing_info: Option<ProcessingInfo>,
    pub computed: Option<ComputedMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MetadataEnvelope {
    fn from_file(file: FileInfo, now: DateTime<Utc>) -> Self {
        let computed = computed_metadata(&file, now);
        let processing_info = ProcessingInfo {
            title: resolve_text(&file_fields(&file), TITLE_FIELDS, "Untitled"),
            filename: file.filename.clone(),
            uri: file.uri.clone(),
            created_at: file.created_at,
            bytes: file.bytes,
        };

        Self {
            file_id: file.id,
            status: file.status.unwrap_or_else(|| "unknown".to_string()),
            metadata: if file.metadata.is_null() {
                json!({})
            } else {
                file.metadata
            },
            video_info: file.video_info,
            processing_info: Some(processing_info),
            computed: Some(computed),
            error: None,
        }
    }

    fn failed(file_id: &str, error: impl ToString) -> Self {
        Self {
            file_id: file_id.to_string(),
            status: "unknown".to_string(),
            metadata: json!({}),
            video_info: None,
            processing_info: None,
            computed: None,
            error: Some(error.to_string()),
        }
    }
}

impl ToolContext {
    /// `now` anchors `computed.file_age_days`.
    #[instrument(skip(self, args, now), fields(file_id = %args.file_id))]
    pub async fn get_video_metadata(
        &self,
        args: &MetadataArgs,
        now: DateTime<Utc>,
    ) -> MetadataEnvelope {
        match self.fetch_metadata(args, now).await {
            Ok(envelope) => envelope,
            Err(e) => MetadataEnvelope::failed(args.file_id.trim(), e),
        }
    }

    async fn fetch_metadata(&self, args: &MetadataArgs, now: DateTime<Utc>) -> Result<MetadataEnvelope> {
        let file_id = normalize_file_id(&args.file_id)?;
        let file = self
            .api()
            .get_file(&file_id)
            .await?
            .ok_or_else(|| GlimtError::NotFound(format!("file {}", file_id)))?;
        Ok(MetadataEnvelope::from_file(file, now))
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::context;
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_metadata_for_platform_uri() {
        let (api, ctx) = context();
        api.add_file(FileInfo {
            id: "f1".into(),
            status: Some("completed".into()),
            filename: Some("demo.mov".into()),
            uri: Some("cloudglue://files/f1".into()),
            bytes: Some(1024 * 1024),
            created_at: Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
            metadata: json!({ "title": "Product demo" }),
            video_info: Some(VideoInfo {
                duration_seconds: Some(61.0),
                width: Some(1280),
                height: Some(720),
                format: None,
                has_audio: Some(false),
            }),
        });

        let now = Utc.with_ymd_and_hms(2024, 2, 11, 0, 0, 0).unwrap();
        let envelope = ctx
            .get_video_metadata(
                &MetadataArgs {
                    file_id: "cloudglue://files/f1".into(),
                },
                now,
            )
            .await;

        assert_eq!(envelope.error, None);
        assert_eq!(envelope.file_id, "f1");
        assert_eq!(envelope.processing_info.unwrap().title, "Product demo");
        let computed = envelope.computed.unwrap();
        assert_eq!(computed.file_age_days, Some(10));
        assert_eq!(computed.duration_formatted.as_deref(), Some("01:01"));
        assert_eq!(computed.file_size_mb, Some(1.0));
        assert_eq!(computed.has_audio, Some(false));
    }

    #[tokio::test]
    async fn test_title_falls_back_to_filename() {
        let (api, ctx) = context();
        let file = FileInfo {
            id: "f2".into(),
            status: None,
            filename: Some("keynote.mp4".into()),
            uri: None,
            bytes: None,
            created_at: None,
            metadata: json!({ "title": "  " }),
            video_info: None,
        };
        api.add_file(file.clone());

        let envelope = ctx
            .get_video_metadata(&MetadataArgs { file_id: "f2".into() }, Utc::now())
            .await;
        let info = envelope.processing_info.unwrap();
        assert_eq!(info.title, "keynote.mp4");
        assert_eq!(crate::normalize::video_summary(&file)["title"], json!(info.title));
        assert_eq!(envelope.status, "unknown");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let (_api, ctx) = context();
        let envelope = ctx
            .get_video_metadata(&MetadataArgs { file_id: "nope".into() }, Utc::now())
            .await;
        assert!(envelope.error.unwrap().contains("nope"));
        assert_eq!(envelope.metadata, json!({}));
    }

    #[tokio::test]
    async fn test_non_platform_uri_is_rejected() {
        let (api, ctx) = context();
        let envelope = ctx
            .get_video_metadata(
                &MetadataArgs {
                    file_id: "https://cdn.example.com/a.mp4".into(),
                },
                Utc::now(),
            )
            .await;
        assert!(envelope.error.is_some());
        assert!(api.calls().is_empty());
    }
}
