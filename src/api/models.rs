//! Remote API data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declared type of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionType {
    Entities,
    RichTranscripts,
    MediaDescriptions,
}

impl CollectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionType::Entities => "entities",
            CollectionType::RichTranscripts => "rich-transcripts",
            CollectionType::MediaDescriptions => "media-descriptions",
        }
    }
}

impl std::str::FromStr for CollectionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "entities" => Ok(CollectionType::Entities),
            "rich-transcripts" => Ok(CollectionType::RichTranscripts),
            "media-descriptions" => Ok(CollectionType::MediaDescriptions),
            _ => Err(format!(
                "Unknown collection type: {}. Use entities, rich-transcripts, or media-descriptions.",
                s
            )),
        }
    }
}

impl std::fmt::Display for CollectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One page of a remote listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: Option<u64>,
    pub limit: Option<u32>,
    pub offset: Option<u64>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            total: None,
            limit: None,
            offset: None,
        }
    }
}

/// A typed grouping of previously analysed videos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Kept raw so an unrecognised type surfaces as a typed error instead of
    /// failing deserialisation.
    pub collection_type: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub file_count: Option<u64>,
}

impl Collection {
    pub fn kind(&self) -> Option<CollectionType> {
        self.collection_type.parse().ok()
    }
}

/// Technical properties of a video file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub has_audio: Option<bool>,
}

/// A file uploaded to the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub video_info: Option<VideoInfo>,
}

/// A video's membership in a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionVideo {
    pub file_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub file: Option<FileInfo>,
}

/// Markdown text covering a (possibly windowed) stretch of a video.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextArtifact {
    #[serde(default, alias = "markdown")]
    pub content: String,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

/// Extracted entities: video-level as one object, segment-level as a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityArtifact {
    #[serde(default)]
    pub entities: Value,
    #[serde(default)]
    pub segment_entities: Vec<Value>,
    #[serde(default)]
    pub total_segment_entities: Option<u64>,
}

/// A collection summary entry. Upstream field names vary by collection type,
/// so everything except the file ID is kept as raw fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryItem {
    pub file_id: String,
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// One segment of a shot or narrative segmentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    #[serde(alias = "start_time_seconds")]
    pub start_time: f64,
    #[serde(default, alias = "end_time_seconds")]
    pub end_time: Option<f64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Upstream job status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    NotApplicable,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::NotApplicable => "not_applicable",
            JobStatus::Unknown => "unknown",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::NotApplicable
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of asynchronous processing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    Describe,
    Extract,
    SegmentShot,
    SegmentNarrative,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Describe => "describe",
            JobKind::Extract => "extract",
            JobKind::SegmentShot => "segment-shot",
            JobKind::SegmentNarrative => "segment-narrative",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a video is split into segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentCriteria {
    Shot,
    Narrative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescribeConfig {
    pub url: String,
    pub enable_summary: bool,
    pub enable_speech: bool,
    pub enable_scene_text: bool,
    pub enable_visual_scene_description: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractConfig {
    pub url: String,
    pub prompt: String,
    pub enable_video_level_entities: bool,
    pub enable_segment_level_entities: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentConfig {
    pub url: String,
    pub criteria: SegmentCriteria,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// A job submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobRequest {
    Describe(DescribeConfig),
    Extract(ExtractConfig),
    Segment(SegmentConfig),
}

impl JobRequest {
    pub fn kind(&self) -> JobKind {
        match self {
            JobRequest::Describe(_) => JobKind::Describe,
            JobRequest::Extract(_) => JobKind::Extract,
            JobRequest::Segment(c) => match c.criteria {
                SegmentCriteria::Shot => JobKind::SegmentShot,
                SegmentCriteria::Narrative => JobKind::SegmentNarrative,
            },
        }
    }

    pub fn url(&self) -> &str {
        match self {
            JobRequest::Describe(c) => &c.url,
            JobRequest::Extract(c) => &c.url,
            JobRequest::Segment(c) => &c.url,
        }
    }
}

/// Status view of a submitted job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

/// A prior job as returned by the job listing, including the configuration
/// it was created with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub criteria: Option<SegmentCriteria>,
    #[serde(default)]
    pub enable_video_level_entities: Option<bool>,
    #[serde(default)]
    pub enable_segment_level_entities: Option<bool>,
}

/// Filter for prior-job listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFilter {
    pub url: String,
    pub status: JobStatus,
    pub criteria: Option<SegmentCriteria>,
    pub limit: u32,
}

/// Pagination and date bounds for list endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub limit: u32,
    pub offset: u64,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionQuery {
    pub limit: u32,
    pub offset: u64,
    pub collection_type: Option<CollectionType>,
}

/// Half-open time range `[start, end)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

/// Offset range over segment-level entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemRange {
    pub limit: u32,
    pub offset: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    Segment,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub scope: SearchScope,
    pub collections: Vec<String>,
    pub query: String,
    pub limit: u32,
}

/// A search match. Extra fields vary by scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub file_id: String,
    #[serde(default)]
    pub segment_id: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub end_time: Option<f64>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_type_parse() {
        assert_eq!("entities".parse::<CollectionType>(), Ok(CollectionType::Entities));
        assert_eq!(
            "rich_transcripts".parse::<CollectionType>(),
            Ok(CollectionType::RichTranscripts)
        );
        assert!("audio".parse::<CollectionType>().is_err());
    }

    #[test]
    fn test_unknown_collection_type_still_deserializes() {
        let c: Collection = serde_json::from_value(json!({
            "id": "c1",
            "collection_type": "face-analysis"
        }))
        .unwrap();
        assert_eq!(c.kind(), None);
    }

    #[test]
    fn test_job_status_vocabulary() {
        let s: JobStatus = serde_json::from_value(json!("not_applicable")).unwrap();
        assert_eq!(s, JobStatus::NotApplicable);
        assert!(s.is_terminal());

        let s: JobStatus = serde_json::from_value(json!("queued_for_gpu")).unwrap();
        assert_eq!(s, JobStatus::Unknown);
        assert!(!s.is_terminal());
    }

    #[test]
    fn test_segment_aliases() {
        let s: Segment = serde_json::from_value(json!({
            "start_time_seconds": 1.5,
            "end_time_seconds": 4.0
        }))
        .unwrap();
        assert_eq!(s.start_time, 1.5);
        assert_eq!(s.end_time, Some(4.0));
    }

    #[test]
    fn test_request_kind() {
        let r = JobRequest::Segment(SegmentConfig {
            url: "u".into(),
            criteria: SegmentCriteria::Narrative,
            prompt: None,
        });
        assert_eq!(r.kind(), JobKind::SegmentNarrative);
        assert_eq!(r.url(), "u");
    }
}
