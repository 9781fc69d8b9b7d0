//! Response shaping: uniform envelopes, formatted times and derived fields.

use crate::api::{FileInfo, Segment};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Fallback order for display titles.
pub const TITLE_FIELDS: &[&str] = &["title", "name", "filename"];

/// Fallback order for summary text.
pub const SUMMARY_FIELDS: &[&str] = &["summary", "description", "content"];

/// Format seconds as `MM:SS`, or `HH:MM:SS` once there are hours.
/// Fractions are truncated; negative and NaN inputs format as zero.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// First non-empty string among `keys` in `value`, else `default`.
pub fn resolve_text(value: &Value, keys: &[&str], default: &str) -> String {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Describe result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescribeEnvelope {
    pub description: String,
    pub page: u32,
    pub total_pages: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DescribeEnvelope {
    pub fn new(description: String, page: u32, total_pages: u32) -> Self {
        Self {
            description,
            page,
            total_pages,
            error: None,
        }
    }

    pub fn failed(page: u32, error: impl ToString) -> Self {
        Self {
            description: String::new(),
            page,
            total_pages: 1,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentEntities {
    pub entities: Vec<Value>,
    pub page: u32,
    pub total_pages: u32,
}

/// Extract result. Video-level entities are returned whole; only segment
/// entities are paged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityEnvelope {
    pub video_level_entities: Value,
    pub segment_level_entities: SegmentEntities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EntityEnvelope {
    pub fn new(video_level: Value, entities: Vec<Value>, page: u32, total_pages: u32) -> Self {
        Self {
            video_level_entities: object_or_empty(video_level),
            segment_level_entities: SegmentEntities {
                entities,
                page,
                total_pages,
            },
            error: None,
        }
    }

    pub fn failed(page: u32, total_pages: u32, error: impl ToString) -> Self {
        Self {
            video_level_entities: json!({}),
            segment_level_entities: SegmentEntities {
                entities: Vec::new(),
                page,
                total_pages,
            },
            error: Some(error.to_string()),
        }
    }
}

fn object_or_empty(value: Value) -> Value {
    if value.is_null() {
        json!({})
    } else {
        value
    }
}

/// Where a segmentation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Existing,
    New,
}

/// One shot or chapter with display times.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentEntry {
    pub start_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    pub start_time_formatted: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time_formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&Segment> for SegmentEntry {
    fn from(segment: &Segment) -> Self {
        Self {
            start_time: segment.start_time,
            end_time: segment.end_time,
            start_time_formatted: format_time(segment.start_time),
            end_time_formatted: segment.end_time.map(format_time),
            duration_seconds: segment
                .end_time
                .map(|end| (end - segment.start_time).max(0.0)),
            description: non_empty(segment.description.as_deref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterEntry {
    pub chapter_number: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub segment: SegmentEntry,
}

pub fn shot_entries(segments: &[Segment]) -> Vec<SegmentEntry> {
    segments.iter().map(SegmentEntry::from).collect()
}

/// Chapters are numbered from 1 in segment order.
pub fn chapter_entries(segments: &[Segment]) -> Vec<ChapterEntry> {
    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| ChapterEntry {
            chapter_number: i + 1,
            title: non_empty(segment.title.as_deref()),
            segment: SegmentEntry::from(segment),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotsEnvelope {
    pub url: String,
    pub segments: Vec<SegmentEntry>,
    pub total_shots: usize,
    pub source: Option<Source>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ShotsEnvelope {
    pub fn new(url: &str, segments: &[Segment], source: Source) -> Self {
        let segments = shot_entries(segments);
        Self {
            url: url.to_string(),
            total_shots: segments.len(),
            segments,
            source: Some(source),
            error: None,
        }
    }

    pub fn failed(url: &str, error: impl ToString) -> Self {
        Self {
            url: url.to_string(),
            segments: Vec::new(),
            total_shots: 0,
            source: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChaptersEnvelope {
    pub url: String,
    pub chapters: Vec<ChapterEntry>,
    pub total_chapters: usize,
    pub source: Option<Source>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChaptersEnvelope {
    pub fn new(url: &str, segments: &[Segment], source: Source) -> Self {
        let chapters = chapter_entries(segments);
        Self {
            url: url.to_string(),
            total_chapters: chapters.len(),
            chapters,
            source: Some(source),
            error: None,
        }
    }

    pub fn failed(url: &str, error: impl ToString) -> Self {
        Self {
            url: url.to_string(),
            chapters: Vec::new(),
            total_chapters: 0,
            source: None,
            error: Some(error.to_string()),
        }
    }
}

/// Derived metadata fields for a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedMetadata {
    pub file_age_days: Option<i64>,
    pub duration_formatted: Option<String>,
    pub file_size_mb: Option<f64>,
    pub resolution: Option<String>,
    pub aspect_ratio: Option<String>,
    pub has_audio: Option<bool>,
}

/// Compute display fields for `file` as of `now`.
pub fn computed_metadata(file: &FileInfo, now: DateTime<Utc>) -> ComputedMetadata {
    let info = file.video_info.as_ref();
    let dimensions = info.and_then(|i| match (i.width, i.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
        _ => None,
    });

    ComputedMetadata {
        file_age_days: file
            .created_at
            .map(|created| (now - created).num_days().max(0)),
        duration_formatted: info.and_then(|i| i.duration_seconds).map(format_time),
        file_size_mb: file
            .bytes
            .map(|b| (b as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0),
        resolution: dimensions.map(|(w, h)| format!("{}x{}", w, h)),
        aspect_ratio: dimensions.map(|(w, h)| {
            let d = gcd(w, h);
            format!("{}:{}", w / d, h / d)
        }),
        has_audio: info.and_then(|i| i.has_audio),
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Display-friendly view of a file used by video listings.
pub fn video_summary(file: &FileInfo) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("file_id".into(), json!(file.id));
    out.insert(
        "title".into(),
        json!(resolve_text(&file_fields(file), TITLE_FIELDS, "Untitled")),
    );
    out.insert("status".into(), json!(file.status));
    out.insert("uri".into(), json!(file.uri));
    out.insert("created_at".into(), json!(file.created_at));
    if let Some(duration) = file.video_info.as_ref().and_then(|i| i.duration_seconds) {
        out.insert("duration_seconds".into(), json!(duration));
        out.insert("duration_formatted".into(), json!(format_time(duration)));
    }
    out
}

/// File metadata merged with its top-level fields, so fallback chains can
/// see both user metadata (`title`) and the upload name (`filename`).
pub(crate) fn file_fields(file: &FileInfo) -> Value {
    let mut fields = match &file.metadata {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    if let Some(name) = &file.filename {
        fields
            .entry("filename")
            .or_insert_with(|| Value::String(name.clone()));
    }
    Value::Object(fields)
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::VideoInfo;
    use chrono::TimeZone;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(59.0), "00:59");
        assert_eq!(format_time(60.0), "01:00");
        assert_eq!(format_time(3600.0), "01:00:00");
        assert_eq!(format_time(3661.0), "01:01:01");
    }

    #[test]
    fn test_format_time_truncates_and_clamps() {
        assert_eq!(format_time(59.99), "00:59");
        assert_eq!(format_time(-5.0), "00:00");
        assert_eq!(format_time(f64::NAN), "00:00");
        assert_eq!(format_time(36000.0), "10:00:00");
    }

    #[test]
    fn test_resolve_text_fallbacks() {
        let v = json!({ "name": "Keynote", "filename": "keynote.mp4" });
        assert_eq!(resolve_text(&v, TITLE_FIELDS, "Untitled"), "Keynote");

        let v = json!({ "title": "  ", "filename": "clip.mp4" });
        assert_eq!(resolve_text(&v, TITLE_FIELDS, "Untitled"), "clip.mp4");

        let v = json!({ "title": 42 });
        assert_eq!(resolve_text(&v, TITLE_FIELDS, "Untitled"), "Untitled");

        let v = json!({ "content": "body" });
        assert_eq!(resolve_text(&v, SUMMARY_FIELDS, ""), "body");
        assert_eq!(resolve_text(&json!(null), SUMMARY_FIELDS, ""), "");
    }

    #[test]
    fn test_chapters_are_numbered_from_one() {
        let segments = vec![
            Segment {
                start_time: 0.0,
                end_time: Some(95.5),
                title: Some("Intro".into()),
                description: Some("".into()),
            },
            Segment {
                start_time: 95.5,
                end_time: None,
                title: None,
                description: Some("Demo".into()),
            },
        ];
        let chapters = chapter_entries(&segments);
        assert_eq!(chapters[0].chapter_number, 1);
        assert_eq!(chapters[1].chapter_number, 2);
        assert_eq!(chapters[0].segment.end_time_formatted.as_deref(), Some("01:35"));
        assert_eq!(chapters[0].segment.duration_seconds, Some(95.5));
        assert_eq!(chapters[0].segment.description, None);
        assert_eq!(chapters[1].segment.end_time_formatted, None);

        let v = serde_json::to_value(&chapters[0]).unwrap();
        assert_eq!(v["title"], "Intro");
        assert_eq!(v["start_time_formatted"], "00:00");
        assert!(v.get("end_time").is_some());
    }

    #[test]
    fn test_computed_metadata_uses_given_now() {
        let file = FileInfo {
            id: "f1".into(),
            status: Some("completed".into()),
            filename: Some("talk.mp4".into()),
            uri: None,
            bytes: Some(5 * 1024 * 1024 + 512 * 1024),
            created_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
            metadata: json!({}),
            video_info: Some(VideoInfo {
                duration_seconds: Some(3725.0),
                width: Some(1920),
                height: Some(1080),
                format: Some("mp4".into()),
                has_audio: Some(true),
            }),
        };
        let now = Utc.with_ymd_and_hms(2024, 1, 11, 11, 0, 0).unwrap();
        let c = computed_metadata(&file, now);
        assert_eq!(c.file_age_days, Some(9));
        assert_eq!(c.duration_formatted.as_deref(), Some("01:02:05"));
        assert_eq!(c.file_size_mb, Some(5.5));
        assert_eq!(c.resolution.as_deref(), Some("1920x1080"));
        assert_eq!(c.aspect_ratio.as_deref(), Some("16:9"));
        assert_eq!(c.has_audio, Some(true));
    }

    #[test]
    fn test_error_envelopes_keep_keys() {
        let v = serde_json::to_value(EntityEnvelope::failed(0, 0, "no prompt")).unwrap();
        assert_eq!(v["video_level_entities"], json!({}));
        assert_eq!(v["segment_level_entities"]["total_pages"], 0);
        assert_eq!(v["segment_level_entities"]["entities"], json!([]));
        assert_eq!(v["error"], "no prompt");

        let v = serde_json::to_value(DescribeEnvelope::new("x".into(), 0, 1)).unwrap();
        assert!(v.get("error").is_none());
    }
}
