//! Tool dispatch.
//!
//! Each tool takes typed arguments and always answers with a JSON envelope.
//! Failures inside a tool are reported through the envelope's `error` field
//! with the success keys still present; only unknown tools and malformed
//! arguments surface as [`GlimtError::InvalidInput`].

mod collections;
mod describe;
mod extract;
mod filters;
mod metadata;
mod search;
mod segments;

pub use collections::{ListCollectionsArgs, ListVideosArgs, RetrieveSummariesArgs};
pub use describe::DescribeArgs;
pub use extract::ExtractArgs;
pub use filters::DayRange;
pub use metadata::MetadataArgs;
pub use search::SearchArgs;
pub use segments::{ChaptersArgs, ShotsArgs};

use crate::api::{HttpVideoApi, VideoApi};
use crate::config::Settings;
use crate::error::{GlimtError, Result};
use crate::jobs::JobDriver;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument};

/// Names of all tools, in listing order.
pub const TOOL_NAMES: [&str; 10] = [
    "list_collections",
    "list_videos",
    "describe_video",
    "extract_video_entities",
    "get_video_metadata",
    "segment_video_camera_shots",
    "segment_video_chapters",
    "retrieve_summaries",
    "search_video_moments",
    "search_video_summaries",
];

/// A parsed tool invocation.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum ToolCall {
    ListCollections(ListCollectionsArgs),
    ListVideos(ListVideosArgs),
    DescribeVideo(DescribeArgs),
    ExtractVideoEntities(ExtractArgs),
    GetVideoMetadata(MetadataArgs),
    SegmentVideoCameraShots(ShotsArgs),
    SegmentVideoChapters(ChaptersArgs),
    RetrieveSummaries(RetrieveSummariesArgs),
    SearchVideoMoments(SearchArgs),
    SearchVideoSummaries(SearchArgs),
}

impl ToolCall {
    /// Parse a call by tool name. Missing arguments are treated as `{}`.
    pub fn parse(name: &str, arguments: Option<Value>) -> Result<Self> {
        if !TOOL_NAMES.contains(&name) {
            return Err(GlimtError::InvalidInput(format!("Unknown tool: {}", name)));
        }
        let arguments = match arguments {
            None | Some(Value::Null) => json!({}),
            Some(args) => args,
        };
        serde_json::from_value(json!({ "name": name, "arguments": arguments })).map_err(|e| {
            GlimtError::InvalidInput(format!("Invalid arguments for {}: {}", name, e))
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::ListCollections(_) => "list_collections",
            ToolCall::ListVideos(_) => "list_videos",
            ToolCall::DescribeVideo(_) => "describe_video",
            ToolCall::ExtractVideoEntities(_) => "extract_video_entities",
            ToolCall::GetVideoMetadata(_) => "get_video_metadata",
            ToolCall::SegmentVideoCameraShots(_) => "segment_video_camera_shots",
            ToolCall::SegmentVideoChapters(_) => "segment_video_chapters",
            ToolCall::RetrieveSummaries(_) => "retrieve_summaries",
            ToolCall::SearchVideoMoments(_) => "search_video_moments",
            ToolCall::SearchVideoSummaries(_) => "search_video_summaries",
        }
    }
}

/// Envelope produced by a tool.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub tool: &'static str,
    pub envelope: Value,
}

impl ToolOutput {
    fn new(tool: &'static str, envelope: impl Serialize) -> Result<Self> {
        Ok(Self {
            tool,
            envelope: serde_json::to_value(envelope)?,
        })
    }

    /// Whether the envelope reports an error.
    pub fn is_error(&self) -> bool {
        self.envelope.get("error").is_some_and(|e| !e.is_null())
    }

    pub fn error_message(&self) -> Option<&str> {
        self.envelope.get("error").and_then(Value::as_str)
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.envelope)?)
    }
}

/// Shared state for tool execution.
pub struct ToolContext {
    api: Arc<dyn VideoApi>,
    settings: Settings,
}

impl ToolContext {
    pub fn new(api: Arc<dyn VideoApi>, settings: Settings) -> Self {
        Self { api, settings }
    }

    /// Context backed by the REST API described in `settings`.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let api = HttpVideoApi::from_settings(&settings.api)?;
        Ok(Self::new(Arc::new(api), settings))
    }

    pub fn api(&self) -> &dyn VideoApi {
        self.api.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn driver(&self) -> JobDriver<'_> {
        JobDriver::new(self.api(), &self.settings.jobs)
    }

    /// Parse and run a tool by name.
    pub async fn call(&self, name: &str, arguments: Option<Value>) -> Result<ToolOutput> {
        let call = ToolCall::parse(name, arguments)?;
        self.execute(&call).await
    }

    /// Run a parsed tool call.
    #[instrument(skip(self, call), fields(tool = call.name()))]
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolOutput> {
        let tool = call.name();
        let output = match call {
            ToolCall::ListCollections(args) => ToolOutput::new(tool, self.list_collections(args).await),
            ToolCall::ListVideos(args) => ToolOutput::new(tool, self.list_videos(args).await),
            ToolCall::DescribeVideo(args) => ToolOutput::new(tool, self.describe_video(args).await),
            ToolCall::ExtractVideoEntities(args) => {
                ToolOutput::new(tool, self.extract_video_entities(args).await)
            }
            ToolCall::GetVideoMetadata(args) => {
                ToolOutput::new(tool, self.get_video_metadata(args, Utc::now()).await)
            }
            ToolCall::SegmentVideoCameraShots(args) => {
                ToolOutput::new(tool, self.segment_camera_shots(args).await)
            }
            ToolCall::SegmentVideoChapters(args) => {
                ToolOutput::new(tool, self.segment_chapters(args).await)
            }
            ToolCall::RetrieveSummaries(args) => {
                ToolOutput::new(tool, self.retrieve_summaries(args).await)
            }
            ToolCall::SearchVideoMoments(args) => {
                ToolOutput::new(tool, self.search_moments(args).await)
            }
            ToolCall::SearchVideoSummaries(args) => {
                ToolOutput::new(tool, self.search_summaries(args).await)
            }
        }?;

        if let Some(error) = output.error_message() {
            info!("{} returned an error: {}", tool, error);
        }
        Ok(output)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::api::MemoryVideoApi;

    /// A context over an in-memory API that polls without delay.
    pub fn context() -> (Arc<MemoryVideoApi>, ToolContext) {
        let api = Arc::new(MemoryVideoApi::new());
        let mut settings = Settings::default();
        settings.jobs.poll_interval_secs = 0;
        let context = ToolContext::new(api.clone(), settings);
        (api, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tool() {
        let call = ToolCall::parse(
            "describe_video",
            Some(json!({ "url": "cloudglue://files/f1", "page": 2 })),
        )
        .unwrap();
        assert_eq!(call.name(), "describe_video");
        let ToolCall::DescribeVideo(args) = call else {
            panic!("expected describe_video");
        };
        assert_eq!(args.page, 2);
    }

    #[test]
    fn test_parse_defaults_missing_arguments() {
        let call = ToolCall::parse("list_collections", None).unwrap();
        assert_eq!(call.name(), "list_collections");
    }

    #[test]
    fn test_parse_rejects_unknown_and_malformed() {
        let err = ToolCall::parse("delete_everything", None).unwrap_err();
        assert!(err.is_usage());

        let err = ToolCall::parse("describe_video", Some(json!({}))).unwrap_err();
        assert!(err.to_string().contains("describe_video"));

        let err = ToolCall::parse("list_videos", Some(json!({ "page": -1 }))).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn test_every_name_parses() {
        for name in TOOL_NAMES {
            let args = json!({
                "url": "cloudglue://files/f1",
                "file_id": "f1",
                "collection_id": "c1",
                "query": "q",
                "prompt": "p"
            });
            let call = ToolCall::parse(name, Some(args)).unwrap();
            assert_eq!(call.name(), name);
        }
    }

    #[tokio::test]
    async fn test_call_reports_envelope_errors() {
        let (api, context) = testing::context();
        let output = context
            .call("segment_video_camera_shots", Some(json!({ "url": "https://youtu.be/dQw4w9WgXcQ" })))
            .await
            .unwrap();
        assert!(output.is_error());
        assert!(api.calls().is_empty());
    }
}
