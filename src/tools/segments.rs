//! Segmentation tools: camera shots and narrative chapters.

use super::ToolContext;
use crate::api::{JobRequest, Segment};
use crate::error::Result;
use crate::jobs::{narrative_request, shot_request};
use crate::normalize::{ChaptersEnvelope, ShotsEnvelope, Source};
use crate::resolve::{find_reusable_job, Lookup, Stage};
use crate::source::ContentReference;
use serde::Deserialize;
use tracing::instrument;

#[derive(Debug, Clone, Deserialize)]
pub struct ShotsArgs {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChaptersArgs {
    pub url: String,
    #[serde(default)]
    pub prompt: Option<String>,
}

impl ToolContext {
    #[instrument(skip(self, args), fields(url = %args.url))]
    pub async fn segment_camera_shots(&self, args: &ShotsArgs) -> ShotsEnvelope {
        let result = async {
            let reference = ContentReference::parse(&args.url)?;
            let request = shot_request(&reference)?;
            self.segmentation(&request, "segment_video_camera_shots").await
        }
        .await;

        match result {
            Ok((segments, source)) => ShotsEnvelope::new(&args.url, &segments, source),
            Err(e) => ShotsEnvelope::failed(&args.url, e),
        }
    }

    #[instrument(skip(self, args), fields(url = %args.url))]
    pub async fn segment_chapters(&self, args: &ChaptersArgs) -> ChaptersEnvelope {
        let result = async {
            let reference = ContentReference::parse(&args.url)?;
            let request = narrative_request(&reference, args.prompt.as_deref());
            self.segmentation(&request, "segment_video_chapters").await
        }
        .await;

        match result {
            Ok((segments, source)) => ChaptersEnvelope::new(&args.url, &segments, source),
            Err(e) => ChaptersEnvelope::failed(&args.url, e),
        }
    }

    /// Reuse a matching segmentation or run a new one.
    async fn segmentation(&self, request: &JobRequest, tool: &str) -> Result<(Vec<Segment>, Source)> {
        if let Some(record) = find_reusable_job(self.api(), request)
            .await
            .settle(Stage::CheckPriorJob, tool)
        {
            let fetched = self.api().get_segmentation(&record.job_id).await;
            if let Some(segments) = Lookup::from_fetch(fetched).settle(Stage::CheckPriorJob, tool) {
                return Ok((segments, Source::Existing));
            }
        }

        let handle = self.driver().submit_and_await(request).await?;
        let segments = self.api().get_segmentation(&handle.job_id).await?;
        Ok((segments, Source::New))
    }
}
