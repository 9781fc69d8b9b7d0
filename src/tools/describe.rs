//! `describe_video`: paged video descriptions.

use super::ToolContext;
use crate::api::{CollectionType, JobKind, TextArtifact, TimeRange};
use crate::error::{GlimtError, Result};
use crate::jobs::describe_request;
use crate::normalize::DescribeEnvelope;
use crate::paging::{compute_window, Extent, PageWindow};
use crate::resolve::{collection_kind, collection_target, find_reusable_job, Lookup, Stage};
use crate::source::ContentReference;
use serde::Deserialize;
use tracing::{debug, instrument};

const TOOL: &str = "describe_video";

#[derive(Debug, Clone, Deserialize)]
pub struct DescribeArgs {
    pub url: String,
    #[serde(default)]
    pub collection_id: Option<String>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub start_time_seconds: Option<f64>,
}

/// Text collection types a description can be read from.
const TEXT_TYPES: [CollectionType; 2] =
    [CollectionType::MediaDescriptions, CollectionType::RichTranscripts];

/// Where description text is read from.
enum TextSource<'a> {
    Collection {
        collection_id: &'a str,
        file_id: &'a str,
        kind: CollectionType,
    },
    Job(&'a str),
}

fn requested_range(window: &PageWindow) -> Option<TimeRange> {
    if window.whole_payload {
        None
    } else {
        Some(TimeRange {
            start: window.start,
            end: window.end,
        })
    }
}

impl ToolContext {
    #[instrument(skip(self, args), fields(url = %args.url, page = args.page))]
    pub async fn describe_video(&self, args: &DescribeArgs) -> DescribeEnvelope {
        match self.describe(args).await {
            Ok(envelope) => envelope,
            Err(e) => DescribeEnvelope::failed(args.page, e),
        }
    }

    fn describe_window(&self, args: &DescribeArgs, extent: Extent) -> PageWindow {
        let base_offset = args.start_time_seconds.unwrap_or(0.0).max(0.0);
        compute_window(
            args.page,
            base_offset,
            self.settings().paging.time_window_seconds,
            extent,
        )
    }

    async fn fetch_text(
        &self,
        source: &TextSource<'_>,
        range: Option<TimeRange>,
    ) -> Result<Option<TextArtifact>> {
        match source {
            TextSource::Collection {
                collection_id,
                file_id,
                kind,
            } => {
                self.api()
                    .get_collection_text(collection_id, file_id, *kind, range)
                    .await
            }
            TextSource::Job(job_id) => self.api().get_description(job_id, range).await.map(Some),
        }
    }

    /// Serve one page of `source`. An unknown `duration` is read back from
    /// the unbounded payload before the page is cut.
    async fn paged_text(
        &self,
        args: &DescribeArgs,
        source: &TextSource<'_>,
        duration: Option<f64>,
    ) -> Result<Option<DescribeEnvelope>> {
        let page = |content: String, window: &PageWindow| {
            Some(DescribeEnvelope::new(content, args.page, window.total_pages))
        };

        if duration.is_some() {
            let window = self.describe_window(args, duration.into());
            if window.is_empty {
                return Ok(page(String::new(), &window));
            }
            let artifact = self.fetch_text(source, requested_range(&window)).await?;
            return Ok(artifact.and_then(|a| page(a.content, &window)));
        }

        let Some(whole) = self.fetch_text(source, None).await? else {
            return Ok(None);
        };
        let window = self.describe_window(args, whole.duration_seconds.into());
        if window.is_empty {
            return Ok(page(String::new(), &window));
        }
        if window.whole_payload {
            return Ok(page(whole.content, &window));
        }
        debug!(duration = ?whole.duration_seconds, "duration read from payload");
        let artifact = self.fetch_text(source, requested_range(&window)).await?;
        Ok(artifact.and_then(|a| page(a.content, &window)))
    }

    async fn describe(&self, args: &DescribeArgs) -> Result<DescribeEnvelope> {
        let reference = ContentReference::parse(&args.url)?;

        if let Some(target) = collection_target(args.collection_id.as_deref(), &reference)? {
            let kind = collection_kind(self.api(), &target.collection_id, &TEXT_TYPES, TOOL)
                .await?
                .settle(Stage::CheckCollection, TOOL);
            if let Some(kind) = kind {
                let duration = Lookup::from_result(self.api().get_file(&target.file_id).await)
                    .settle(Stage::CheckCollection, TOOL)
                    .and_then(|f| f.video_info)
                    .and_then(|i| i.duration_seconds);
                let source = TextSource::Collection {
                    collection_id: &target.collection_id,
                    file_id: &target.file_id,
                    kind,
                };
                let fetched = self.paged_text(args, &source, duration).await;
                if let Some(envelope) = Lookup::from_result(fetched).settle(Stage::CheckCollection, TOOL) {
                    return Ok(envelope);
                }
            }
        }

        let request = describe_request(&reference);

        if let Some(record) = find_reusable_job(self.api(), &request)
            .await
            .settle(Stage::CheckPriorJob, TOOL)
        {
            let source = TextSource::Job(&record.job_id);
            let fetched = self.paged_text(args, &source, record.duration_seconds).await;
            if let Some(envelope) = Lookup::from_result(fetched).settle(Stage::CheckPriorJob, TOOL) {
                return Ok(envelope);
            }
        }

        let handle = self.driver().submit_and_await(&request).await?;
        let duration = match handle.duration_seconds {
            Some(d) => Some(d),
            None => Lookup::from_fetch(self.api().job_status(JobKind::Describe, &handle.job_id).await)
                .settle(Stage::CreateNew, TOOL)
                .and_then(|h| h.duration_seconds),
        };
        self.paged_text(args, &TextSource::Job(&handle.job_id), duration)
            .await?
            .ok_or_else(|| GlimtError::NotFound(format!("description for job {}", handle.job_id)))
    }
}
