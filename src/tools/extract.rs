//! `extract_video_entities`: video-level entities plus paged segment entities.

use super::ToolContext;
use crate::api::{CollectionType, EntityArtifact, ItemRange};
use crate::error::{GlimtError, Result};
use crate::jobs::extract_request;
use crate::normalize::EntityEnvelope;
use crate::paging::{item_window, ItemWindow};
use crate::resolve::{collection_kind, collection_target, find_reusable_job, Lookup, Stage};
use crate::source::ContentReference;
use serde::Deserialize;
use tracing::instrument;

const TOOL: &str = "extract_video_entities";

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractArgs {
    pub url: String,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub collection_id: Option<String>,
    #[serde(default)]
    pub page: u32,
}

fn envelope_for(mut artifact: EntityArtifact, window: &ItemWindow) -> EntityEnvelope {
    let total_pages = window.trim(
        &mut artifact.segment_entities,
        artifact.total_segment_entities,
    );
    EntityEnvelope::new(
        artifact.entities,
        artifact.segment_entities,
        window.page,
        total_pages,
    )
}

impl ToolContext {
    #[instrument(skip(self, args), fields(url = %args.url, page = args.page))]
    pub async fn extract_video_entities(&self, args: &ExtractArgs) -> EntityEnvelope {
        let prompt = args
            .prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());
        let has_collection = args
            .collection_id
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty());
        if prompt.is_none() && !has_collection {
            return EntityEnvelope::failed(
                args.page,
                0,
                "Either prompt or collection_id is required",
            );
        }

        match self.extract(args, prompt).await {
            Ok(envelope) => envelope,
            Err(e) => EntityEnvelope::failed(args.page, 1, e),
        }
    }

    async fn extract(&self, args: &ExtractArgs, prompt: Option<&str>) -> Result<EntityEnvelope> {
        let reference = ContentReference::parse(&args.url)?;
        let window = item_window(
            args.page,
            self.settings().paging.segment_entities_page_size,
            None,
        );
        let range = ItemRange {
            limit: window.fetch_limit(),
            offset: window.offset,
        };

        if let Some(target) = collection_target(args.collection_id.as_deref(), &reference)? {
            let kind = collection_kind(
                self.api(),
                &target.collection_id,
                &[CollectionType::Entities],
                TOOL,
            )
            .await?
            .settle(Stage::CheckCollection, TOOL);

            if kind.is_some() {
                let fetched = self
                    .api()
                    .get_collection_entities(&target.collection_id, &target.file_id, range)
                    .await;
                if let Some(artifact) = Lookup::from_result(fetched).settle(Stage::CheckCollection, TOOL) {
                    return Ok(envelope_for(artifact, &window));
                }
            }
        }

        let Some(prompt) = prompt else {
            return Err(GlimtError::NotFound(format!(
                "no entities stored for {} in collection {}; pass a prompt to extract them",
                reference,
                args.collection_id.as_deref().unwrap_or_default()
            )));
        };
        let request = extract_request(&reference, prompt)?;

        if let Some(record) = find_reusable_job(self.api(), &request)
            .await
            .settle(Stage::CheckPriorJob, TOOL)
        {
            let fetched = self.api().get_extraction(&record.job_id, range).await;
            if let Some(artifact) = Lookup::from_fetch(fetched).settle(Stage::CheckPriorJob, TOOL) {
                return Ok(envelope_for(artifact, &window));
            }
        }

        let handle = self.driver().submit_and_await(&request).await?;
        let artifact = self.api().get_extraction(&handle.job_id, range).await?;
        Ok(envelope_for(artifact, &window))
    }
}
