//! Listing tools: collections, videos and collection summaries.

use super::filters::DayRange;
use super::ToolContext;
use crate::api::{Collection, CollectionQuery, CollectionType, CollectionVideo, FileInfo};
use crate::error::{GlimtError, Result};
use crate::normalize::{resolve_text, video_summary, SUMMARY_FIELDS, TITLE_FIELDS};
use crate::paging::item_window;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListCollectionsArgs {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub collection_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListVideosArgs {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub collection_id: Option<String>,
    #[serde(default)]
    pub created_after: Option<String>,
    #[serde(default)]
    pub created_before: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrieveSummariesArgs {
    pub collection_id: String,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub created_after: Option<String>,
    #[serde(default)]
    pub created_before: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub collection_type: String,
    pub created_at: Option<DateTime<Utc>>,
    pub file_count: Option<u64>,
}

impl From<&Collection> for CollectionEntry {
    fn from(c: &Collection) -> Self {
        let fields = json!({ "name": c.name, "description": c.description });
        Self {
            id: c.id.clone(),
            name: resolve_text(&fields, TITLE_FIELDS, "Untitled"),
            description: resolve_text(&fields, SUMMARY_FIELDS, ""),
            collection_type: c.collection_type.clone(),
            created_at: c.created_at,
            file_count: c.file_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionsEnvelope {
    pub collections: Vec<CollectionEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_type: Option<String>,
    pub page: u32,
    pub total_pages: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideosEnvelope {
    pub videos: Vec<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_before: Option<String>,
    pub page: u32,
    pub total_pages: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub file_id: String,
    pub title: String,
    pub summary: String,
    pub added_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummariesEnvelope {
    pub summaries: Vec<SummaryEntry>,
    pub collection_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_before: Option<String>,
    pub page: u32,
    pub total_pages: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Collection types whose summaries can be listed.
const SUMMARY_TYPES: [CollectionType; 2] =
    [CollectionType::MediaDescriptions, CollectionType::RichTranscripts];

impl ToolContext {
    #[instrument(skip(self, args), fields(page = args.page))]
    pub async fn list_collections(&self, args: &ListCollectionsArgs) -> CollectionsEnvelope {
        let mut envelope = CollectionsEnvelope {
            collections: Vec::new(),
            collection_type: args.collection_type.clone(),
            page: args.page,
            total_pages: 1,
            error: None,
        };
        match self.fetch_collections(args).await {
            Ok((collections, total_pages)) => {
                envelope.collections = collections;
                envelope.total_pages = total_pages;
            }
            Err(e) => envelope.error = Some(e.to_string()),
        }
        envelope
    }

    async fn fetch_collections(
        &self,
        args: &ListCollectionsArgs,
    ) -> Result<(Vec<CollectionEntry>, u32)> {
        let collection_type = args
            .collection_type
            .as_deref()
            .map(str::parse::<CollectionType>)
            .transpose()
            .map_err(GlimtError::InvalidInput)?;

        let window = item_window(args.page, self.settings().paging.list_page_size, None);
        let mut page = self
            .api()
            .list_collections(&CollectionQuery {
                limit: window.fetch_limit(),
                offset: window.offset,
                collection_type,
            })
            .await?;

        let total_pages = window.trim(&mut page.data, page.total);
        let entries = page.data.iter().map(CollectionEntry::from).collect();
        Ok((entries, total_pages))
    }

    #[instrument(skip(self, args), fields(page = args.page, collection_id = ?args.collection_id))]
    pub async fn list_videos(&self, args: &ListVideosArgs) -> VideosEnvelope {
        let mut envelope = VideosEnvelope {
            videos: Vec::new(),
            collection_id: args.collection_id.clone(),
            created_after: args.created_after.clone(),
            created_before: args.created_before.clone(),
            page: args.page,
            total_pages: 1,
            error: None,
        };
        match self.fetch_videos(args).await {
            Ok((videos, total_pages)) => {
                envelope.videos = videos;
                envelope.total_pages = total_pages;
            }
            Err(e) => envelope.error = Some(e.to_string()),
        }
        envelope
    }

    async fn fetch_videos(&self, args: &ListVideosArgs) -> Result<(Vec<Map<String, Value>>, u32)> {
        let range = DayRange::parse(args.created_after.as_deref(), args.created_before.as_deref())?;
        if range.is_inverted() {
            debug!("created_after is later than created_before, nothing can match");
            return Ok((Vec::new(), 1));
        }

        let window = item_window(args.page, self.settings().paging.list_page_size, None);
        let query = range.query(window.fetch_limit(), window.offset);

        match args.collection_id.as_deref() {
            Some(collection_id) => {
                let mut page = self.api().list_collection_videos(collection_id, &query).await?;
                let total_pages = window.trim(&mut page.data, page.total);
                Ok((self.with_file_details(page.data).await, total_pages))
            }
            None => {
                let mut page = self.api().list_files(&query).await?;
                let total_pages = window.trim(&mut page.data, page.total);
                Ok((page.data.iter().map(video_summary).collect(), total_pages))
            }
        }
    }

    /// Fill in file details for collection entries, fetching missing ones
    /// concurrently. Output order follows the input order.
    async fn with_file_details(&self, entries: Vec<CollectionVideo>) -> Vec<Map<String, Value>> {
        let concurrency = self.settings().jobs.detail_concurrency.max(1);

        let mut results: Vec<(usize, Map<String, Value>)> = stream::iter(entries.into_iter().enumerate())
            .map(|(idx, entry)| async move {
                let detail = match entry.file.clone() {
                    Some(file) => Some(file),
                    None => match self.api().get_file(&entry.file_id).await {
                        Ok(file) => file,
                        Err(e) => {
                            warn!("File detail for {} unavailable: {}", entry.file_id, e);
                            None
                        }
                    },
                };
                (idx, collection_video_entry(&entry, detail.as_ref()))
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        results.sort_by_key(|(idx, _)| *idx);
        results.into_iter().map(|(_, video)| video).collect()
    }

    #[instrument(skip(self, args), fields(collection_id = %args.collection_id, page = args.page))]
    pub async fn retrieve_summaries(&self, args: &RetrieveSummariesArgs) -> SummariesEnvelope {
        let mut envelope = SummariesEnvelope {
            summaries: Vec::new(),
            collection_type: None,
            created_after: args.created_after.clone(),
            created_before: args.created_before.clone(),
            page: args.page,
            total_pages: 1,
            error: None,
        };
        if let Err(e) = self.fetch_summaries(args, &mut envelope).await {
            envelope.summaries.clear();
            envelope.total_pages = 1;
            envelope.error = Some(e.to_string());
        }
        envelope
    }

    async fn fetch_summaries(
        &self,
        args: &RetrieveSummariesArgs,
        envelope: &mut SummariesEnvelope,
    ) -> Result<()> {
        let collection_id = args.collection_id.trim();
        if collection_id.is_empty() {
            return Err(GlimtError::InvalidInput(
                "collection_id must not be empty".to_string(),
            ));
        }
        let range = DayRange::parse(args.created_after.as_deref(), args.created_before.as_deref())?;
        if range.is_inverted() {
            return Ok(());
        }

        let collection = self
            .api()
            .get_collection(collection_id)
            .await?
            .ok_or_else(|| GlimtError::NotFound(format!("collection {}", collection_id)))?;
        envelope.collection_type = Some(collection.collection_type.clone());

        let collection_type = collection
            .kind()
            .filter(|kind| SUMMARY_TYPES.contains(kind))
            .ok_or_else(|| GlimtError::UnsupportedCollection {
                collection_id: collection_id.to_string(),
                collection_type: collection.collection_type.clone(),
                tool: "retrieve_summaries".to_string(),
            })?;

        let window = item_window(args.page, self.settings().paging.list_page_size, None);
        let mut page = self
            .api()
            .list_collection_summaries(
                collection_id,
                collection_type,
                &range.query(window.fetch_limit(), window.offset),
            )
            .await?;

        envelope.total_pages = window.trim(&mut page.data, page.total);
        envelope.summaries = page
            .data
            .iter()
            .map(|item| {
                let fields = Value::Object(item.fields.clone());
                SummaryEntry {
                    file_id: item.file_id.clone(),
                    title: resolve_text(&fields, TITLE_FIELDS, "Untitled"),
                    summary: resolve_text(&fields, SUMMARY_FIELDS, ""),
                    added_at: item.added_at,
                }
            })
            .collect();
        Ok(())
    }
}

/// A collection video with its file details, or just the collection's own
/// fields when the details could not be fetched.
fn collection_video_entry(entry: &CollectionVideo, file: Option<&FileInfo>) -> Map<String, Value> {
    let mut out = match file {
        Some(file) => video_summary(file),
        None => {
            let mut m = Map::new();
            m.insert("file_id".into(), json!(entry.file_id));
            m.insert("title".into(), json!("Untitled"));
            m
        }
    };
    if let Some(status) = &entry.status {
        out.insert("status".into(), json!(status));
    }
    out.insert("added_at".into(), json!(entry.added_at));
    out
}

#[cfg(test)]
mod tests {
    use super::super::testing::context;
    use super::*;
    use crate::api::{FileInfo, SummaryItem};
    use chrono::TimeZone;

    fn file(id: &str, filename: &str) -> FileInfo {
        FileInfo {
            id: id.into(),
            status: Some("completed".into()),
            filename: Some(filename.into()),
            uri: Some(format!("cloudglue://files/{}", id)),
            bytes: None,
            created_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()),
            metadata: json!({}),
            video_info: None,
        }
    }

    fn member(file_id: &str) -> CollectionVideo {
        CollectionVideo {
            file_id: file_id.into(),
            status: Some("ready".into()),
            added_at: Some(Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap()),
            file: None,
        }
    }

    #[tokio::test]
    async fn test_inverted_dates_give_empty_list_without_calls() {
        let (api, ctx) = context();
        let envelope = ctx
            .list_videos(&ListVideosArgs {
                created_after: Some("2024-06-10".into()),
                created_before: Some("2024-06-01".into()),
                ..Default::default()
            })
            .await;
        assert!(envelope.videos.is_empty());
        assert_eq!(envelope.total_pages, 1);
        assert_eq!(envelope.error, None);
        assert!(api.calls().is_empty());
        assert_eq!(envelope.created_after.as_deref(), Some("2024-06-10"));
    }

    #[tokio::test]
    async fn test_malformed_date_is_error_envelope() {
        let (api, ctx) = context();
        let envelope = ctx
            .list_videos(&ListVideosArgs {
                created_after: Some("yesterday".into()),
                ..Default::default()
            })
            .await;
        assert!(envelope.error.is_some());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_collection_videos_keep_order_and_degrade() {
        let (api, ctx) = context();
        for id in ["f1", "f2", "f3"] {
            api.add_collection_video("c1", member(id));
        }
        api.add_file(file("f1", "one.mp4"));
        api.add_file(file("f3", "three.mp4"));

        let envelope = ctx
            .list_videos(&ListVideosArgs {
                collection_id: Some("c1".into()),
                ..Default::default()
            })
            .await;

        let ids: Vec<&str> = envelope
            .videos
            .iter()
            .map(|v| v["file_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["f1", "f2", "f3"]);
        assert_eq!(envelope.videos[0]["title"], "one.mp4");
        assert_eq!(envelope.videos[1]["title"], "Untitled");
        assert_eq!(envelope.videos[1]["status"], "ready");
        assert_eq!(api.call_count("get_file"), 3);
    }

    #[tokio::test]
    async fn test_lookahead_member_is_not_detailed() {
        let (api, ctx) = context();
        for i in 0..26 {
            api.add_collection_video("c1", member(&format!("f{}", i)));
        }
        let envelope = ctx
            .list_videos(&ListVideosArgs {
                collection_id: Some("c1".into()),
                ..Default::default()
            })
            .await;
        assert_eq!(envelope.videos.len(), 25);
        assert_eq!(envelope.total_pages, 2);
        assert_eq!(api.call_count("get_file"), 25);
    }

    #[tokio::test]
    async fn test_list_videos_pages_files() {
        let (api, ctx) = context();
        for i in 0..30 {
            api.add_file(file(&format!("f{}", i), "x.mp4"));
        }
        let envelope = ctx
            .list_videos(&ListVideosArgs {
                page: 1,
                ..Default::default()
            })
            .await;
        assert_eq!(envelope.videos.len(), 5);
        assert_eq!(envelope.total_pages, 2);
        assert_eq!(envelope.videos[0]["file_id"], "f25");
    }

    #[tokio::test]
    async fn test_list_collections_filters_by_type() {
        let (api, ctx) = context();
        api.add_collection("c1", "entities");
        api.add_collection("c2", "media-descriptions");

        let envelope = ctx
            .list_collections(&ListCollectionsArgs {
                page: 0,
                collection_type: Some("media_descriptions".into()),
            })
            .await;
        assert_eq!(envelope.collections.len(), 1);
        assert_eq!(envelope.collections[0].id, "c2");
        assert_eq!(envelope.collections[0].name, "Collection c2");

        let envelope = ctx
            .list_collections(&ListCollectionsArgs {
                page: 0,
                collection_type: Some("audio".into()),
            })
            .await;
        assert!(envelope.error.is_some());
    }

    #[tokio::test]
    async fn test_summaries_reject_entity_collections() {
        let (api, ctx) = context();
        api.add_collection("c1", "entities");
        let envelope = ctx
            .retrieve_summaries(&RetrieveSummariesArgs {
                collection_id: "c1".into(),
                page: 0,
                created_after: None,
                created_before: None,
            })
            .await;
        assert!(envelope.error.unwrap().contains("retrieve_summaries"));
        assert_eq!(envelope.collection_type.as_deref(), Some("entities"));
        assert_eq!(api.call_count("list_collection_summaries"), 0);
    }

    #[tokio::test]
    async fn test_summaries_resolve_fields() {
        let (api, ctx) = context();
        api.add_collection("c1", "media-descriptions");
        let mut fields = Map::new();
        fields.insert("filename".into(), json!("talk.mp4"));
        fields.insert("description".into(), json!("A talk about Rust"));
        api.add_summary(
            "c1",
            SummaryItem {
                file_id: "f1".into(),
                added_at: None,
                fields,
            },
        );

        let envelope = ctx
            .retrieve_summaries(&RetrieveSummariesArgs {
                collection_id: "c1".into(),
                page: 0,
                created_after: None,
                created_before: None,
            })
            .await;
        assert_eq!(envelope.error, None);
        assert_eq!(envelope.summaries[0].title, "talk.mp4");
        assert_eq!(envelope.summaries[0].summary, "A talk about Rust");
        assert_eq!(envelope.total_pages, 1);
    }
}
