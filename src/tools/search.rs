//! Search tools over a collection: moments (segments) and whole videos.

use super::ToolContext;
use crate::api::{SearchHit, SearchRequest, SearchScope};
use crate::error::{GlimtError, Result};
use crate::normalize::{format_time, resolve_text, SUMMARY_FIELDS, TITLE_FIELDS};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::instrument;

const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct SearchArgs {
    pub collection_id: String,
    pub query: String,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MomentsEnvelope {
    pub query: String,
    pub collection_id: String,
    pub moments_found: Vec<Map<String, Value>>,
    pub total_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideosFoundEnvelope {
    pub query: String,
    pub collection_id: String,
    pub videos_found: Vec<Map<String, Value>>,
    pub total_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn moment(hit: &SearchHit) -> Map<String, Value> {
    let mut out = hit.fields.clone();
    out.insert("file_id".into(), json!(hit.file_id));
    out.insert("segment_id".into(), json!(hit.segment_id));
    out.insert("score".into(), json!(hit.score));
    out.insert("start_time".into(), json!(hit.start_time));
    out.insert("end_time".into(), json!(hit.end_time));
    if let Some(start) = hit.start_time {
        out.insert("start_time_formatted".into(), json!(format_time(start)));
    }
    if let Some(end) = hit.end_time {
        out.insert("end_time_formatted".into(), json!(format_time(end)));
    }
    out
}

fn video(hit: &SearchHit) -> Map<String, Value> {
    let fields = Value::Object(hit.fields.clone());
    let mut out = Map::new();
    out.insert("file_id".into(), json!(hit.file_id));
    out.insert("score".into(), json!(hit.score));
    out.insert("title".into(), json!(resolve_text(&fields, TITLE_FIELDS, "Untitled")));
    out.insert("summary".into(), json!(resolve_text(&fields, SUMMARY_FIELDS, "")));
    out
}

impl ToolContext {
    fn search_request(&self, args: &SearchArgs, scope: SearchScope) -> Result<SearchRequest> {
        let query = args.query.trim();
        if query.is_empty() {
            return Err(GlimtError::InvalidInput("query must not be empty".to_string()));
        }
        let collection_id = args.collection_id.trim();
        if collection_id.is_empty() {
            return Err(GlimtError::InvalidInput(
                "collection_id must not be empty".to_string(),
            ));
        }
        Ok(SearchRequest {
            scope,
            collections: vec![collection_id.to_string()],
            query: query.to_string(),
            limit: args
                .limit
                .unwrap_or(self.settings().paging.search_limit)
                .clamp(1, MAX_LIMIT),
        })
    }

    async fn run_search(
        &self,
        args: &SearchArgs,
        scope: SearchScope,
        shape: fn(&SearchHit) -> Map<String, Value>,
    ) -> (Vec<Map<String, Value>>, Option<String>) {
        let result = async {
            let request = self.search_request(args, scope)?;
            self.api().search(&request).await
        }
        .await;

        match result {
            Ok(hits) => (hits.iter().map(shape).collect(), None),
            Err(e) => (Vec::new(), Some(e.to_string())),
        }
    }

    #[instrument(skip(self, args), fields(collection_id = %args.collection_id))]
    pub async fn search_moments(&self, args: &SearchArgs) -> MomentsEnvelope {
        let (moments_found, error) = self.run_search(args, SearchScope::Segment, moment).await;
        MomentsEnvelope {
            query: args.query.clone(),
            collection_id: args.collection_id.clone(),
            total_results: moments_found.len(),
            moments_found,
            error,
        }
    }

    #[instrument(skip(self, args), fields(collection_id = %args.collection_id))]
    pub async fn search_summaries(&self, args: &SearchArgs) -> VideosFoundEnvelope {
        let (videos_found, error) = self.run_search(args, SearchScope::File, video).await;
        VideosFoundEnvelope {
            query: args.query.clone(),
            collection_id: args.collection_id.clone(),
            total_results: videos_found.len(),
            videos_found,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::context;
    use super::*;

    fn hit(file_id: &str, start: Option<f64>) -> SearchHit {
        let mut fields = Map::new();
        fields.insert("filename".into(), json!(format!("{}.mp4", file_id)));
        fields.insert("text".into(), json!("matching words"));
        SearchHit {
            file_id: file_id.into(),
            segment_id: start.map(|_| "s1".to_string()),
            score: Some(0.8),
            start_time: start,
            end_time: start.map(|s| s + 30.0),
            fields,
        }
    }

    fn args(query: &str, limit: Option<u32>) -> SearchArgs {
        SearchArgs {
            collection_id: "c1".into(),
            query: query.into(),
            limit,
        }
    }

    #[tokio::test]
    async fn test_blank_query_is_usage_error() {
        let (api, ctx) = context();
        let envelope = ctx.search_moments(&args("   ", None)).await;
        assert!(envelope.error.is_some());
        assert_eq!(envelope.total_results, 0);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_moments_are_segment_scoped() {
        let (api, ctx) = context();
        api.set_search_hits(vec![hit("f1", Some(3661.0)), hit("f2", Some(5.0))]);

        let envelope = ctx.search_moments(&args("keynote", None)).await;
        assert_eq!(envelope.total_results, 2);
        assert_eq!(envelope.moments_found[0]["start_time_formatted"], "01:01:01");
        assert_eq!(envelope.moments_found[0]["text"], "matching words");

        let searches = api.searches();
        assert_eq!(searches[0].scope, SearchScope::Segment);
        assert_eq!(searches[0].limit, 10);
        assert_eq!(searches[0].collections, vec!["c1".to_string()]);
    }

    #[tokio::test]
    async fn test_video_search_limit_is_clamped() {
        let (api, ctx) = context();
        api.set_search_hits(vec![hit("f1", None)]);

        let envelope = ctx.search_summaries(&args("rust", Some(500))).await;
        assert_eq!(envelope.videos_found[0]["title"], "f1.mp4");
        assert_eq!(envelope.videos_found[0]["summary"], "");

        let envelope = ctx.search_summaries(&args("rust", Some(0))).await;
        assert_eq!(envelope.total_results, 1);

        let searches = api.searches();
        assert_eq!(searches[0].scope, SearchScope::File);
        assert_eq!(searches[0].limit, 100);
        assert_eq!(searches[1].limit, 1);
    }
}
