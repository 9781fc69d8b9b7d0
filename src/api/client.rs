//! HTTP client for the video platform REST API.

use super::models::*;
use super::VideoApi;
use crate::config::ApiSettings;
use crate::error::{GlimtError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// REST implementation of [`VideoApi`].
pub struct HttpVideoApi {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

type QueryPairs = Vec<(&'static str, String)>;

impl HttpVideoApi {
    /// Create a client with the given base URL, key and request timeout.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GlimtError::Config(format!("Invalid api.base_url {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(GlimtError::Config(format!(
                "api.base_url must be an absolute http(s) URL: {}",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("glimt/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    /// Create a client from settings. Fails when no API key is configured.
    pub fn from_settings(settings: &ApiSettings) -> Result<Self> {
        let api_key = settings.resolve_api_key().ok_or_else(|| {
            GlimtError::Config(format!(
                "{} not set. Set it with: export {}='...'",
                settings.api_key_env, settings.api_key_env
            ))
        })?;
        Self::new(&settings.base_url, &api_key, settings.timeout())
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str], query: &QueryPairs) -> Result<T> {
        let url = self.endpoint(segments);
        debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// GET that maps 404 to `None`.
    async fn get_optional<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &QueryPairs,
    ) -> Result<Option<T>> {
        let url = self.endpoint(segments);
        debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check(response).await?.json().await?))
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(segments);
        debug!("POST {}", url);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

/// Turn non-2xx responses into [`GlimtError::Api`].
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body
            }
        });

    Err(GlimtError::Api {
        status: status.as_u16(),
        message,
    })
}

fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn list_pairs(query: &ListQuery, after_key: &'static str, before_key: &'static str) -> QueryPairs {
    let mut pairs = vec![
        ("limit", query.limit.to_string()),
        ("offset", query.offset.to_string()),
    ];
    if let Some(after) = &query.created_after {
        pairs.push((after_key, timestamp(after)));
    }
    if let Some(before) = &query.created_before {
        pairs.push((before_key, timestamp(before)));
    }
    pairs
}

fn window_pairs(window: Option<TimeRange>) -> QueryPairs {
    let mut pairs = vec![("response_format", "markdown".to_string())];
    if let Some(w) = window {
        pairs.push(("start_time_seconds", w.start.to_string()));
        pairs.push(("end_time_seconds", w.end.to_string()));
    }
    pairs
}

fn segment_pairs(segments: ItemRange) -> QueryPairs {
    vec![
        ("segment_limit", segments.limit.to_string()),
        ("segment_offset", segments.offset.to_string()),
    ]
}

fn job_endpoint(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Describe => "describe",
        JobKind::Extract => "extract",
        JobKind::SegmentShot | JobKind::SegmentNarrative => "segments",
    }
}

fn text_endpoint(collection_type: CollectionType) -> Result<&'static str> {
    match collection_type {
        CollectionType::MediaDescriptions => Ok("media-descriptions"),
        CollectionType::RichTranscripts => Ok("rich-transcripts"),
        CollectionType::Entities => Err(GlimtError::InvalidInput(
            "entity collections hold no description text".to_string(),
        )),
    }
}

/// Narrative prompts come back nested under `narrative_config`.
fn job_record(mut value: Value) -> Result<JobRecord> {
    if value.get("prompt").map_or(true, Value::is_null) {
        if let Some(prompt) = value.pointer("/narrative_config/prompt").cloned() {
            value["prompt"] = prompt;
        }
    }
    Ok(serde_json::from_value(value)?)
}

#[derive(Deserialize)]
struct DescribeResponse {
    #[serde(default)]
    duration_seconds: Option<f64>,
    #[serde(default)]
    data: Option<TextArtifact>,
}

#[derive(Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    data: Option<EntityArtifact>,
}

#[derive(Deserialize)]
struct SegmentsResponse {
    #[serde(default)]
    segments: Option<Vec<Segment>>,
    #[serde(default)]
    data: Option<SegmentsData>,
}

#[derive(Deserialize)]
struct SegmentsData {
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[async_trait]
impl VideoApi for HttpVideoApi {
    #[instrument(skip(self))]
    async fn list_collections(&self, query: &CollectionQuery) -> Result<Page<Collection>> {
        let mut pairs = vec![
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        if let Some(t) = query.collection_type {
            pairs.push(("collection_type", t.as_str().to_string()));
        }
        self.get(&["collections"], &pairs).await
    }

    #[instrument(skip(self))]
    async fn get_collection(&self, collection_id: &str) -> Result<Option<Collection>> {
        self.get_optional(&["collections", collection_id], &Vec::new())
            .await
    }

    #[instrument(skip(self))]
    async fn list_collection_videos(
        &self,
        collection_id: &str,
        query: &ListQuery,
    ) -> Result<Page<CollectionVideo>> {
        let pairs = list_pairs(query, "added_after", "added_before");
        self.get(&["collections", collection_id, "videos"], &pairs)
            .await
    }

    #[instrument(skip(self))]
    async fn get_collection_text(
        &self,
        collection_id: &str,
        file_id: &str,
        collection_type: CollectionType,
        window: Option<TimeRange>,
    ) -> Result<Option<TextArtifact>> {
        let artifact = text_endpoint(collection_type)?;
        self.get_optional(
            &["collections", collection_id, "videos", file_id, artifact],
            &window_pairs(window),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn get_collection_entities(
        &self,
        collection_id: &str,
        file_id: &str,
        segments: ItemRange,
    ) -> Result<Option<EntityArtifact>> {
        self.get_optional(
            &["collections", collection_id, "videos", file_id, "entities"],
            &segment_pairs(segments),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn list_collection_summaries(
        &self,
        collection_id: &str,
        collection_type: CollectionType,
        query: &ListQuery,
    ) -> Result<Page<SummaryItem>> {
        let artifact = text_endpoint(collection_type)?;
        let pairs = list_pairs(query, "added_after", "added_before");
        self.get(&["collections", collection_id, artifact], &pairs)
            .await
    }

    #[instrument(skip(self))]
    async fn get_file(&self, file_id: &str) -> Result<Option<FileInfo>> {
        self.get_optional(&["files", file_id], &Vec::new()).await
    }

    #[instrument(skip(self))]
    async fn list_files(&self, query: &ListQuery) -> Result<Page<FileInfo>> {
        let pairs = list_pairs(query, "created_after", "created_before");
        self.get(&["files"], &pairs).await
    }

    #[instrument(skip(self), fields(kind = %request.kind()))]
    async fn submit_job(&self, request: &JobRequest) -> Result<JobHandle> {
        let body = match request {
            JobRequest::Describe(config) => serde_json::to_value(config)?,
            JobRequest::Extract(config) => serde_json::to_value(config)?,
            JobRequest::Segment(config) => match config.criteria {
                SegmentCriteria::Shot => json!({
                    "url": config.url,
                    "criteria": "shot",
                }),
                SegmentCriteria::Narrative => {
                    let mut narrative = json!({});
                    if let Some(prompt) = &config.prompt {
                        narrative["prompt"] = json!(prompt);
                    }
                    json!({
                        "url": config.url,
                        "criteria": "narrative",
                        "narrative_config": narrative,
                    })
                }
            },
        };
        self.post(&[job_endpoint(request.kind())], &body).await
    }

    #[instrument(skip(self))]
    async fn job_status(&self, kind: JobKind, job_id: &str) -> Result<JobHandle> {
        self.get(&[job_endpoint(kind), job_id], &Vec::new()).await
    }

    #[instrument(skip(self))]
    async fn find_jobs(&self, kind: JobKind, filter: &JobFilter) -> Result<Vec<JobRecord>> {
        let mut pairs = vec![
            ("url", filter.url.clone()),
            ("status", filter.status.as_str().to_string()),
            ("limit", filter.limit.to_string()),
        ];
        if let Some(criteria) = filter.criteria {
            let value = match criteria {
                SegmentCriteria::Shot => "shot",
                SegmentCriteria::Narrative => "narrative",
            };
            pairs.push(("criteria", value.to_string()));
        }

        let page: Page<Value> = self.get(&[job_endpoint(kind)], &pairs).await?;
        page.data.into_iter().map(job_record).collect()
    }

    #[instrument(skip(self))]
    async fn get_description(
        &self,
        job_id: &str,
        window: Option<TimeRange>,
    ) -> Result<TextArtifact> {
        let response: DescribeResponse = self
            .get(&["describe", job_id], &window_pairs(window))
            .await?;
        let mut artifact = response.data.unwrap_or_default();
        if artifact.duration_seconds.is_none() {
            artifact.duration_seconds = response.duration_seconds;
        }
        Ok(artifact)
    }

    #[instrument(skip(self))]
    async fn get_extraction(&self, job_id: &str, segments: ItemRange) -> Result<EntityArtifact> {
        let response: ExtractResponse = self
            .get(&["extract", job_id], &segment_pairs(segments))
            .await?;
        Ok(response.data.unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn get_segmentation(&self, job_id: &str) -> Result<Vec<Segment>> {
        let response: SegmentsResponse = self.get(&["segments", job_id], &Vec::new()).await?;
        Ok(response
            .segments
            .or_else(|| response.data.map(|d| d.segments))
            .unwrap_or_default())
    }

    #[instrument(skip(self, request), fields(scope = ?request.scope))]
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        let response: SearchResponse = self.post(&["search"], request).await?;
        Ok(response.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpVideoApi {
        HttpVideoApi::new(base, "key", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_and_encodes() {
        let api = client("https://api.example.com/v1");
        assert_eq!(
            api.endpoint(&["collections", "c 1", "videos"]).as_str(),
            "https://api.example.com/v1/collections/c%201/videos"
        );

        let trailing = client("https://api.example.com/v1/");
        assert_eq!(
            trailing.endpoint(&["files", "f1"]).as_str(),
            "https://api.example.com/v1/files/f1"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(HttpVideoApi::new("not a url", "k", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let settings = ApiSettings {
            api_key_env: "GLIMT_TEST_MISSING_KEY".to_string(),
            api_key: None,
            ..ApiSettings::default()
        };
        assert!(matches!(
            HttpVideoApi::from_settings(&settings),
            Err(GlimtError::Config(_))
        ));
    }

    #[test]
    fn test_job_record_hoists_narrative_prompt() {
        let record = job_record(json!({
            "job_id": "seg_1",
            "status": "completed",
            "criteria": "narrative",
            "narrative_config": { "prompt": "chapters by topic" }
        }))
        .unwrap();
        assert_eq!(record.prompt.as_deref(), Some("chapters by topic"));
        assert_eq!(record.criteria, Some(SegmentCriteria::Narrative));
    }

    #[test]
    fn test_list_pairs_dates() {
        let after = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let query = ListQuery {
            limit: 25,
            offset: 50,
            created_after: Some(after),
            created_before: None,
        };
        let pairs = list_pairs(&query, "added_after", "added_before");
        assert!(pairs.contains(&("offset", "50".to_string())));
        assert!(pairs.contains(&("added_after", "2024-01-01T00:00:00.000Z".to_string())));
    }
}
