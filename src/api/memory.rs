//! In-memory video API implementation.
//!
//! Useful for testing and offline development. Every call is recorded so
//! tests can assert which remote operations a tool issued.

use super::models::*;
use super::VideoApi;
use crate::error::{GlimtError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// What happens to jobs submitted to a [`MemoryVideoApi`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Jobs complete on the first status poll.
    Complete,
    /// Jobs end in `failed`.
    Fail,
    /// Jobs stay `processing` forever.
    NeverFinish,
}

/// Results handed out for newly submitted jobs.
#[derive(Debug, Clone, Default)]
struct NewJobResults {
    description: TextArtifact,
    extraction: EntityArtifact,
    segments: Vec<Segment>,
}

#[derive(Debug)]
struct StoredJob {
    kind: JobKind,
    status: JobStatus,
}

#[derive(Debug)]
struct State {
    collections: Vec<Collection>,
    collection_videos: HashMap<String, Vec<CollectionVideo>>,
    collection_text: HashMap<(String, String), TextArtifact>,
    collection_entities: HashMap<(String, String), EntityArtifact>,
    summaries: HashMap<String, Vec<SummaryItem>>,
    files: Vec<FileInfo>,
    /// Most recent first.
    job_records: Vec<(JobKind, JobRecord)>,
    jobs: HashMap<String, StoredJob>,
    descriptions: HashMap<String, TextArtifact>,
    extractions: HashMap<String, EntityArtifact>,
    segmentations: HashMap<String, Vec<Segment>>,
    search_hits: Vec<SearchHit>,
    new_results: NewJobResults,
    outcome: JobOutcome,
    next_job: u32,
    failing: HashSet<&'static str>,
    calls: Vec<&'static str>,
    submitted: Vec<JobRequest>,
    text_windows: Vec<Option<TimeRange>>,
    segment_ranges: Vec<ItemRange>,
    searches: Vec<SearchRequest>,
}

/// In-memory [`VideoApi`].
pub struct MemoryVideoApi {
    state: Mutex<State>,
}

impl MemoryVideoApi {
    /// Create an empty API whose new jobs complete immediately.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                collections: Vec::new(),
                collection_videos: HashMap::new(),
                collection_text: HashMap::new(),
                collection_entities: HashMap::new(),
                summaries: HashMap::new(),
                files: Vec::new(),
                job_records: Vec::new(),
                jobs: HashMap::new(),
                descriptions: HashMap::new(),
                extractions: HashMap::new(),
                segmentations: HashMap::new(),
                search_hits: Vec::new(),
                new_results: NewJobResults::default(),
                outcome: JobOutcome::Complete,
                next_job: 1,
                failing: HashSet::new(),
                calls: Vec::new(),
                submitted: Vec::new(),
                text_windows: Vec::new(),
                segment_ranges: Vec::new(),
                searches: Vec::new(),
            }),
        }
    }

    pub fn add_collection(&self, id: &str, collection_type: &str) {
        self.state.lock().unwrap().collections.push(Collection {
            id: id.to_string(),
            name: Some(format!("Collection {}", id)),
            description: None,
            collection_type: collection_type.to_string(),
            created_at: None,
            file_count: None,
        });
    }

    pub fn add_collection_video(&self, collection_id: &str, video: CollectionVideo) {
        self.state
            .lock()
            .unwrap()
            .collection_videos
            .entry(collection_id.to_string())
            .or_default()
            .push(video);
    }

    pub fn add_collection_text(&self, collection_id: &str, file_id: &str, artifact: TextArtifact) {
        self.state
            .lock()
            .unwrap()
            .collection_text
            .insert((collection_id.to_string(), file_id.to_string()), artifact);
    }

    pub fn add_collection_entities(
        &self,
        collection_id: &str,
        file_id: &str,
        artifact: EntityArtifact,
    ) {
        self.state
            .lock()
            .unwrap()
            .collection_entities
            .insert((collection_id.to_string(), file_id.to_string()), artifact);
    }

    pub fn add_summary(&self, collection_id: &str, item: SummaryItem) {
        self.state
            .lock()
            .unwrap()
            .summaries
            .entry(collection_id.to_string())
            .or_default()
            .push(item);
    }

    pub fn add_file(&self, file: FileInfo) {
        self.state.lock().unwrap().files.push(file);
    }

    /// Register a completed prior job together with its results.
    pub fn add_prior_job(&self, kind: JobKind, record: JobRecord) {
        let mut state = self.state.lock().unwrap();
        state.jobs.insert(
            record.job_id.clone(),
            StoredJob {
                kind,
                status: record.status,
            },
        );
        state.job_records.insert(0, (kind, record));
    }

    pub fn set_description(&self, job_id: &str, artifact: TextArtifact) {
        self.state
            .lock()
            .unwrap()
            .descriptions
            .insert(job_id.to_string(), artifact);
    }

    pub fn set_extraction(&self, job_id: &str, artifact: EntityArtifact) {
        self.state
            .lock()
            .unwrap()
            .extractions
            .insert(job_id.to_string(), artifact);
    }

    pub fn set_segmentation(&self, job_id: &str, segments: Vec<Segment>) {
        self.state
            .lock()
            .unwrap()
            .segmentations
            .insert(job_id.to_string(), segments);
    }

    pub fn set_search_hits(&self, hits: Vec<SearchHit>) {
        self.state.lock().unwrap().search_hits = hits;
    }

    /// Results returned for jobs submitted from now on.
    pub fn set_new_description(&self, artifact: TextArtifact) {
        self.state.lock().unwrap().new_results.description = artifact;
    }

    pub fn set_new_extraction(&self, artifact: EntityArtifact) {
        self.state.lock().unwrap().new_results.extraction = artifact;
    }

    pub fn set_new_segments(&self, segments: Vec<Segment>) {
        self.state.lock().unwrap().new_results.segments = segments;
    }

    pub fn set_job_outcome(&self, outcome: JobOutcome) {
        self.state.lock().unwrap().outcome = outcome;
    }

    /// Make the named trait method return a transport-style error.
    pub fn fail_on(&self, method: &'static str) {
        self.state.lock().unwrap().failing.insert(method);
    }

    /// Names of all trait methods called, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == method)
            .count()
    }

    pub fn submitted(&self) -> Vec<JobRequest> {
        self.state.lock().unwrap().submitted.clone()
    }

    /// Windows requested from text endpoints, in order.
    pub fn text_windows(&self) -> Vec<Option<TimeRange>> {
        self.state.lock().unwrap().text_windows.clone()
    }

    pub fn segment_ranges(&self) -> Vec<ItemRange> {
        self.state.lock().unwrap().segment_ranges.clone()
    }

    pub fn searches(&self) -> Vec<SearchRequest> {
        self.state.lock().unwrap().searches.clone()
    }

    /// Record a call and apply any configured failure.
    fn enter(&self, method: &'static str) -> Result<std::sync::MutexGuard<'_, State>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(method);
        if state.failing.contains(method) {
            return Err(GlimtError::Api {
                status: 503,
                message: format!("{} unavailable", method),
            });
        }
        Ok(state)
    }
}

impl Default for MemoryVideoApi {
    fn default() -> Self {
        Self::new()
    }
}

fn windowed(artifact: &TextArtifact, window: Option<TimeRange>) -> TextArtifact {
    match window {
        Some(w) => TextArtifact {
            content: format!("[{:.0}-{:.0}] {}", w.start, w.end, artifact.content),
            duration_seconds: artifact.duration_seconds,
        },
        None => artifact.clone(),
    }
}

fn slice_segments(artifact: &EntityArtifact, range: ItemRange) -> EntityArtifact {
    let total = artifact.segment_entities.len();
    let start = (range.offset as usize).min(total);
    let end = (start + range.limit as usize).min(total);
    EntityArtifact {
        entities: artifact.entities.clone(),
        segment_entities: artifact.segment_entities[start..end].to_vec(),
        total_segment_entities: Some(total as u64),
    }
}

fn page_of<T: Clone>(items: &[T], limit: u32, offset: u64) -> Page<T> {
    let total = items.len();
    let start = (offset as usize).min(total);
    let end = (start + limit as usize).min(total);
    Page {
        data: items[start..end].to_vec(),
        total: Some(total as u64),
        limit: Some(limit),
        offset: Some(offset),
    }
}

fn within(ts: Option<&chrono::DateTime<chrono::Utc>>, query: &ListQuery) -> bool {
    match ts {
        Some(ts) => {
            query.created_after.map_or(true, |a| *ts > a)
                && query.created_before.map_or(true, |b| *ts < b)
        }
        None => query.created_after.is_none() && query.created_before.is_none(),
    }
}

fn not_found(what: &str) -> GlimtError {
    GlimtError::Api {
        status: 404,
        message: format!("{} not found", what),
    }
}

#[async_trait]
impl VideoApi for MemoryVideoApi {
    async fn list_collections(&self, query: &CollectionQuery) -> Result<Page<Collection>> {
        let state = self.enter("list_collections")?;
        let matching: Vec<Collection> = state
            .collections
            .iter()
            .filter(|c| {
                query
                    .collection_type
                    .map_or(true, |t| c.collection_type == t.as_str())
            })
            .cloned()
            .collect();
        Ok(page_of(&matching, query.limit, query.offset))
    }

    async fn get_collection(&self, collection_id: &str) -> Result<Option<Collection>> {
        let state = self.enter("get_collection")?;
        Ok(state
            .collections
            .iter()
            .find(|c| c.id == collection_id)
            .cloned())
    }

    async fn list_collection_videos(
        &self,
        collection_id: &str,
        query: &ListQuery,
    ) -> Result<Page<CollectionVideo>> {
        let state = self.enter("list_collection_videos")?;
        let matching: Vec<CollectionVideo> = state
            .collection_videos
            .get(collection_id)
            .map(|videos| {
                videos
                    .iter()
                    .filter(|v| within(v.added_at.as_ref(), query))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(page_of(&matching, query.limit, query.offset))
    }

    async fn get_collection_text(
        &self,
        collection_id: &str,
        file_id: &str,
        _collection_type: CollectionType,
        window: Option<TimeRange>,
    ) -> Result<Option<TextArtifact>> {
        let mut state = self.enter("get_collection_text")?;
        state.text_windows.push(window);
        Ok(state
            .collection_text
            .get(&(collection_id.to_string(), file_id.to_string()))
            .map(|a| windowed(a, window)))
    }

    async fn get_collection_entities(
        &self,
        collection_id: &str,
        file_id: &str,
        segments: ItemRange,
    ) -> Result<Option<EntityArtifact>> {
        let mut state = self.enter("get_collection_entities")?;
        state.segment_ranges.push(segments);
        Ok(state
            .collection_entities
            .get(&(collection_id.to_string(), file_id.to_string()))
            .map(|a| slice_segments(a, segments)))
    }

    async fn list_collection_summaries(
        &self,
        collection_id: &str,
        _collection_type: CollectionType,
        query: &ListQuery,
    ) -> Result<Page<SummaryItem>> {
        let state = self.enter("list_collection_summaries")?;
        let matching: Vec<SummaryItem> = state
            .summaries
            .get(collection_id)
            .map(|items| {
                items
                    .iter()
                    .filter(|s| within(s.added_at.as_ref(), query))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(page_of(&matching, query.limit, query.offset))
    }

    async fn get_file(&self, file_id: &str) -> Result<Option<FileInfo>> {
        let state = self.enter("get_file")?;
        Ok(state.files.iter().find(|f| f.id == file_id).cloned())
    }

    async fn list_files(&self, query: &ListQuery) -> Result<Page<FileInfo>> {
        let state = self.enter("list_files")?;
        let matching: Vec<FileInfo> = state
            .files
            .iter()
            .filter(|f| within(f.created_at.as_ref(), query))
            .cloned()
            .collect();
        Ok(page_of(&matching, query.limit, query.offset))
    }

    async fn submit_job(&self, request: &JobRequest) -> Result<JobHandle> {
        let mut state = self.enter("submit_job")?;
        state.submitted.push(request.clone());

        let job_id = format!("job_{}", state.next_job);
        state.next_job += 1;

        let kind = request.kind();
        let status = match state.outcome {
            JobOutcome::Complete => JobStatus::Completed,
            JobOutcome::Fail => JobStatus::Failed,
            JobOutcome::NeverFinish => JobStatus::Processing,
        };
        state.jobs.insert(job_id.clone(), StoredJob { kind, status });

        let results = state.new_results.clone();
        state.descriptions.insert(job_id.clone(), results.description.clone());
        state.extractions.insert(job_id.clone(), results.extraction);
        state.segmentations.insert(job_id.clone(), results.segments);

        let (prompt, criteria, video_level, segment_level) = match request {
            JobRequest::Describe(_) => (None, None, None, None),
            JobRequest::Extract(c) => (
                Some(c.prompt.clone()),
                None,
                Some(c.enable_video_level_entities),
                Some(c.enable_segment_level_entities),
            ),
            JobRequest::Segment(c) => (c.prompt.clone(), Some(c.criteria), None, None),
        };
        let record = JobRecord {
            job_id: job_id.clone(),
            status,
            url: Some(request.url().to_string()),
            created_at: None,
            duration_seconds: results.description.duration_seconds,
            prompt,
            criteria,
            enable_video_level_entities: video_level,
            enable_segment_level_entities: segment_level,
        };
        state.job_records.insert(0, (kind, record));

        Ok(JobHandle {
            job_id,
            status: JobStatus::Pending,
            duration_seconds: None,
        })
    }

    async fn job_status(&self, kind: JobKind, job_id: &str) -> Result<JobHandle> {
        let state = self.enter("job_status")?;
        let job = state
            .jobs
            .get(job_id)
            .filter(|j| j.kind == kind)
            .ok_or_else(|| not_found(job_id))?;
        Ok(JobHandle {
            job_id: job_id.to_string(),
            status: job.status,
            duration_seconds: state
                .descriptions
                .get(job_id)
                .and_then(|d| d.duration_seconds),
        })
    }

    async fn find_jobs(&self, kind: JobKind, filter: &JobFilter) -> Result<Vec<JobRecord>> {
        let state = self.enter("find_jobs")?;
        Ok(state
            .job_records
            .iter()
            .filter(|(k, r)| {
                *k == kind
                    && r.url.as_deref() == Some(filter.url.as_str())
                    && r.status == filter.status
                    && filter.criteria.map_or(true, |c| r.criteria == Some(c))
            })
            .take(filter.limit as usize)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn get_description(
        &self,
        job_id: &str,
        window: Option<TimeRange>,
    ) -> Result<TextArtifact> {
        let mut state = self.enter("get_description")?;
        state.text_windows.push(window);
        state
            .descriptions
            .get(job_id)
            .map(|a| windowed(a, window))
            .ok_or_else(|| not_found(job_id))
    }

    async fn get_extraction(&self, job_id: &str, segments: ItemRange) -> Result<EntityArtifact> {
        let mut state = self.enter("get_extraction")?;
        state.segment_ranges.push(segments);
        state
            .extractions
            .get(job_id)
            .map(|a| slice_segments(a, segments))
            .ok_or_else(|| not_found(job_id))
    }

    async fn get_segmentation(&self, job_id: &str) -> Result<Vec<Segment>> {
        let state = self.enter("get_segmentation")?;
        state
            .segmentations
            .get(job_id)
            .cloned()
            .ok_or_else(|| not_found(job_id))
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        let mut state = self.enter("search")?;
        state.searches.push(request.clone());
        Ok(state
            .search_hits
            .iter()
            .take(request.limit as usize)
            .cloned()
            .collect())
    }
}
