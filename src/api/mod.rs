//! Video platform API abstraction.
//!
//! [`VideoApi`] is the seam to the remote service. [`HttpVideoApi`] talks to
//! the real REST API; [`MemoryVideoApi`] keeps everything in memory and
//! records calls, which the tests rely on.

mod client;
mod memory;
mod models;

pub use client::HttpVideoApi;
pub use memory::{JobOutcome, MemoryVideoApi};
pub use models::{
    Collection, CollectionQuery, CollectionType, CollectionVideo, DescribeConfig, EntityArtifact,
    ExtractConfig, FileInfo, ItemRange, JobFilter, JobHandle, JobKind, JobRecord, JobRequest,
    JobStatus, ListQuery, Page, SearchHit, SearchRequest, SearchScope, Segment, SegmentConfig,
    SegmentCriteria, SummaryItem, TextArtifact, TimeRange, VideoInfo,
};

use crate::error::Result;
use async_trait::async_trait;

/// Operations offered by the remote video platform.
///
/// Lookup methods returning `Option` map "not found" to `Ok(None)` so the
/// reuse resolver can tell a miss from a failed call.
#[async_trait]
pub trait VideoApi: Send + Sync {
    async fn list_collections(&self, query: &CollectionQuery) -> Result<Page<Collection>>;

    async fn get_collection(&self, collection_id: &str) -> Result<Option<Collection>>;

    async fn list_collection_videos(
        &self,
        collection_id: &str,
        query: &ListQuery,
    ) -> Result<Page<CollectionVideo>>;

    /// Description or transcript stored for a file in a collection.
    async fn get_collection_text(
        &self,
        collection_id: &str,
        file_id: &str,
        collection_type: CollectionType,
        window: Option<TimeRange>,
    ) -> Result<Option<TextArtifact>>;

    /// Entities stored for a file in an entity collection.
    async fn get_collection_entities(
        &self,
        collection_id: &str,
        file_id: &str,
        segments: ItemRange,
    ) -> Result<Option<EntityArtifact>>;

    async fn list_collection_summaries(
        &self,
        collection_id: &str,
        collection_type: CollectionType,
        query: &ListQuery,
    ) -> Result<Page<SummaryItem>>;

    async fn get_file(&self, file_id: &str) -> Result<Option<FileInfo>>;

    async fn list_files(&self, query: &ListQuery) -> Result<Page<FileInfo>>;

    async fn submit_job(&self, request: &JobRequest) -> Result<JobHandle>;

    async fn job_status(&self, kind: JobKind, job_id: &str) -> Result<JobHandle>;

    /// Prior jobs matching the filter, most recent first.
    async fn find_jobs(&self, kind: JobKind, filter: &JobFilter) -> Result<Vec<JobRecord>>;

    async fn get_description(&self, job_id: &str, window: Option<TimeRange>)
        -> Result<TextArtifact>;

    async fn get_extraction(&self, job_id: &str, segments: ItemRange) -> Result<EntityArtifact>;

    async fn get_segmentation(&self, job_id: &str) -> Result<Vec<Segment>>;

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>>;
}
