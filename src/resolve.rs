//! Reuse of previously computed remote results.
//!
//! Content tools try, in order, the artifact stored in a collection, a
//! completed prior job with the same URL and configuration, and only then a
//! new job. Each lookup reports a [`Lookup`]; misses and transient failures
//! both fall through to the next stage but are logged differently.

use crate::api::{
    CollectionType, JobFilter, JobRecord, JobRequest, JobStatus, SegmentCriteria, VideoApi,
};
use crate::error::{GlimtError, Result};
use crate::source::ContentReference;
use tracing::{debug, warn};

/// Resolver stage, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CheckCollection,
    CheckPriorJob,
    CreateNew,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::CheckCollection => "check_collection",
            Stage::CheckPriorJob => "check_prior_job",
            Stage::CreateNew => "create_new",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of a reuse lookup.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    Miss,
    TransientError(GlimtError),
}

impl<T> Lookup<T> {
    pub fn from_result(result: Result<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => Lookup::Found(value),
            Ok(None) => Lookup::Miss,
            Err(e) => Lookup::TransientError(e),
        }
    }

    /// Like [`Lookup::from_result`] for calls that have no "not found" case.
    pub fn from_fetch(result: Result<T>) -> Self {
        match result {
            Ok(value) => Lookup::Found(value),
            Err(e) => Lookup::TransientError(e),
        }
    }

    /// The found value, or `None` to fall through. Logs the reason.
    pub fn settle(self, stage: Stage, tool: &str) -> Option<T> {
        match self {
            Lookup::Found(value) => {
                debug!(tool, %stage, "reusing existing result");
                Some(value)
            }
            Lookup::Miss => {
                debug!(tool, %stage, "nothing to reuse");
                None
            }
            Lookup::TransientError(e) => {
                warn!(tool, %stage, error = %e, "lookup failed, falling through");
                None
            }
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// A file inside a collection that the collection stage can read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionTarget {
    pub collection_id: String,
    pub file_id: String,
}

/// Pair a collection with a reference. Only platform file references can be
/// looked up inside a collection; anything else is a usage error.
pub fn collection_target(
    collection_id: Option<&str>,
    reference: &ContentReference,
) -> Result<Option<CollectionTarget>> {
    let Some(collection_id) = collection_id.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    let file_id = reference.file_id().ok_or_else(|| {
        GlimtError::InvalidInput(format!(
            "collection_id can only be combined with a {}://files/<file_id> url, got {}",
            crate::source::PLATFORM_SCHEME,
            reference
        ))
    })?;
    Ok(Some(CollectionTarget {
        collection_id: collection_id.to_string(),
        file_id: file_id.to_string(),
    }))
}

/// Look up a collection's type and check that `tool` can read it.
///
/// A collection of the wrong type is an error; a missing or unreachable
/// collection is a lookup outcome the caller falls through on.
pub async fn collection_kind(
    api: &dyn VideoApi,
    collection_id: &str,
    accepted: &[CollectionType],
    tool: &str,
) -> Result<Lookup<CollectionType>> {
    let collection = match Lookup::from_result(api.get_collection(collection_id).await) {
        Lookup::Found(c) => c,
        Lookup::Miss => return Ok(Lookup::Miss),
        Lookup::TransientError(e) => return Ok(Lookup::TransientError(e)),
    };

    match collection.kind() {
        Some(kind) if accepted.contains(&kind) => Ok(Lookup::Found(kind)),
        _ => Err(GlimtError::UnsupportedCollection {
            collection_id: collection_id.to_string(),
            collection_type: collection.collection_type,
            tool: tool.to_string(),
        }),
    }
}

/// Whether a prior job was created with the configuration `request` asks for.
pub fn config_matches(request: &JobRequest, record: &JobRecord) -> bool {
    if record.status != JobStatus::Completed {
        return false;
    }
    if record.url.as_deref().is_some_and(|url| url != request.url()) {
        return false;
    }

    match request {
        // Describe flags are derived from the URL alone.
        JobRequest::Describe(_) => true,
        JobRequest::Extract(c) => {
            record.prompt.as_deref() == Some(c.prompt.as_str())
                && record.enable_video_level_entities == Some(c.enable_video_level_entities)
                && record.enable_segment_level_entities == Some(c.enable_segment_level_entities)
        }
        JobRequest::Segment(c) => {
            record.criteria == Some(c.criteria)
                && match c.criteria {
                    SegmentCriteria::Shot => true,
                    SegmentCriteria::Narrative => {
                        normalized(record.prompt.as_deref()) == normalized(c.prompt.as_deref())
                    }
                }
        }
    }
}

fn normalized(prompt: Option<&str>) -> Option<&str> {
    prompt.map(str::trim).filter(|p| !p.is_empty())
}

/// The most recent completed job for the request's URL, if its
/// configuration matches.
pub async fn find_reusable_job(api: &dyn VideoApi, request: &JobRequest) -> Lookup<JobRecord> {
    let criteria = match request {
        JobRequest::Segment(c) => Some(c.criteria),
        _ => None,
    };
    let filter = JobFilter {
        url: request.url().to_string(),
        status: JobStatus::Completed,
        criteria,
        limit: 1,
    };

    match api.find_jobs(request.kind(), &filter).await {
        Ok(records) => match records.into_iter().next() {
            Some(record) if config_matches(request, &record) => Lookup::Found(record),
            Some(record) => {
                debug!(
                    job_id = %record.job_id,
                    "most recent {} job has a different configuration",
                    request.kind()
                );
                Lookup::Miss
            }
            None => Lookup::Miss,
        },
        Err(e) => Lookup::TransientError(e),
    }
}
