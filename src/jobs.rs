//! Job lifecycle: default configurations, submission and bounded waiting.

use crate::api::{
    DescribeConfig, ExtractConfig, JobHandle, JobRequest, JobStatus, SegmentConfig,
    SegmentCriteria, VideoApi,
};
use crate::config::JobSettings;
use crate::error::{GlimtError, Result};
use crate::source::ContentReference;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Describe configuration for a reference.
///
/// Speech is always transcribed. Summaries only make sense for web video
/// hosts; on-screen text and visual scene descriptions are only available
/// for files stored on the platform.
pub fn describe_request(reference: &ContentReference) -> JobRequest {
    let native = reference.is_platform_native();
    JobRequest::Describe(DescribeConfig {
        url: reference.uri().to_string(),
        enable_summary: reference.is_web_video(),
        enable_speech: true,
        enable_scene_text: native,
        enable_visual_scene_description: native,
    })
}

/// Extract configuration. Segment-level extraction is requested off even
/// though segment entities are read back afterwards.
pub fn extract_request(reference: &ContentReference, prompt: &str) -> Result<JobRequest> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(GlimtError::InvalidInput(
            "prompt must not be empty".to_string(),
        ));
    }
    Ok(JobRequest::Extract(ExtractConfig {
        url: reference.uri().to_string(),
        prompt: prompt.to_string(),
        enable_video_level_entities: true,
        enable_segment_level_entities: false,
    }))
}

/// Shot segmentation. Web video hosts are rejected before anything is sent.
pub fn shot_request(reference: &ContentReference) -> Result<JobRequest> {
    if let Some((host, _)) = reference.web_host() {
        return Err(GlimtError::UnsupportedReference(format!(
            "camera shot segmentation does not support {} videos; \
             upload the file or use a direct media URL",
            host
        )));
    }
    Ok(JobRequest::Segment(SegmentConfig {
        url: reference.uri().to_string(),
        criteria: SegmentCriteria::Shot,
        prompt: None,
    }))
}

/// Narrative segmentation with the caller's prompt passed through as-is.
pub fn narrative_request(reference: &ContentReference, prompt: Option<&str>) -> JobRequest {
    JobRequest::Segment(SegmentConfig {
        url: reference.uri().to_string(),
        criteria: SegmentCriteria::Narrative,
        prompt: prompt.map(str::to_string),
    })
}

/// Submits jobs and waits for them to reach a terminal state.
pub struct JobDriver<'a> {
    api: &'a dyn VideoApi,
    poll_interval: Duration,
    max_wait: Duration,
}

impl<'a> JobDriver<'a> {
    pub fn new(api: &'a dyn VideoApi, settings: &JobSettings) -> Self {
        Self::with_timing(api, settings.poll_interval(), settings.max_wait())
    }

    pub fn with_timing(api: &'a dyn VideoApi, poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            api,
            poll_interval,
            max_wait,
        }
    }

    /// Submit a job and wait until it completes.
    ///
    /// Submission failure is [`GlimtError::JobSubmit`]; a failed job is
    /// [`GlimtError::JobFailed`]; running out of time is
    /// [`GlimtError::JobTimeout`]. Nothing is retried.
    #[instrument(skip(self, request), fields(kind = %request.kind(), url = %request.url()))]
    pub async fn submit_and_await(&self, request: &JobRequest) -> Result<JobHandle> {
        let handle = self
            .api
            .submit_job(request)
            .await
            .map_err(|e| GlimtError::JobSubmit(e.to_string()))?;
        info!("Submitted {} job {}", request.kind(), handle.job_id);

        self.await_job(request, handle).await
    }

    async fn await_job(&self, request: &JobRequest, handle: JobHandle) -> Result<JobHandle> {
        let job_id = handle.job_id.clone();
        match tokio::time::timeout(self.max_wait, self.poll_until_terminal(request, handle)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Job {} still running after {:?}", job_id, self.max_wait);
                Err(GlimtError::JobTimeout {
                    job_id,
                    waited_secs: self.max_wait.as_secs(),
                })
            }
        }
    }

    async fn poll_until_terminal(
        &self,
        request: &JobRequest,
        mut handle: JobHandle,
    ) -> Result<JobHandle> {
        let kind = request.kind();
        loop {
            if handle.status.is_terminal() {
                break;
            }
            tokio::time::sleep(self.poll_interval).await;
            handle = self.api.job_status(kind, &handle.job_id).await?;
            debug!("Job {} is {}", handle.job_id, handle.status);
        }

        if handle.status == JobStatus::Completed {
            info!("Job {} completed", handle.job_id);
            Ok(handle)
        } else {
            Err(GlimtError::JobFailed {
                job_id: handle.job_id,
                status: handle.status.to_string(),
            })
        }
    }
}
