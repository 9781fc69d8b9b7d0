//! Error types for Glimt.

use thiserror::Error;

/// Library-level error type for Glimt operations.
#[derive(Error, Debug)]
pub enum GlimtError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported content reference: {0}")]
    UnsupportedReference(String),

    #[error("Collection {collection_id} has type '{collection_type}', which {tool} cannot read")]
    UnsupportedCollection {
        collection_id: String,
        collection_type: String,
        tool: String,
    },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Job submission failed: {0}")]
    JobSubmit(String),

    #[error("Job {job_id} did not complete (status: {status})")]
    JobFailed { job_id: String, status: String },

    #[error("Job {job_id} did not complete within {waited_secs}s; it may still finish server-side")]
    JobTimeout { job_id: String, waited_secs: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GlimtError {
    /// Whether the caller's input caused this error. Usage errors are
    /// reported immediately and never worth re-invoking unchanged.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            GlimtError::InvalidInput(_)
                | GlimtError::UnsupportedReference(_)
                | GlimtError::UnsupportedCollection { .. }
        )
    }
}

/// Result type alias for Glimt operations.
pub type Result<T> = std::result::Result<T, GlimtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_classification() {
        assert!(GlimtError::InvalidInput("x".into()).is_usage());
        assert!(GlimtError::UnsupportedReference("x".into()).is_usage());
        assert!(!GlimtError::JobSubmit("x".into()).is_usage());
        assert!(!GlimtError::JobTimeout {
            job_id: "j".into(),
            waited_secs: 5
        }
        .is_usage());
    }

    #[test]
    fn test_job_failure_messages_are_distinct() {
        let failed = GlimtError::JobFailed {
            job_id: "job_1".into(),
            status: "failed".into(),
        };
        let timeout = GlimtError::JobTimeout {
            job_id: "job_1".into(),
            waited_secs: 30,
        };
        assert!(failed.to_string().contains("status: failed"));
        assert!(timeout.to_string().contains("within 30s"));
    }
}
