//! Ingestion error types.

use thiserror::Error;

/// A listing could not be retrieved. Aborts the whole Collect run.
#[derive(Debug, Error)]
#[error("Failed to fetch {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    /// HTTP status when the server answered.
    pub status: Option<u16>,
    pub cause: String,
}

impl FetchError {
    pub fn transport(url: impl Into<String>, cause: impl ToString) -> Self {
        Self { url: url.into(), status: None, cause: cause.to_string() }
    }

    pub fn status(url: impl Into<String>, status: u16, cause: impl ToString) -> Self {
        Self { url: url.into(), status: Some(status), cause: cause.to_string() }
    }
}

/// Failure of one topic inside a run. Logged and collected, never propagated
/// past the topic.
#[derive(Debug, Error)]
pub enum TopicError {
    #[error("Artifact read failed: {0}")]
    Parse(#[from] arxivdigest_artifacts::ParseError),

    #[error("Artifact render failed: {0}")]
    Render(#[from] arxivdigest_artifacts::RenderError),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
