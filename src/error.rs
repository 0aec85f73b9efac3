use thiserror::Error;

/// Failure resolving a remote resource.
///
/// Transport covers rejected requests and non-success statuses; Malformed
/// covers bodies that arrived but could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::InvalidUrl { url, .. }
            | FetchError::Transport { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Malformed { url, .. } => url,
        }
    }

    /// Network hiccups and server errors are worth another attempt;
    /// client errors and bad payloads are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => *status >= 500,
            FetchError::InvalidUrl { .. } | FetchError::Malformed { .. } => false,
        }
    }
}

/// Failure bringing the site up.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("failed to load entry page: {0}")]
    EntryPage(#[source] FetchError),

    #[error("entry page {0} has no <main> region")]
    MissingMain(String),
}
