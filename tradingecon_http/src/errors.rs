//! Error types for the fetch client.

/// Errors that can occur when fetching a page.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The host's robots.txt disallows the requested path. No request was sent.
    #[error("Blocked by robots.txt: {url}")]
    RobotsBlocked { url: String },
    /// Every attempt failed with a server error or a network error.
    #[error("Request to {url} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last: String,
    },
    /// The server answered with a non-retryable, non-success status.
    #[error("Request to {url} failed with status {status}")]
    RequestFailed { url: String, status: u16 },
    /// The URL could not be parsed or has no host.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// The underlying HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl Error {
    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}
