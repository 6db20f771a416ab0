use breeze_core::prelude::AgentBailError;

#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    /// The request could not be built, usually because of a malformed URL. Retrying will not help.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Connection, DNS, TLS or timeout failure, or a body that could not be read.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The server answered with a status outside of 2xx.
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },
}

/// Convert an HTTP client error into an `anyhow::Error` for a behaviour hook.
///
/// Requests that can never succeed become an [AgentBailError] so that the agent stops instead of
/// failing the same way on every iteration. Everything else is an ordinary iteration failure.
pub fn handle_http_err(err: HttpClientError) -> anyhow::Error {
    match err {
        HttpClientError::InvalidRequest(msg) => AgentBailError::new(msg).into(),
        err => anyhow::Error::new(err),
    }
}
