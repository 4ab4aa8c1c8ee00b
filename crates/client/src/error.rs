// crates/client/src/error.rs
use thiserror::Error;

/// Errors from opening a session channel. Once a channel is open, transport
/// faults never surface as errors; the reconnect loop owns them.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("server url must be http:// or https://, got {url}")]
    InvalidUrl { url: String },
}

/// Errors from the session-management HTTP API. Plain request/response; no
/// retry is attempted on any of these.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
