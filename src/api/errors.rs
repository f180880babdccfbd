//! Error taxonomy for the admin backend client.
//!
//! The three variants match the ways a request can go wrong; all of them
//! collapse to a human-readable cause string at the coordinator boundary,
//! since the admin-facing report never needs the distinction.

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a readable response (DNS, connect,
    /// timeout, mid-body disconnect).
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Non-2xx response. The message comes from the JSON body's
    /// `error`/`detail` field when parseable, else the HTTP status text.
    #[error("backend error ({status}): {message}")]
    Upstream { status: u16, message: String },
    /// 2xx response whose body did not match the expected shape.
    #[error("malformed response from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: anyhow::Error,
    },
}
