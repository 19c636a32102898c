//! Real-time feed error types.

/// Errors from fetching or decoding a real-time feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The feed rejected our credentials
    #[error("unauthorized: check api_key or x_api_key")]
    Unauthorized,

    /// The feed returned an error status
    #[error("feed error {status}: {message}")]
    Api { status: u16, message: String },

    /// The feed body could not be decoded
    #[error("feed decode error: {message}")]
    Decode { message: String },
}
