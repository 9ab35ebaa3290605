use thiserror::Error;

/// Transport-level failure talking to the backend.
///
/// Application failures (`success: false`) are not errors at this layer; they
/// come back as ordinary replies.
#[derive(Debug, Error)]
pub enum ClientError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}
