use std::path::PathBuf;

use serde::Serialize;

/// The sound library could not be consulted. Treated as "no sound" by the
/// scheduler.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("sound library io error: {0}")]
    Io(#[from] std::io::Error),
    /// Clips exist but none of them could be read as tagged audio.
    #[error("no readable clip in {path}: {reason}")]
    Metadata { path: PathBuf, reason: String },
    #[error("sound library task failed: {0}")]
    Join(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// Decoding could not start: missing file, unknown container, no audio
    /// track, or nothing decodable.
    #[error("asset {path} is unreadable: {reason}")]
    AssetUnreadable { path: PathBuf, reason: String },
    #[error("codec failure: {0}")]
    CodecFailure(String),
    /// The session already reported end-of-stream or was released.
    #[error("mix session has ended")]
    SessionEnded,
}

impl AudioError {
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::AssetUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<audiopus::Error> for AudioError {
    fn from(e: audiopus::Error) -> Self {
        Self::CodecFailure(e.to_string())
    }
}

/// Opening, moving or closing a voice connection failed.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("no voice connection for guild {0}")]
    NotConnected(crate::common::GuildId),
    #[error("voice socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("voice connection closed")]
    Closed,
    #[error("source frames must be pre-encoded")]
    RawSource,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("scheduler task failed: {0}")]
    Join(String),
}

/// JSON error body returned by the HTTP surface.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    pub status: u16,
    /// Reason phrase, e.g. "Bad Request".
    pub error: String,
    pub message: String,
    pub path: String,
}

impl ApiError {
    fn new(status: u16, error: &str, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            timestamp: crate::server::now_ms(),
            status,
            error: error.into(),
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(400, "Bad Request", message, path)
    }

    pub fn not_found(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(404, "Not Found", message, path)
    }

    pub fn unavailable(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(503, "Service Unavailable", message, path)
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = axum::http::StatusCode::from_u16(self.status)
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        (status, axum::Json(self)).into_response()
    }
}
