use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Media metadata unavailable: {0}")]
    Metadata(String),
    #[error("Decode failed at {timestamp_ms}ms: {reason}")]
    DecodeAt { timestamp_ms: u64, reason: String },
    #[error("Frame encode failed: {0}")]
    Encode(String),
}
