use std::time::Duration;

use thiserror::Error;

/// Failure of one zone source. Recovered by falling back to the next source.
#[derive(Debug, Error)]
pub enum ZoneLookupError {
    #[error("zone service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("zone service returned HTTP {0}")]
    Status(u16),

    #[error("zone payload could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("zone payload schema version {0} is not supported")]
    UnsupportedSchema(u32),

    #[error("zone lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("zone lookup cancelled")]
    Cancelled,

    #[error("zone source unavailable: {0}")]
    Unavailable(String),
}
