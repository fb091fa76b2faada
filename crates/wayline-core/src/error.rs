//! Error types for mission compilation and document cleaning.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MissionError {
    /// Empty waypoint list or a waypoint the firmware cannot fly.
    #[error("invalid mission: {0}")]
    InvalidMission(String),

    /// Action-group nesting did not balance; nothing was emitted.
    #[error("malformed document at line {line}: action group nesting depth {depth}")]
    MalformedDocument { line: usize, depth: i64 },

    #[error("document encoding failed: {0}")]
    Encoding(String),
}

impl From<quick_xml::Error> for MissionError {
    fn from(err: quick_xml::Error) -> Self {
        MissionError::Encoding(err.to_string())
    }
}

impl From<std::io::Error> for MissionError {
    fn from(err: std::io::Error) -> Self {
        MissionError::Encoding(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for MissionError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        MissionError::Encoding(err.to_string())
    }
}

pub type Result<T, E = MissionError> = std::result::Result<T, E>;
