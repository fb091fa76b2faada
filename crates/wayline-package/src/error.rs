use thiserror::Error;
use wayline_core::MissionError;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("packaging failed: {0}")]
    Packaging(String),

    #[error("corrupt mission package: {0}")]
    CorruptPackage(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Mission(#[from] MissionError),

    #[error("container rejected by format checker: {}", .0.join("; "))]
    ContainerRejected(Vec<String>),

    #[error("mission enters restricted airspace: {}", .zones.join(", "))]
    Blocked { zones: Vec<String> },
}

impl From<zip::result::ZipError> for PackageError {
    fn from(err: zip::result::ZipError) -> Self {
        PackageError::CorruptPackage(err.to_string())
    }
}

pub type Result<T, E = PackageError> = std::result::Result<T, E>;
