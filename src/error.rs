use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WrapError {
    #[error("No job id given. Set JOB_ID or pass --job-id.")]
    MissingJobId,

    #[error("Invalid job id {0:?}: must be a non-empty file name")]
    InvalidJobId(String),

    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt status file {}: line {line:?} is not an exit status", path.display())]
    CorruptStatusFile { path: PathBuf, line: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WrapError>;
