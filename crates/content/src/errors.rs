use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Content store unreachable: {0}")]
    Transport(String),

    #[error("Content store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid content store response: {0}")]
    InvalidResponse(String),

    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for ContentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ContentError::InvalidResponse(err.to_string())
        } else {
            ContentError::Transport(err.to_string())
        }
    }
}

/// Fingerprinting could not complete; never to be read as "untampered".
#[derive(Error, Debug)]
pub enum IntegrityError {
    #[error("Integrity check failed: {0}")]
    IntegrityCheckFailed(#[source] ContentError),
}

pub type Result<T> = std::result::Result<T, ContentError>;
