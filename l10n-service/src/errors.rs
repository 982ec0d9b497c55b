use notion::SourceError;
use thiserror::Error;

/// Errors that abort a sync run. None of them are retried; the first one
/// ends the run and is reported to the caller.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("could not reach {0}")]
    Network(String),

    #[error("malformed JSON payload: {0}")]
    Parse(String),

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("failed to write record {target}: {reason}")]
    Write { target: String, reason: String },

    #[error("could not build archive: {0}")]
    Archive(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl SyncError {
    /// Error class reported in the `error` field of failure responses.
    pub fn class(&self) -> &'static str {
        match self {
            SyncError::Network(_) => "NetworkError",
            SyncError::Parse(_) => "ParseError",
            SyncError::Upstream(_) => "UpstreamError",
            SyncError::Write { .. } => "WriteError",
            SyncError::Archive(_) => "ArchiveError",
            SyncError::NotConfigured(_) => "ConfigError",
        }
    }
}

impl From<SourceError> for SyncError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::Network(e) => SyncError::Network(e.to_string()),
            SourceError::Parse(e) => SyncError::Parse(e.to_string()),
            other => SyncError::Upstream(other.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for SyncError {
    fn from(e: zip::result::ZipError) -> Self {
        SyncError::Archive(e.to_string())
    }
}

/// Errors of the HTTP service itself.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
}
