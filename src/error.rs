use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RfindError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Cannot access '{path}': {source}")]
    EntryIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Accelerated search unavailable: {0}")]
    DelegationUnavailable(String),

    #[error("Search root '{path}' not found: {source}")]
    RootNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write result: {0}")]
    Output(#[source] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl RfindError {
    pub(crate) fn entry(path: impl Into<PathBuf>, source: io::Error) -> Self {
        RfindError::EntryIo {
            path: path.into(),
            source,
        }
    }

    /// True when the consumer on the other end of stdout went away.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, RfindError::Output(e) if e.kind() == io::ErrorKind::BrokenPipe)
    }
}

pub type Result<T> = std::result::Result<T, RfindError>;
