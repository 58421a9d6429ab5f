use std::path::PathBuf;

use thiserror::Error;

/// Failures that cross the crate boundary. Parse problems never appear here:
/// unrecognized lines are skipped and the diagram renders partially.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to persist override store at {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write document at {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unreadable document at {path}: {reason}")]
    Document { path: PathBuf, reason: String },
}
