//! Error types for the relay.
//!
//! Library code returns these typed errors. Binaries wrap them with `anyhow` context.

use std::fmt::{self, Display, Formatter};

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A required setting is missing, or a setting is present but unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("{0} should be in env")]
    Missing(&'static str),
    #[error("env var {key} has invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferOperation {
    Read,
    Write,
    Delete,
}

impl Display for TransferOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TransferOperation::Read => write!(f, "read"),
            TransferOperation::Write => write!(f, "write"),
            TransferOperation::Delete => write!(f, "delete"),
        }
    }
}

/// A read, write or delete against the storage backend failed.
#[derive(Debug, Error)]
#[error("failed to {operation} object {bucket}/{key}")]
pub struct TransferError {
    pub operation: TransferOperation,
    pub bucket: String,
    pub key: String,
    #[source]
    pub source: BoxError,
}

impl TransferError {
    pub fn new(
        operation: TransferOperation,
        bucket: &str,
        key: &str,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            operation,
            bucket: bucket.to_string(),
            key: key.to_string(),
            source: source.into(),
        }
    }
}

/// Building the archive failed.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to write zip archive")]
    Zip(#[from] zip::result::ZipError),
    #[error("failed to write archive entry")]
    Io(#[from] std::io::Error),
    #[error("archive task did not complete")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}
