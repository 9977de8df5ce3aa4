use thiserror::Error;

use statusfeed_storage::StorageError;
use statusfeed_warehouse::WarehouseError;

use crate::feed::FeedError;

/// Coarse failure category of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Feed fetch or fingerprint read failed.
    Transport,
    /// Feed or record JSON malformed.
    Decode,
    /// Load job rejected, failed, or finished with an error.
    Load,
    /// Fingerprint write failed.
    Persist,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Decode => "decode",
            ErrorKind::Load => "load",
            ErrorKind::Persist => "persist",
        }
    }
}

/// Terminal failure of one invocation. Nothing is retried.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("reading stored fingerprint: {0}")]
    FingerprintRead(#[source] StorageError),

    #[error("fetching feed: {0}")]
    Feed(#[from] FeedError),

    #[error("decoding feed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("loading into warehouse: {0}")]
    Load(#[from] WarehouseError),

    #[error("persisting fingerprint: {0}")]
    Persist(#[source] StorageError),
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::FingerprintRead(_) | IngestError::Feed(_) => ErrorKind::Transport,
            IngestError::Decode(_) => ErrorKind::Decode,
            IngestError::Load(_) => ErrorKind::Load,
            IngestError::Persist(_) => ErrorKind::Persist,
        }
    }
}
