//! Error types for history access, flag resolution, and command parsing.

use thiserror::Error;

use crate::checkpoint::FlagKey;

/// Failure reported by the chat platform for a single history or delete call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("rate limited by transport (retry after {retry_after_ms:?} ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("message not found")]
    NotFound,

    #[error("missing permission")]
    Forbidden,

    #[error("transport error: {0}")]
    Transport(String),
}

impl SourceError {
    /// True for rejections a caller may retry after backing off.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SourceError::RateLimited { .. })
    }
}

/// Errors that abort a whole purge operation.
#[derive(Debug, Error)]
pub enum PurgeError {
    #[error("flag not found: {key}")]
    FlagNotFound { key: FlagKey },

    /// History could not be read. `deleted` counts deletions that already
    /// went through before the cursor failed.
    #[error("history fetch failed after {deleted} deletions: {source}")]
    History {
        deleted: usize,
        #[source]
        source: SourceError,
    },
}

pub type Result<T> = std::result::Result<T, PurgeError>;

/// Errors raised while turning command text into a purge request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("invalid target '{0}': expected a user id or 'all'")]
    InvalidTarget(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid count '{0}'")]
    BadCount(String),
}
