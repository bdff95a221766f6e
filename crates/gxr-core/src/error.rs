//! Common error types for gxr.

use thiserror::Error;

/// Result type alias using gxr's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for gxr operations.
///
/// Per-poll transient failures (one hand unreadable for one frame, a stale
/// device pose) are logged and skipped by the poll loops and never show up
/// here. Everything in this enum is fatal to the operation that returned it;
/// there is no automatic retry anywhere.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (cache dir, manifest files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Action or binding manifest could not be parsed
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Action URL could not be turned into a runtime-internal name
    #[error("invalid action url: {0}")]
    InvalidUrl(String),

    /// The runtime rejected creating an action, action set or action space
    #[error("action creation failed: {0}")]
    ActionCreation(String),

    /// Action-set synchronization was rejected by the runtime
    #[error("action sync failed: {0}")]
    Sync(String),

    /// Operation called in the wrong context/session lifecycle state
    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    /// Error reported by the backend runtime
    #[error("backend error: {0}")]
    Backend(String),

    /// The selected backend API has no implementation available
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl Error {
    /// Create a manifest error from any displayable type.
    pub fn manifest(msg: impl std::fmt::Display) -> Self {
        Self::Manifest(msg.to_string())
    }

    /// Create a backend error from any displayable type.
    pub fn backend(msg: impl std::fmt::Display) -> Self {
        Self::Backend(msg.to_string())
    }

    /// Create a lifecycle error from any displayable type.
    pub fn lifecycle(msg: impl std::fmt::Display) -> Self {
        Self::Lifecycle(msg.to_string())
    }
}
