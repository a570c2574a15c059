//! Error types for the extraction engine.

use thiserror::Error;

/// Failure resolving or evaluating a structural locator.
///
/// These are recoverable per element: the engine records the locator as
/// errored and carries on with the rest of the page.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LocatorError {
    #[error("Invalid locator syntax: {0}")]
    InvalidSyntax(String),

    #[error("Locator evaluation failed: {0}")]
    Evaluation(String),

    #[error("No node matches locator: {0}")]
    NotFound(String),

    #[error("Node script failed: {0}")]
    Script(String),
}

/// Failure talking to the live browser session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("WebDriver command failed: {0}")]
    Command(String),

    #[error("Browser session lost: {0}")]
    SessionLost(String),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),
}

impl From<fantoccini::error::CmdError> for SessionError {
    fn from(error: fantoccini::error::CmdError) -> Self {
        let message = error.to_string();
        if message.contains("Unable to find session") || message.contains("invalid session id") {
            SessionError::SessionLost(message)
        } else {
            SessionError::Command(message)
        }
    }
}

/// Failure in the dedup/persistence collaborator.
///
/// Returned by [`crate::store::DedupStore`] implementations; any variant
/// aborts the page being extracted.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Dedup store unavailable: {0}")]
    Unavailable(String),

    /// A backing store already holds a different record under the key and
    /// refuses to return it
    #[error("Conflicting record for key {0}")]
    Conflict(String),
}

/// Failure in the optional vision-annotation collaborator.
///
/// Returned by [`crate::vision::VisionAnnotator`] implementations. The
/// engine logs it and keeps the image element with empty annotations.
#[derive(Debug, Error)]
pub enum VisionError {
    /// The annotation service could not be reached or answered with an error
    #[error("Annotation request failed: {0}")]
    Request(String),

    /// The service does not accept the cropped image
    #[error("Unsupported image payload: {0}")]
    Unsupported(String),
}

/// Page-level failure that aborts an extraction pass.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
