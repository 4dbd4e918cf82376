//! Error types for input synthesis and interception.

use thiserror::Error;

/// Result type alias for inputkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while posting or intercepting input events.
///
/// Unmapped characters and double start/stop of a listener are no-ops, not
/// errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The OS refused to create the event tap.
    ///
    /// On macOS this almost always means the process has not been granted
    /// the Accessibility (or Input Monitoring) permission.
    #[error("failed to create event tap: {0}")]
    TapCreateFailed(String),

    /// A blocking run was requested while the listener is already active.
    #[error("listener is already running")]
    AlreadyRunning,

    /// The tap was created but could not be attached to a run loop.
    #[error("failed to start listener: {0}")]
    HookStartFailed(String),

    /// Failed to create or post a synthetic event.
    #[error("failed to simulate event: {0}")]
    SimulateFailed(String),

    /// Thread-related error (spawn, join, poisoned lock).
    #[error("thread error: {0}")]
    ThreadError(String),

    /// No system event backend exists for this platform.
    #[error("not supported: {0}")]
    NotSupported(String),
}
