//! Error types for the scheduling core.

use crate::InstanceId;

/// Errors raised by the scheduler and by animation handles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// A zero tick interval was supplied to `subscribe`, `reschedule` or a handle.
    #[error("invalid speed: {speed_ms}ms (must be a positive number of milliseconds)")]
    InvalidSpeed { speed_ms: u32 },
    /// The instance was destroyed or never registered with this scheduler.
    #[error("instance {id} is not registered (destroyed or unknown)")]
    InvalidState { id: InstanceId },
    /// An `animate()` call failed during a frame.
    ///
    /// Never returned to callers; only reported through the log and the
    /// failure hook.
    #[error("animate() failed for instance {id} at {speed_ms}ms: {message}")]
    CallbackFailure {
        id: InstanceId,
        speed_ms: u32,
        message: String,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SchedulerError>;
