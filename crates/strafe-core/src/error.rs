//! Error taxonomy for the runtime.
//!
//! Subsystems never panic; every fallible path returns one of these kinds.
//! `Cancelled` is the normal shutdown path and collapses to exit code 0 at
//! the process boundary; everything else is fatal.

use thiserror::Error;

use crate::events::EventType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Root cancellation observed; unwind via `shutdown`.
    #[error("cancelled")]
    Cancelled,

    /// The bus inbound queue was full; the publisher decides whether to retry.
    #[error("event queue full publishing {event_type:?}")]
    QueueFull { event_type: EventType },

    /// A subsystem failed to set up (subscription, worker spawn, ...).
    #[error("{subsystem} failed to initialize: {reason}")]
    Init {
        subsystem: &'static str,
        reason: String,
    },

    /// A subsystem's `update` failed for a non-cancellation reason.
    #[error("{subsystem} update failed: {reason}")]
    Update {
        subsystem: &'static str,
        reason: String,
    },
}

impl EngineError {
    /// True for the normal shutdown path.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Cancelled)
    }
}
