//! The uniform subsystem lifecycle.
//!
//! Every subsystem goes through `initialize` -> repeated `update(dt)` ->
//! `shutdown`. `update` must return [`EngineError::Cancelled`] once the
//! root signal has fired, drain its subscriptions in bounded batches and
//! advance owned state by exactly `dt`.

use strafe_core::constants::DRAIN_BATCH;
use strafe_core::error::EngineError;
use strafe_core::events::Event;

use crate::bus::Subscription;
use crate::shutdown::ShutdownSignal;

pub trait Subsystem: Send {
    /// Stable name, used for worker thread naming and error reporting.
    fn name(&self) -> &'static str;

    /// Store the cancellation signal and set up subscriptions.
    fn initialize(&mut self, signal: ShutdownSignal) -> Result<(), EngineError>;

    /// Advance owned state by one fixed timestep.
    fn update(&mut self, dt: f64) -> Result<(), EngineError>;

    /// Unsubscribe and release owned collections. Must be idempotent.
    fn shutdown(&mut self);
}

/// Drain up to [`DRAIN_BATCH`] pending events from one subscription.
///
/// The bound prevents a fast publisher from livelocking a subscriber that
/// drains inside its tick.
pub fn drain(subscription: &Subscription) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..DRAIN_BATCH {
        match subscription.try_recv() {
            Some(event) => events.push(event),
            None => break,
        }
    }
    events
}

/// Cancellation check for subsystems that keep the signal as an `Option`.
pub fn check_cancelled(signal: &Option<ShutdownSignal>) -> Result<(), EngineError> {
    match signal {
        Some(signal) => signal.check(),
        None => Ok(()),
    }
}
