//! Root cancellation primitive.
//!
//! A [`ShutdownController`] / [`ShutdownSignal`] pair plays the role of a
//! cancellable context: the controller flips an atomic flag and closes a
//! channel no message is ever sent on, so parked workers wake from
//! `select!` and running workers observe the flag at their next check.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{bounded, Receiver, Sender};

use strafe_core::error::EngineError;

struct Shared {
    cancelled: AtomicBool,
    // Held only so that dropping it closes every cloned receiver.
    keeper: Mutex<Option<Sender<()>>>,
}

/// Cancels the whole runtime. Cheap to clone; `cancel` is idempotent.
#[derive(Clone)]
pub struct ShutdownController {
    shared: Arc<Shared>,
}

/// Read side of the cancellation. Cheap to clone, one per worker.
#[derive(Clone)]
pub struct ShutdownSignal {
    shared: Arc<Shared>,
    done: Receiver<()>,
}

/// Create a fresh controller/signal pair.
pub fn shutdown_channel() -> (ShutdownController, ShutdownSignal) {
    let (tx, rx) = bounded::<()>(0);
    let shared = Arc::new(Shared {
        cancelled: AtomicBool::new(false),
        keeper: Mutex::new(Some(tx)),
    });
    (
        ShutdownController {
            shared: Arc::clone(&shared),
        },
        ShutdownSignal { shared, done: rx },
    )
}

impl ShutdownController {
    /// Flip the flag and wake every parked worker.
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::SeqCst);
        if let Ok(mut keeper) = self.shared.keeper.lock() {
            keeper.take();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }
}

impl ShutdownSignal {
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the controller has fired.
    pub fn check(&self) -> Result<(), EngineError> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Receiver that disconnects on cancellation; for use in `select!`.
    pub fn done(&self) -> &Receiver<()> {
        &self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flips_flag_and_closes_channel() {
        let (controller, signal) = shutdown_channel();
        assert!(!signal.is_cancelled());
        assert!(signal.check().is_ok());

        controller.cancel();
        assert!(signal.is_cancelled());
        assert_eq!(signal.check(), Err(EngineError::Cancelled));
        // Closed channel: recv returns immediately with an error.
        assert!(signal.done().recv().is_err());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let (controller, signal) = shutdown_channel();
        controller.cancel();
        controller.cancel();
        assert!(signal.is_cancelled());
    }

    #[test]
    fn test_cloned_signals_all_observe_cancel() {
        let (controller, signal) = shutdown_channel();
        let a = signal.clone();
        let b = signal.clone();
        controller.clone().cancel();
        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
        assert!(b.done().recv().is_err());
    }
}
