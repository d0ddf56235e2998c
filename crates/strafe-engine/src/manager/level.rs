//! Level manager.
//!
//! [`EventType::LevelEvent`] carries two payload shapes: a `LevelDelta`
//! request to advance, and a `LevelReached` announcement the manager
//! publishes back once the advance is applied. Difficulty scales linearly
//! with the level.

use std::sync::{Arc, Mutex};

use strafe_core::constants::DIFFICULTY_STEP;
use strafe_core::error::EngineError;
use strafe_core::events::{EventPayload, EventType};

use crate::bus::{EventBus, Subscription};
use crate::shutdown::ShutdownSignal;
use crate::subsystem::{check_cancelled, drain, Subsystem};

struct Progress {
    level: i32,
    difficulty: f64,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            level: 1,
            difficulty: 1.0,
        }
    }
}

struct LevelInner {
    bus: EventBus,
    progress: Mutex<Progress>,
    subscription: Mutex<Option<Subscription>>,
    signal: Mutex<Option<ShutdownSignal>>,
}

#[derive(Clone)]
pub struct LevelManager {
    inner: Arc<LevelInner>,
}

impl LevelManager {
    pub fn new(bus: EventBus) -> Self {
        Self {
            inner: Arc::new(LevelInner {
                bus,
                progress: Mutex::new(Progress::default()),
                subscription: Mutex::new(None),
                signal: Mutex::new(None),
            }),
        }
    }

    pub fn level(&self) -> i32 {
        self.inner
            .progress
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .level
    }

    pub fn difficulty(&self) -> f64 {
        self.inner
            .progress
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .difficulty
    }

    /// Advance by `n` levels and announce the level reached. The lock is
    /// released before publishing so subscribers can query back in.
    pub fn advance_level(&self, n: i32) {
        let reached = {
            let mut progress = self
                .inner
                .progress
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            progress.level += n;
            progress.difficulty += DIFFICULTY_STEP * f64::from(n);
            progress.level
        };
        let _ = self
            .inner
            .bus
            .publish(EventType::LevelEvent, EventPayload::LevelReached(reached));
    }
}

impl Subsystem for LevelManager {
    fn name(&self) -> &'static str {
        "level-manager"
    }

    fn initialize(&mut self, signal: ShutdownSignal) -> Result<(), EngineError> {
        let sub = self
            .inner
            .bus
            .subscribe(EventType::LevelEvent)
            .map_err(|e| EngineError::Init {
                subsystem: "level-manager",
                reason: e.to_string(),
            })?;
        *self
            .inner
            .subscription
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(sub);
        *self.inner.signal.lock().unwrap_or_else(|e| e.into_inner()) = Some(signal);
        Ok(())
    }

    fn update(&mut self, _dt: f64) -> Result<(), EngineError> {
        check_cancelled(&self.inner.signal.lock().unwrap_or_else(|e| e.into_inner()))?;
        let sub = self
            .inner
            .subscription
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(sub) = sub.as_ref() {
            for event in drain(sub) {
                if let EventPayload::LevelDelta(n) = event.payload {
                    self.advance_level(n);
                }
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(sub) = self
            .inner
            .subscription
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            self.inner.bus.unsubscribe(&sub);
        }
        *self
            .inner
            .progress
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Progress::default();
    }
}
