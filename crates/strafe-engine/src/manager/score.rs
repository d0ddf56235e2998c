//! Score manager.
//!
//! Applies [`EventType::ScoreEvent`] deltas and tracks the session high
//! score. The high score only ever rises; a reset (direct call or a
//! [`EventType::ScoreReset`] event) zeroes the running score without
//! touching it.

use std::sync::{Arc, Mutex};

use strafe_core::error::EngineError;
use strafe_core::events::{EventPayload, EventType};

use crate::bus::{EventBus, Subscription};
use crate::shutdown::ShutdownSignal;
use crate::subsystem::{check_cancelled, drain, Subsystem};

#[derive(Default)]
struct Scores {
    score: i64,
    high_score: i64,
}

struct ScoreInner {
    bus: EventBus,
    scores: Mutex<Scores>,
    subscriptions: Mutex<Vec<Subscription>>,
    signal: Mutex<Option<ShutdownSignal>>,
}

#[derive(Clone)]
pub struct ScoreManager {
    inner: Arc<ScoreInner>,
}

impl ScoreManager {
    pub fn new(bus: EventBus) -> Self {
        Self {
            inner: Arc::new(ScoreInner {
                bus,
                scores: Mutex::new(Scores::default()),
                subscriptions: Mutex::new(Vec::new()),
                signal: Mutex::new(None),
            }),
        }
    }

    pub fn score(&self) -> i64 {
        self.inner
            .scores
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .score
    }

    pub fn high_score(&self) -> i64 {
        self.inner
            .scores
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .high_score
    }

    /// Apply a signed delta. The high score ratchets up only.
    pub fn add_score(&self, delta: i64) {
        let mut scores = self.inner.scores.lock().unwrap_or_else(|e| e.into_inner());
        scores.score += delta;
        if scores.score > scores.high_score {
            scores.high_score = scores.score;
        }
    }

    /// Zero the running score for a new run. The high score is preserved.
    /// Observers are told via a zero-delta score event.
    pub fn reset_score(&self) {
        {
            let mut scores = self.inner.scores.lock().unwrap_or_else(|e| e.into_inner());
            scores.score = 0;
        }
        let _ = self
            .inner
            .bus
            .publish(EventType::ScoreEvent, EventPayload::ScoreDelta(0));
    }
}

impl Subsystem for ScoreManager {
    fn name(&self) -> &'static str {
        "score-manager"
    }

    fn initialize(&mut self, signal: ShutdownSignal) -> Result<(), EngineError> {
        let mut subs = self
            .inner
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for event_type in [EventType::ScoreEvent, EventType::ScoreReset] {
            subs.push(self.inner.bus.subscribe(event_type).map_err(|e| {
                EngineError::Init {
                    subsystem: "score-manager",
                    reason: e.to_string(),
                }
            })?);
        }
        *self.inner.signal.lock().unwrap_or_else(|e| e.into_inner()) = Some(signal);
        Ok(())
    }

    fn update(&mut self, _dt: f64) -> Result<(), EngineError> {
        check_cancelled(&self.inner.signal.lock().unwrap_or_else(|e| e.into_inner()))?;
        let subs = self
            .inner
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for sub in subs.iter() {
            for event in drain(sub) {
                match (event.event_type, event.payload) {
                    (EventType::ScoreEvent, EventPayload::ScoreDelta(delta)) => {
                        self.add_score(delta);
                    }
                    (EventType::ScoreReset, _) => self.reset_score(),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        let mut subs = self
            .inner
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for sub in subs.drain(..) {
            self.inner.bus.unsubscribe(&sub);
        }
        let mut scores = self.inner.scores.lock().unwrap_or_else(|e| e.into_inner());
        scores.score = 0;
        scores.high_score = 0;
    }
}
