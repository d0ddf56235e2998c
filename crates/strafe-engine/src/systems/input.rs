//! Input subsystem.
//!
//! Polls a [`KeySource`] on the fixed-step cadence and publishes one
//! `InputEvent` per just-pressed key transition. Held keys publish nothing
//! until released and pressed again.

use std::sync::{Arc, Mutex};

use strafe_core::constants::{FIXED_DT, TICK_TOLERANCE};
use strafe_core::enums::Key;
use strafe_core::error::EngineError;
use strafe_core::events::{EventPayload, EventType};

use crate::bus::EventBus;
use crate::shutdown::ShutdownSignal;
use crate::subsystem::{check_cancelled, Subsystem};

/// Where key state comes from. The engine never talks to real hardware;
/// the binary (or a test) supplies the source.
pub trait KeySource: Send {
    fn is_pressed(&mut self, key: Key) -> bool;
}

/// Key source that never reports a press. Used headless.
#[derive(Default)]
pub struct NullKeySource;

impl KeySource for NullKeySource {
    fn is_pressed(&mut self, _key: Key) -> bool {
        false
    }
}

struct InputInner {
    bus: EventBus,
    source: Mutex<Box<dyn KeySource>>,
    previous: Mutex<[bool; Key::ALL.len()]>,
    accumulator: Mutex<f64>,
    signal: Mutex<Option<ShutdownSignal>>,
}

#[derive(Clone)]
pub struct InputSystem {
    inner: Arc<InputInner>,
}

impl InputSystem {
    pub fn new(bus: EventBus, source: Box<dyn KeySource>) -> Self {
        Self {
            inner: Arc::new(InputInner {
                bus,
                source: Mutex::new(source),
                previous: Mutex::new([false; Key::ALL.len()]),
                accumulator: Mutex::new(0.0),
                signal: Mutex::new(None),
            }),
        }
    }

    fn scan(&self) {
        let mut source = self.inner.source.lock().unwrap_or_else(|e| e.into_inner());
        let mut previous = self
            .inner
            .previous
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for (slot, key) in Key::ALL.iter().enumerate() {
            let pressed = source.is_pressed(*key);
            if pressed && !previous[slot] {
                let _ = self
                    .inner
                    .bus
                    .publish(EventType::InputEvent, EventPayload::Input(key.action()));
            }
            previous[slot] = pressed;
        }
    }
}

impl Subsystem for InputSystem {
    fn name(&self) -> &'static str {
        "input"
    }

    fn initialize(&mut self, signal: ShutdownSignal) -> Result<(), EngineError> {
        *self.inner.signal.lock().unwrap_or_else(|e| e.into_inner()) = Some(signal);
        Ok(())
    }

    fn update(&mut self, dt: f64) -> Result<(), EngineError> {
        check_cancelled(&self.inner.signal.lock().unwrap_or_else(|e| e.into_inner()))?;
        let mut accumulator = self
            .inner
            .accumulator
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *accumulator += dt.max(0.0);
        while *accumulator >= FIXED_DT - TICK_TOLERANCE {
            *accumulator -= FIXED_DT;
            self.scan();
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        *self
            .inner
            .previous
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = [false; Key::ALL.len()];
    }
}
