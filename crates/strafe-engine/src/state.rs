//! Game state machine.
//!
//! Transitions come in two ways: a bounded internal request queue
//! ([`StateManager::request_state_change`]) and externally published
//! `GameStateChangeEvent`s. A dedicated worker serializes both sources, so
//! hooks never run concurrently. Every applied transition is announced back
//! on the bus; a request for the current state is a no-op and announces
//! nothing.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, select, Receiver, Sender};
use log::{info, warn};

use strafe_core::enums::GameState;
use strafe_core::error::EngineError;
use strafe_core::events::{EventPayload, EventType};

use crate::bus::{EventBus, Subscription};
use crate::shutdown::ShutdownSignal;
use crate::subsystem::{check_cancelled, Subsystem};

struct StateInner {
    bus: EventBus,
    current: Mutex<GameState>,
    request_tx: Sender<GameState>,
    request_rx: Receiver<GameState>,
    worker: Mutex<Option<JoinHandle<()>>>,
    subscription: Mutex<Option<Subscription>>,
    signal: Mutex<Option<ShutdownSignal>>,
}

#[derive(Clone)]
pub struct StateManager {
    inner: Arc<StateInner>,
}

impl StateManager {
    pub fn new(bus: EventBus, queue_capacity: usize) -> Self {
        let (request_tx, request_rx) = bounded(queue_capacity);
        Self {
            inner: Arc::new(StateInner {
                bus,
                current: Mutex::new(GameState::default()),
                request_tx,
                request_rx,
                worker: Mutex::new(None),
                subscription: Mutex::new(None),
                signal: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> GameState {
        *self
            .inner
            .current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Enqueue a transition request. Never blocks; a full queue drops the
    /// request with a warning.
    pub fn request_state_change(&self, new_state: GameState) {
        if self.inner.request_tx.try_send(new_state).is_err() {
            warn!("state: request queue full, dropping {:?}", new_state);
        }
    }

    fn apply(&self, new_state: GameState) {
        let old_state = {
            let mut current = self
                .inner
                .current
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            let old_state = *current;
            if old_state == new_state {
                return;
            }
            self.on_exit(old_state);
            *current = new_state;
            old_state
        };
        self.on_enter(old_state, new_state);
        let _ = self
            .inner
            .bus
            .publish(EventType::GameStateChangeEvent, EventPayload::State(new_state));
    }

    fn on_exit(&self, state: GameState) {
        info!("state: leaving {:?}", state);
    }

    fn on_enter(&self, from: GameState, state: GameState) {
        info!("state: entering {:?}", state);
        // A restart out of game-over clears the last run's score.
        if state == GameState::Playing && from == GameState::GameOver {
            let _ = self
                .inner
                .bus
                .publish(EventType::ScoreReset, EventPayload::None);
        }
    }

    fn spawn_worker(&self, signal: ShutdownSignal) -> Result<(), EngineError> {
        let manager = self.clone();
        let subscription = self
            .inner
            .bus
            .subscribe(EventType::GameStateChangeEvent)
            .map_err(|e| EngineError::Init {
                subsystem: "state",
                reason: e.to_string(),
            })?;
        let events = subscription.receiver();
        *self
            .inner
            .subscription
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(subscription);
        let requests = self.inner.request_rx.clone();

        let handle = thread::Builder::new()
            .name("state-worker".into())
            .spawn(move || loop {
                select! {
                    recv(signal.done()) -> _ => return,
                    recv(requests) -> request => match request {
                        Ok(new_state) => manager.apply(new_state),
                        Err(_) => return,
                    },
                    recv(events) -> event => match event {
                        Ok(event) => {
                            if let EventPayload::State(new_state) = event.payload {
                                manager.apply(new_state);
                            }
                        }
                        Err(_) => return,
                    },
                }
            })
            .map_err(|e| EngineError::Init {
                subsystem: "state",
                reason: e.to_string(),
            })?;
        *self.inner.worker.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        Ok(())
    }
}

impl Subsystem for StateManager {
    fn name(&self) -> &'static str {
        "state"
    }

    fn initialize(&mut self, signal: ShutdownSignal) -> Result<(), EngineError> {
        self.spawn_worker(signal.clone())?;
        *self.inner.signal.lock().unwrap_or_else(|e| e.into_inner()) = Some(signal);
        Ok(())
    }

    // Transitions are applied by the dedicated worker; the tick only keeps
    // the cancellation contract.
    fn update(&mut self, _dt: f64) -> Result<(), EngineError> {
        check_cancelled(&self.inner.signal.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self
            .inner
            .worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            let _ = handle.join();
        }
        if let Some(sub) = self
            .inner
            .subscription
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            self.inner.bus.unsubscribe(&sub);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::shutdown_channel;

    /// The transition worker runs asynchronously; give it a moment.
    fn settle() {
        std::thread::sleep(std::time::Duration::from_millis(50));
    }

    #[test]
    fn test_starts_in_main_menu() {
        let bus = EventBus::new();
        let manager = StateManager::new(bus, 10);
        assert_eq!(manager.state(), GameState::MainMenu);
    }

    #[test]
    fn test_request_applies_and_announces() {
        let bus = EventBus::new();
        let sub = bus.subscribe(EventType::GameStateChangeEvent).unwrap();
        let mut manager = StateManager::new(bus.clone(), 10);
        let (controller, signal) = shutdown_channel();
        manager.initialize(signal).unwrap();

        manager.request_state_change(GameState::Playing);
        settle();
        assert_eq!(manager.state(), GameState::Playing);

        bus.dispatch_pending();
        let event = sub.try_recv().expect("announcement");
        assert!(matches!(event.payload, EventPayload::State(GameState::Playing)));

        controller.cancel();
        manager.shutdown();
    }

    #[test]
    fn test_shutdown_unsubscribes_from_the_bus() {
        let bus = EventBus::new();
        let mut manager = StateManager::new(bus.clone(), 10);
        let (controller, signal) = shutdown_channel();
        manager.initialize(signal).unwrap();
        assert_eq!(bus.subscriber_count(EventType::GameStateChangeEvent), 1);

        controller.cancel();
        manager.shutdown();
        assert_eq!(bus.subscriber_count(EventType::GameStateChangeEvent), 0);
    }

    #[test]
    fn test_same_state_request_is_silent() {
        let bus = EventBus::new();
        let sub = bus.subscribe(EventType::GameStateChangeEvent).unwrap();
        let mut manager = StateManager::new(bus.clone(), 10);
        let (controller, signal) = shutdown_channel();
        manager.initialize(signal).unwrap();

        manager.request_state_change(GameState::MainMenu);
        settle();
        assert_eq!(manager.state(), GameState::MainMenu);
        bus.dispatch_pending();
        assert!(sub.try_recv().is_none());

        controller.cancel();
        manager.shutdown();
    }
}
