//! Player controller.
//!
//! Bridges input actions to the player entity: movement clamped to the
//! screen, shooting under the cooldown rules, and the minimal start/end
//! flow (shoot in the main menu starts a run, player death ends it).

use std::sync::{Arc, Mutex};

use strafe_core::config::GameConfig;
use strafe_core::constants::{PLAYER_HEIGHT, PLAYER_WIDTH};
use strafe_core::entity::GameEntity;
use strafe_core::enums::{GameState, InputAction};
use strafe_core::error::EngineError;
use strafe_core::events::{EventPayload, EventType};
use strafe_core::types::Vec2;

use crate::bus::{EventBus, Subscription};
use crate::entity::Player;
use crate::shutdown::ShutdownSignal;
use crate::state::StateManager;
use crate::subsystem::{check_cancelled, drain, Subsystem};

struct ControllerInner {
    bus: EventBus,
    config: GameConfig,
    states: StateManager,
    player: Arc<Mutex<Player>>,
    subscription: Mutex<Option<Subscription>>,
    signal: Mutex<Option<ShutdownSignal>>,
}

#[derive(Clone)]
pub struct PlayerController {
    inner: Arc<ControllerInner>,
}

impl PlayerController {
    pub fn new(
        bus: EventBus,
        config: GameConfig,
        states: StateManager,
        player: Arc<Mutex<Player>>,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                bus,
                config,
                states,
                player,
                subscription: Mutex::new(None),
                signal: Mutex::new(None),
            }),
        }
    }

    fn apply_action(&self, action: InputAction) {
        let mut player = self.inner.player.lock().unwrap_or_else(|e| e.into_inner());
        let step = player.speed();
        let delta = match action {
            InputAction::Shoot => {
                if player.can_shoot() {
                    player.shoot();
                }
                return;
            }
            InputAction::Up => Vec2::new(0.0, -step),
            InputAction::Down => Vec2::new(0.0, step),
            InputAction::Left => Vec2::new(-step, 0.0),
            InputAction::Right => Vec2::new(step, 0.0),
        };
        let moved = player.position() + delta;
        let max_x = f64::from(self.inner.config.screen_width) - PLAYER_WIDTH;
        let max_y = f64::from(self.inner.config.screen_height) - PLAYER_HEIGHT;
        player.set_position(Vec2::new(
            moved.x.clamp(0.0, max_x),
            moved.y.clamp(0.0, max_y),
        ));
    }

    fn handle_events(&self, state: GameState) {
        let sub = self
            .inner
            .subscription
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(sub) = sub.as_ref() {
            for event in drain(sub) {
                if let EventPayload::Input(action) = event.payload {
                    match state {
                        GameState::Playing => self.apply_action(action),
                        GameState::MainMenu if action == InputAction::Shoot => {
                            self.inner.states.request_state_change(GameState::Playing);
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

impl Subsystem for PlayerController {
    fn name(&self) -> &'static str {
        "controller"
    }

    fn initialize(&mut self, signal: ShutdownSignal) -> Result<(), EngineError> {
        let sub = self
            .inner
            .bus
            .subscribe(EventType::InputEvent)
            .map_err(|e| EngineError::Init {
                subsystem: "controller",
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

    fn update(&mut self, dt: f64) -> Result<(), EngineError> {
        check_cancelled(&self.inner.signal.lock().unwrap_or_else(|e| e.into_inner()))?;
        let state = self.inner.states.state();
        self.handle_events(state);

        if state == GameState::Playing {
            let mut player = self.inner.player.lock().unwrap_or_else(|e| e.into_inner());
            player.update(dt)?;
            if !player.is_alive() {
                drop(player);
                self.inner.states.request_state_change(GameState::GameOver);
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
    }
}
