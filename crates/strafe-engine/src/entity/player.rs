//! The player ship.

use strafe_core::constants::{
    PLAYER_COLLISION_DAMAGE, PLAYER_HEALTH, PLAYER_HEIGHT, PLAYER_SHOOT_COOLDOWN, PLAYER_WIDTH,
};
use strafe_core::entity::{EntityId, GameEntity};
use strafe_core::enums::EntityKind;
use strafe_core::error::EngineError;
use strafe_core::events::{EventPayload, EventType};
use strafe_core::types::{Color, Vec2};

use crate::bus::EventBus;

use super::EntityCore;

pub struct Player {
    core: EntityCore,
    shoot_cooldown: f64,
    bus: EventBus,
}

impl Player {
    pub fn new(position: Vec2, speed: f64, bus: EventBus) -> Self {
        Self {
            core: EntityCore::new(
                position,
                PLAYER_WIDTH,
                PLAYER_HEIGHT,
                speed,
                PLAYER_HEALTH,
                Color::GREEN,
            ),
            shoot_cooldown: 0.0,
            bus,
        }
    }

    /// Ready to fire: the cooldown has run out (it may be negative).
    pub fn can_shoot(&self) -> bool {
        self.shoot_cooldown <= 0.0
    }

    /// Publish `PlayerShot` and rearm the cooldown, if ready.
    pub fn shoot(&mut self) {
        if self.can_shoot() {
            let _ = self
                .bus
                .publish(EventType::PlayerShot, EventPayload::Info(self.info()));
            self.shoot_cooldown = PLAYER_SHOOT_COOLDOWN;
        }
    }

    pub fn speed(&self) -> f64 {
        self.core.speed
    }
}

impl GameEntity for Player {
    fn id(&self) -> EntityId {
        self.core.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Player
    }

    fn position(&self) -> Vec2 {
        self.core.position
    }

    fn set_position(&mut self, pos: Vec2) {
        self.core.position = pos;
    }

    fn size(&self) -> (f64, f64) {
        (self.core.width, self.core.height)
    }

    fn health(&self) -> i32 {
        self.core.health
    }

    fn take_damage(&mut self, amount: i32) {
        self.core.take_damage(amount);
    }

    fn color(&self) -> Color {
        self.core.color
    }

    fn update(&mut self, dt: f64) -> Result<(), EngineError> {
        // Monotone decreasing; allowed to go negative so a long stall
        // never delays the next shot.
        self.shoot_cooldown -= dt;
        Ok(())
    }

    fn on_collision(&mut self) {
        self.take_damage(PLAYER_COLLISION_DAMAGE);
        let _ = self
            .bus
            .publish(EventType::PlayerDamaged, EventPayload::Info(self.info()));
        if self.core.health == 0 {
            let _ = self
                .bus
                .publish(EventType::PlayerDestroyed, EventPayload::Info(self.info()));
        }
    }
}
