//! Basic enemy with the shared auto-fire cooldown state machine.

use strafe_core::constants::{
    ENEMY_COLLISION_DAMAGE, ENEMY_HEALTH, ENEMY_HEIGHT, ENEMY_MAX_COOLDOWN, ENEMY_WIDTH, EPSILON,
};
use strafe_core::entity::{EntityId, GameEntity};
use strafe_core::enums::EntityKind;
use strafe_core::error::EngineError;
use strafe_core::events::{EventPayload, EventType};
use strafe_core::types::{Color, Vec2};

use crate::bus::EventBus;

use super::EntityCore;

pub struct Enemy {
    core: EntityCore,
    shoot_cooldown: f64,
    max_cooldown: f64,
    bus: EventBus,
}

impl Enemy {
    pub fn new(position: Vec2, speed: f64, bus: EventBus) -> Self {
        Self {
            core: EntityCore::new(
                position,
                ENEMY_WIDTH,
                ENEMY_HEIGHT,
                speed,
                ENEMY_HEALTH,
                Color::RED,
            ),
            // Starts at rest: the very first tick of any length fires.
            shoot_cooldown: 0.0,
            max_cooldown: ENEMY_MAX_COOLDOWN,
            bus,
        }
    }

    pub fn can_shoot(&self) -> bool {
        self.shoot_cooldown <= EPSILON
    }

    fn shoot(&mut self) {
        let _ = self
            .bus
            .publish(EventType::EnemyShot, EventPayload::Info(self.info()));
        self.shoot_cooldown = self.max_cooldown;
    }
}

impl GameEntity for Enemy {
    fn id(&self) -> EntityId {
        self.core.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Enemy
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
        self.core.position.y += self.core.speed * dt;
        self.shoot_cooldown = (self.shoot_cooldown - dt).max(0.0);
        if self.can_shoot() {
            self.shoot();
        }
        Ok(())
    }

    fn on_collision(&mut self) {
        self.take_damage(ENEMY_COLLISION_DAMAGE);
        let _ = self
            .bus
            .publish(EventType::EnemyDamaged, EventPayload::Info(self.info()));
        if self.core.health == 0 {
            let _ = self
                .bus
                .publish(EventType::EnemyDestroyed, EventPayload::Info(self.info()));
        }
    }
}
