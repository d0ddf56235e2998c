//! Bullets, both factions. Friendly bullets travel up, enemy bullets down.

use strafe_core::constants::{BULLET_HEALTH, BULLET_HEIGHT, BULLET_WIDTH};
use strafe_core::entity::{EntityId, GameEntity};
use strafe_core::enums::EntityKind;
use strafe_core::error::EngineError;
use strafe_core::events::{EventPayload, EventType};
use strafe_core::types::{Color, Vec2};

use crate::bus::EventBus;

use super::EntityCore;

pub struct Bullet {
    core: EntityCore,
    is_enemy: bool,
    direction: Vec2,
    /// Screen bounds (width, height) for the out-of-bounds check.
    bounds: (f64, f64),
    bus: EventBus,
}

impl Bullet {
    pub fn new(position: Vec2, is_enemy: bool, speed: f64, bounds: (f64, f64), bus: EventBus) -> Self {
        let direction = if is_enemy {
            Vec2::new(0.0, 1.0)
        } else {
            Vec2::new(0.0, -1.0)
        };
        let color = if is_enemy { Color::YELLOW } else { Color::WHITE };
        Self {
            core: EntityCore::new(position, BULLET_WIDTH, BULLET_HEIGHT, speed, BULLET_HEALTH, color),
            is_enemy,
            direction,
            bounds,
            bus,
        }
    }

    pub fn is_enemy_bullet(&self) -> bool {
        self.is_enemy
    }

    pub fn is_out_of_bounds(&self) -> bool {
        let pos = self.core.position;
        pos.x < 0.0 || pos.x > self.bounds.0 || pos.y < 0.0 || pos.y > self.bounds.1
    }

    /// Zero health and publish `BulletDestroyed`, once.
    pub fn destroy(&mut self) {
        if self.core.is_alive() {
            self.core.health = 0;
            let _ = self
                .bus
                .publish(EventType::BulletDestroyed, EventPayload::Info(self.info()));
        }
    }
}

impl GameEntity for Bullet {
    fn id(&self) -> EntityId {
        self.core.id
    }

    fn kind(&self) -> EntityKind {
        if self.is_enemy {
            EntityKind::EnemyBullet
        } else {
            EntityKind::FriendlyBullet
        }
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
        let new_pos = self.core.position + self.direction * (self.core.speed * dt);
        self.core.position = new_pos;
        if self.is_out_of_bounds() {
            self.destroy();
        }
        Ok(())
    }

    fn on_collision(&mut self) {
        self.destroy();
    }
}
