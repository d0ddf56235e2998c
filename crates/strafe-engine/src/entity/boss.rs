//! Boss entity: fast auto-fire plus a one-way two-phase state machine.

use strafe_core::constants::{
    BOSS_COLLISION_DAMAGE, BOSS_HEALTH, BOSS_HEIGHT, BOSS_HOLD_Y, BOSS_MAX_COOLDOWN,
    BOSS_PHASE2_HEALTH, BOSS_WIDTH, EPSILON,
};
use strafe_core::entity::{EntityId, GameEntity};
use strafe_core::enums::EntityKind;
use strafe_core::error::EngineError;
use strafe_core::events::{EventPayload, EventType};
use strafe_core::types::{Color, Vec2};

use crate::bus::EventBus;

use super::EntityCore;

pub struct Boss {
    core: EntityCore,
    phase: u8,
    shoot_cooldown: f64,
    max_cooldown: f64,
    bus: EventBus,
}

impl Boss {
    pub fn new(position: Vec2, speed: f64, bus: EventBus) -> Self {
        Self {
            core: EntityCore::new(
                position,
                BOSS_WIDTH,
                BOSS_HEIGHT,
                speed,
                BOSS_HEALTH,
                Color::PURPLE,
            ),
            phase: 1,
            shoot_cooldown: 0.0,
            max_cooldown: BOSS_MAX_COOLDOWN,
            bus,
        }
    }

    pub fn phase(&self) -> u8 {
        self.phase
    }

    pub fn can_shoot(&self) -> bool {
        self.shoot_cooldown <= EPSILON
    }

    fn shoot(&mut self) {
        let _ = self
            .bus
            .publish(EventType::BossShot, EventPayload::Info(self.info()));
        self.shoot_cooldown = self.max_cooldown;
    }

    fn change_phase(&mut self, new_phase: u8) {
        self.phase = new_phase;
        let _ = self
            .bus
            .publish(EventType::BossPhaseChanged, EventPayload::Phase(new_phase));
    }
}

impl GameEntity for Boss {
    fn id(&self) -> EntityId {
        self.core.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Boss
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
        if self.core.position.y < BOSS_HOLD_Y {
            self.core.position.y = (self.core.position.y + self.core.speed * dt).min(BOSS_HOLD_Y);
        }
        self.shoot_cooldown = (self.shoot_cooldown - dt).max(0.0);
        if self.can_shoot() {
            self.shoot();
        }
        // One-way transition on the first tick after crossing the threshold.
        if self.core.health <= BOSS_PHASE2_HEALTH && self.phase == 1 {
            self.change_phase(2);
        }
        Ok(())
    }

    fn on_collision(&mut self) {
        self.take_damage(BOSS_COLLISION_DAMAGE);
        let _ = self
            .bus
            .publish(EventType::BossDamaged, EventPayload::Info(self.info()));
        if self.core.health == 0 {
            let _ = self
                .bus
                .publish(EventType::BossDefeated, EventPayload::Info(self.info()));
        }
    }
}
