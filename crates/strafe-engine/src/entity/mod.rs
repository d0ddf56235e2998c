//! Concrete entities: player, enemy, boss, bullet, formation.
//!
//! Each entity composes the plain [`EntityCore`] data struct and holds a
//! cloned bus handle so it can publish its own lifecycle events. Publish
//! results are deliberately ignored at entity sites: the default policy for
//! a full queue is drop, and the bus logs the drop.

mod boss;
mod bullet;
mod enemy;
mod formation;
mod pattern;
mod player;

pub use boss::Boss;
pub use bullet::Bullet;
pub use enemy::Enemy;
pub use formation::Formation;
pub use pattern::{pattern_for, CirclePattern, ColumnPattern, LinePattern, MovementPattern, VPattern};
pub use player::Player;

use strafe_core::entity::{next_entity_id, EntityId};
use strafe_core::types::{Color, Vec2};

/// Shared plain-data base every entity composes.
#[derive(Debug, Clone)]
pub struct EntityCore {
    pub id: EntityId,
    pub position: Vec2,
    pub width: f64,
    pub height: f64,
    pub speed: f64,
    pub health: i32,
    pub color: Color,
}

impl EntityCore {
    pub fn new(position: Vec2, width: f64, height: f64, speed: f64, health: i32, color: Color) -> Self {
        Self {
            id: next_entity_id(),
            position,
            width,
            height,
            speed,
            health,
            color,
        }
    }

    /// Apply damage, clamping health at 0.
    pub fn take_damage(&mut self, amount: i32) {
        self.health = (self.health - amount).max(0);
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}
