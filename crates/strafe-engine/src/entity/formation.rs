//! A formation: an entity aggregating enemy members plus a movement pattern.

use strafe_core::constants::FORMATION_DRIFT_SPEED;
use strafe_core::entity::{handle_id, handle_info, EntityHandle, EntityId, GameEntity};
use strafe_core::enums::{EntityKind, FormationKind};
use strafe_core::error::EngineError;
use strafe_core::events::{EventPayload, EventType};
use strafe_core::types::{Color, Vec2};

use crate::bus::EventBus;

use super::pattern::MovementPattern;
use super::EntityCore;

pub struct Formation {
    core: EntityCore,
    kind: FormationKind,
    members: Vec<EntityHandle>,
    pattern: Box<dyn MovementPattern>,
    complete: bool,
    elapsed: f64,
    bus: EventBus,
}

impl Formation {
    pub fn new(
        kind: FormationKind,
        pattern: Box<dyn MovementPattern>,
        position: Vec2,
        bus: EventBus,
    ) -> Self {
        Self {
            core: EntityCore::new(position, 0.0, 0.0, FORMATION_DRIFT_SPEED, 1, Color::WHITE),
            kind,
            members: Vec::new(),
            pattern,
            complete: false,
            elapsed: 0.0,
            bus,
        }
    }

    pub fn formation_kind(&self) -> FormationKind {
        self.kind
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// `IsComplete`: latched true the first time the member set empties.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn set_pattern(&mut self, pattern: Box<dyn MovementPattern>) {
        self.pattern = pattern;
    }

    pub fn add_member(&mut self, member: EntityHandle) {
        let info = handle_info(&member);
        self.members.push(member);
        let _ = self
            .bus
            .publish(EventType::EnemyAddedToFormation, EventPayload::Info(info));
    }

    /// Remove the first member with this id, if present.
    pub fn remove_member(&mut self, id: EntityId) {
        if let Some(idx) = self.members.iter().position(|m| handle_id(m) == id) {
            let member = self.members.remove(idx);
            let _ = self.bus.publish(
                EventType::EnemyRemovedFromFormation,
                EventPayload::Info(handle_info(&member)),
            );
        }
    }

    fn check_completion(&mut self) {
        if !self.complete && self.members.is_empty() {
            self.complete = true;
            let _ = self
                .bus
                .publish(EventType::FormationDestroyed, EventPayload::Info(self.info()));
        }
    }
}

impl GameEntity for Formation {
    fn id(&self) -> EntityId {
        self.core.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Formation
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
        self.elapsed += dt;
        self.core.position.y += self.core.speed * dt;

        // Drop members destroyed since the last tick so completion fires.
        let dead: Vec<EntityId> = self
            .members
            .iter()
            .filter(|m| !m.lock().unwrap_or_else(|e| e.into_inner()).is_alive())
            .map(|m| handle_id(m))
            .collect();
        for id in dead {
            self.remove_member(id);
        }

        if !self.members.is_empty() {
            // Members only expose a position view to the pattern.
            let mut slots: Vec<Vec2> = self.members.iter().map(|m| handle_info(m).position).collect();
            self.pattern.apply(self.core.position, &mut slots, self.elapsed);
            for (member, slot) in self.members.iter().zip(slots) {
                member
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .set_position(slot);
            }
        }

        self.check_completion();
        Ok(())
    }

    fn on_collision(&mut self) {
        // Formations are never collision-eligible.
    }
}
