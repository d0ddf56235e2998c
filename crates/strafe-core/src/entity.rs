//! The entity capability seam.
//!
//! Managers own entities as shared handles; the collision system and event
//! payloads hold clones of the same handle. Persistent identity is the
//! monotonically assigned [`EntityId`] — handles are compared by id, never by
//! address.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::enums::EntityKind;
use crate::error::EngineError;
use crate::events::EntityInfo;
use crate::types::{Aabb, Color, Vec2};

/// Stable entity identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate the next entity id. Never reused within a process.
pub fn next_entity_id() -> EntityId {
    EntityId(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
}

/// Shared, lockable handle to a live entity.
pub type EntityHandle = Arc<Mutex<dyn GameEntity>>;

/// Capabilities every simulated entity exposes.
///
/// Collision eligibility is *not* part of this trait: it is a pure function
/// of [`EntityKind`] pairs, so the collision pass never needs to downcast.
pub trait GameEntity: Send {
    fn id(&self) -> EntityId;
    fn kind(&self) -> EntityKind;

    fn position(&self) -> Vec2;
    fn set_position(&mut self, pos: Vec2);

    /// (width, height).
    fn size(&self) -> (f64, f64);

    fn health(&self) -> i32;

    /// Apply damage, clamping health at 0.
    fn take_damage(&mut self, amount: i32);

    fn is_alive(&self) -> bool {
        self.health() > 0
    }

    fn collision_box(&self) -> Aabb {
        let (w, h) = self.size();
        Aabb::at(self.position(), w, h)
    }

    fn color(&self) -> Color;

    /// Advance the entity by one fixed timestep.
    fn update(&mut self, dt: f64) -> Result<(), EngineError>;

    /// Collision callback. Eligibility was already established from the kind
    /// table, so the victim only needs to react (damage + events).
    fn on_collision(&mut self);

    /// Identity-plus-state snapshot for event payloads.
    fn info(&self) -> EntityInfo {
        EntityInfo {
            id: self.id(),
            kind: self.kind(),
            position: self.position(),
            health: self.health(),
        }
    }
}

/// Lock a handle and take its info snapshot.
pub fn handle_info(handle: &EntityHandle) -> EntityInfo {
    let guard = handle.lock().unwrap_or_else(|e| e.into_inner());
    guard.info()
}

/// Lock a handle and read its id.
pub fn handle_id(handle: &EntityHandle) -> EntityId {
    let guard = handle.lock().unwrap_or_else(|e| e.into_inner());
    guard.id()
}
