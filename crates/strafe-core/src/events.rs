//! Event vocabulary for the pub/sub bus.
//!
//! `EventType` is a closed enumeration with a stable declaration order.
//! Payloads are typed per event family; lifecycle `*Created` events carry the
//! live entity handle so owners can index it, while events an entity publishes
//! about itself carry a plain [`EntityInfo`] value — never a reference that
//! would outlive the dispatch.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityHandle, EntityId};
use crate::enums::{EntityKind, GameState, InputAction};
use crate::types::Vec2;

/// The closed set of event types. Declaration order is stable and part of the
/// wire/test contract; new types append at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    CollisionEvent,
    InputEvent,
    GameStateChangeEvent,
    LevelEvent,
    ScoreEvent,
    ScoreReset,
    PlayerShot,
    PlayerDamaged,
    PlayerDestroyed,
    BulletCreated,
    BulletDestroyed,
    EnemyCreated,
    EnemyShot,
    EnemyDamaged,
    EnemyDestroyed,
    BossShot,
    BossPhaseChanged,
    BossDamaged,
    BossDefeated,
    EnemyAddedToFormation,
    EnemyRemovedFromFormation,
    FormationCreated,
    FormationDestroyed,
}

/// Identity-plus-state snapshot of an entity at publication time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityInfo {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec2,
    pub health: i32,
}

/// Typed event payload.
#[derive(Clone)]
pub enum EventPayload {
    None,
    /// A live handle, published with `*Created` events only.
    Entity(EntityHandle),
    /// Snapshot of the publishing entity (shot/damaged/destroyed/...).
    Info(EntityInfo),
    Input(InputAction),
    State(GameState),
    /// Score delta (input form of `ScoreEvent`).
    ScoreDelta(i64),
    /// Levels to advance (input form of `LevelEvent`).
    LevelDelta(i32),
    /// New absolute level (output form of `LevelEvent`).
    LevelReached(i32),
    /// Boss phase number.
    Phase(u8),
}

impl std::fmt::Debug for EventPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventPayload::None => write!(f, "None"),
            EventPayload::Entity(_) => write!(f, "Entity(..)"),
            EventPayload::Info(info) => write!(f, "Info({:?})", info),
            EventPayload::Input(a) => write!(f, "Input({:?})", a),
            EventPayload::State(s) => write!(f, "State({:?})", s),
            EventPayload::ScoreDelta(n) => write!(f, "ScoreDelta({})", n),
            EventPayload::LevelDelta(n) => write!(f, "LevelDelta({})", n),
            EventPayload::LevelReached(n) => write!(f, "LevelReached({})", n),
            EventPayload::Phase(p) => write!(f, "Phase({})", p),
        }
    }
}

/// One published event.
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: EventType,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(event_type: EventType, payload: EventPayload) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}
